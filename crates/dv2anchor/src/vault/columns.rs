//! Column line parser using chumsky
//!
//! A column line is what a table row (or one line of a text row) says about
//! a column:
//!
//! ```text
//! [PK|FK|PK,FK] name [type text] [NOT NULL|NULL]
//! ```

use chumsky::prelude::*;

use super::ShapeKind;
use crate::core::chumsky_utils::{inline_whitespace, inline_whitespace_required};
use crate::core::{Column, ColumnRole, KeyFlag, SystemColumns};

/// A column line as written in the diagram
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedColumn {
    pub key: KeyFlag,
    pub name: String,
    pub data_type: Option<String>,
    /// Explicit `NULL`/`NOT NULL` suffix, if present
    pub nullable: Option<bool>,
}

impl ParsedColumn {
    /// Build the column model with the given role
    pub fn into_column(self, role: ColumnRole) -> Column {
        let mut column = Column::new(self.name, role).with_key(self.key);
        if let Some(data_type) = self.data_type {
            column = column.with_type(data_type);
        }
        if let Some(nullable) = self.nullable {
            if !self.key.is_primary() {
                column = column.with_nullable(nullable);
            }
        }
        column
    }
}

/// Chumsky-based column line parser
#[derive(Debug, Clone, Copy, Default)]
pub struct ColumnLineParser;

impl ColumnLineParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse one column line. The error is a human readable reason.
    pub fn parse_line(&self, line: &str) -> Result<ParsedColumn, String> {
        let (flag, name, rest) = Self::line_parser()
            .parse(line.trim())
            .into_result()
            .map_err(|_| format!("cannot read column line '{}'", line.trim()))?;

        if flag.is_none() && KeyFlag::parse(&name).is_some() {
            return Err(format!("key flag '{}' without a column name", name));
        }

        let (data_type, nullable) = split_nullability(rest);
        Ok(ParsedColumn {
            key: flag.unwrap_or_default(),
            name,
            data_type: data_type.map(str::to_string),
            nullable,
        })
    }

    fn line_parser<'src>() -> impl Parser<'src, &'src str, (Option<KeyFlag>, String, &'src str)> {
        let flag = Self::flag_parser()
            .then_ignore(inline_whitespace_required())
            .or_not();

        // Column name: starts with a letter or underscore, runs to whitespace
        let name = any()
            .filter(|c: &char| c.is_alphabetic() || *c == '_')
            .then(none_of(" \t\r\n").repeated())
            .to_slice()
            .map(|s: &str| s.trim_end_matches(':').to_string());

        let rest = inline_whitespace().ignore_then(any().repeated().to_slice());

        inline_whitespace()
            .ignore_then(flag)
            .then(name)
            .then(rest)
            .then_ignore(end())
            .map(|((flag, name), rest)| (flag, name, rest))
    }

    fn flag_parser<'src>() -> impl Parser<'src, &'src str, KeyFlag> + Clone {
        let pk = just("PK").or(just("pk"));
        let fk = just("FK").or(just("fk"));
        let separator = one_of(",/");

        choice((
            pk.clone()
                .then(separator.clone())
                .then(fk.clone())
                .to(KeyFlag::PrimaryForeign),
            fk.clone()
                .then(separator)
                .then(pk.clone())
                .to(KeyFlag::PrimaryForeign),
            pk.to(KeyFlag::Primary),
            fk.to(KeyFlag::Foreign),
        ))
    }
}

/// Split trailing `NOT NULL`/`NULL` off the type text
fn split_nullability(rest: &str) -> (Option<&str>, Option<bool>) {
    let trimmed = rest.trim();
    let upper = trimmed.to_ascii_uppercase();

    let (head, nullable) = if upper == "NOT NULL" || upper.ends_with(" NOT NULL") {
        (&trimmed[..trimmed.len() - "NOT NULL".len()], Some(false))
    } else if upper == "NULL" || upper.ends_with(" NULL") {
        (&trimmed[..trimmed.len() - "NULL".len()], Some(true))
    } else {
        (trimmed, None)
    };

    let head = head.trim();
    ((!head.is_empty()).then_some(head), nullable)
}

/// Role of a column before connectors are known
///
/// Link columns and satellite parent keys are refined once the extractor
/// has read the connectors.
pub fn infer_role(
    kind: ShapeKind,
    name: &str,
    key: KeyFlag,
    system: &SystemColumns,
) -> ColumnRole {
    if let Some(system_kind) = system.kind_of(name) {
        return ColumnRole::System(system_kind);
    }
    if key.is_foreign() {
        return ColumnRole::ForeignKey;
    }
    match kind {
        ShapeKind::Hub => ColumnRole::BusinessKey,
        ShapeKind::Satellite if key.is_primary() => ColumnRole::BusinessKey,
        ShapeKind::Satellite | ShapeKind::Link | ShapeKind::Unrecognized => {
            ColumnRole::Descriptive
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SystemKind;

    fn parse(line: &str) -> ParsedColumn {
        ColumnLineParser::new().parse_line(line).unwrap()
    }

    #[test]
    fn test_bare_name() {
        let column = parse("customer_id");
        assert_eq!(column.key, KeyFlag::None);
        assert_eq!(column.name, "customer_id");
        assert_eq!(column.data_type, None);
        assert_eq!(column.nullable, None);
    }

    #[test]
    fn test_flags() {
        assert_eq!(parse("PK customer_id").key, KeyFlag::Primary);
        assert_eq!(parse("FK customer_id").key, KeyFlag::Foreign);
        assert_eq!(parse("PK,FK customer_id").key, KeyFlag::PrimaryForeign);
        assert_eq!(parse("fk/pk customer_id").key, KeyFlag::PrimaryForeign);
    }

    #[test]
    fn test_flag_prefix_inside_name_is_not_a_flag() {
        let column = parse("PKG_ID");
        assert_eq!(column.key, KeyFlag::None);
        assert_eq!(column.name, "PKG_ID");
    }

    #[test]
    fn test_type_and_nullability() {
        let column = parse("  email varchar(255) NOT NULL ");
        assert_eq!(column.name, "email");
        assert_eq!(column.data_type.as_deref(), Some("varchar(255)"));
        assert_eq!(column.nullable, Some(false));

        let column = parse("note: text null");
        assert_eq!(column.name, "note");
        assert_eq!(column.data_type.as_deref(), Some("text"));
        assert_eq!(column.nullable, Some(true));

        let column = parse("amount NOT NULL");
        assert_eq!(column.data_type, None);
        assert_eq!(column.nullable, Some(false));
    }

    #[test]
    fn test_unreadable_lines() {
        let parser = ColumnLineParser::new();
        assert!(parser.parse_line("42 things").is_err());
        assert!(parser.parse_line("- name").is_err());
        assert!(parser.parse_line("PK").is_err());
        assert!(parser.parse_line("").is_err());
    }

    #[test]
    fn test_into_column() {
        let column = parse("PK customer_id int NULL").into_column(ColumnRole::BusinessKey);
        assert_eq!(column.key, KeyFlag::Primary);
        assert!(!column.nullable);
        assert_eq!(column.data_type.as_deref(), Some("int"));

        let column = parse("email text NOT NULL").into_column(ColumnRole::Descriptive);
        assert!(!column.nullable);
    }

    #[test]
    fn test_infer_role() {
        let system = SystemColumns::default();
        assert_eq!(
            infer_role(ShapeKind::Hub, "customer_id", KeyFlag::Primary, &system),
            ColumnRole::BusinessKey
        );
        assert_eq!(
            infer_role(ShapeKind::Hub, "load_dttm", KeyFlag::None, &system),
            ColumnRole::System(SystemKind::LoadTimestamp)
        );
        assert_eq!(
            infer_role(ShapeKind::Satellite, "customer_id", KeyFlag::Primary, &system),
            ColumnRole::BusinessKey
        );
        assert_eq!(
            infer_role(ShapeKind::Satellite, "name", KeyFlag::None, &system),
            ColumnRole::Descriptive
        );
        assert_eq!(
            infer_role(ShapeKind::Link, "order_date", KeyFlag::None, &system),
            ColumnRole::Descriptive
        );
        assert_eq!(
            infer_role(ShapeKind::Hub, "region_id", KeyFlag::Foreign, &system),
            ColumnRole::ForeignKey
        );
    }
}
