//! Core type definitions shared by both models
//!
//! This module contains the column model used by Data Vault and Anchor
//! entities alike, plus the rectangle type the layout engine hands to the
//! emitter.

use std::fmt;

/// Key marker drawn next to a column (the flag cell of a table row)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum KeyFlag {
    /// No marker
    #[default]
    None,
    /// `PK`
    Primary,
    /// `FK`
    Foreign,
    /// `PK,FK` (or `PK FK`, `PK/FK`)
    PrimaryForeign,
}

impl KeyFlag {
    /// Parse a flag cell's text. Returns `None` when the text is not a flag.
    pub fn parse(text: &str) -> Option<Self> {
        let normalized: String = text
            .trim()
            .to_ascii_uppercase()
            .chars()
            .map(|c| if c == ',' || c == '/' { ' ' } else { c })
            .collect();
        let parts: Vec<&str> = normalized.split_whitespace().collect();
        match parts.as_slice() {
            [] => Some(KeyFlag::None),
            ["SYS"] => Some(KeyFlag::None),
            ["PK"] => Some(KeyFlag::Primary),
            ["FK"] => Some(KeyFlag::Foreign),
            ["PK", "FK"] | ["FK", "PK"] => Some(KeyFlag::PrimaryForeign),
            _ => None,
        }
    }

    pub fn is_primary(&self) -> bool {
        matches!(self, KeyFlag::Primary | KeyFlag::PrimaryForeign)
    }

    pub fn is_foreign(&self) -> bool {
        matches!(self, KeyFlag::Foreign | KeyFlag::PrimaryForeign)
    }
}

impl fmt::Display for KeyFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyFlag::None => write!(f, ""),
            KeyFlag::Primary => write!(f, "PK"),
            KeyFlag::Foreign => write!(f, "FK"),
            KeyFlag::PrimaryForeign => write!(f, "PK,FK"),
        }
    }
}

/// Kind of reserved system column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemKind {
    /// When the row was loaded (drives historization)
    LoadTimestamp,
    /// Where the row came from
    RecordSource,
    /// Change-detection digest of a satellite row
    HashDiff,
}

impl fmt::Display for SystemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SystemKind::LoadTimestamp => write!(f, "load timestamp"),
            SystemKind::RecordSource => write!(f, "record source"),
            SystemKind::HashDiff => write!(f, "hash diff"),
        }
    }
}

/// Semantic role of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnRole {
    /// Identity of a hub (or a parent key repeated on a satellite)
    BusinessKey,
    /// Business data
    Descriptive,
    /// Loading metadata, never business data
    System(SystemKind),
    /// Key inherited from another entity
    ForeignKey,
}

impl ColumnRole {
    pub fn is_system(&self) -> bool {
        matches!(self, ColumnRole::System(_))
    }
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRole::BusinessKey => write!(f, "business key"),
            ColumnRole::Descriptive => write!(f, "descriptive"),
            ColumnRole::System(kind) => write!(f, "system ({})", kind),
            ColumnRole::ForeignKey => write!(f, "foreign key"),
        }
    }
}

/// A column of a Data Vault table, carried over into the Anchor model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Column name as drawn
    pub name: String,
    /// Semantic role
    pub role: ColumnRole,
    /// Key marker as drawn
    pub key: KeyFlag,
    /// Free-form type text following the name, if any
    pub data_type: Option<String>,
    /// Whether the column admits NULL
    pub nullable: bool,
}

impl Column {
    /// Create a nullable column without key marker or type
    pub fn new(name: impl Into<String>, role: ColumnRole) -> Self {
        Self {
            name: name.into(),
            role,
            key: KeyFlag::None,
            data_type: None,
            nullable: !matches!(role, ColumnRole::BusinessKey | ColumnRole::ForeignKey),
        }
    }

    /// Business-key column, marked `PK`
    pub fn business_key(name: impl Into<String>) -> Self {
        Self::new(name, ColumnRole::BusinessKey).with_key(KeyFlag::Primary)
    }

    pub fn descriptive(name: impl Into<String>) -> Self {
        Self::new(name, ColumnRole::Descriptive)
    }

    pub fn system(name: impl Into<String>, kind: SystemKind) -> Self {
        Self::new(name, ColumnRole::System(kind))
    }

    pub fn foreign_key(name: impl Into<String>) -> Self {
        Self::new(name, ColumnRole::ForeignKey)
    }

    pub fn with_key(mut self, key: KeyFlag) -> Self {
        self.key = key;
        if key.is_primary() {
            self.nullable = false;
        }
        self
    }

    pub fn with_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = Some(data_type.into());
        self
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Text shown in the name cell of a table row
    pub fn display_text(&self) -> String {
        let mut text = self.name.clone();
        if let Some(data_type) = &self.data_type {
            text.push(' ');
            text.push_str(data_type);
        }
        if !self.nullable && !self.key.is_primary() {
            text.push_str(" NOT NULL");
        }
        text
    }
}

/// Axis-aligned rectangle in diagram coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center_y(&self) -> f64 {
        self.y + self.height / 2.0
    }

    /// True when the interiors overlap (touching edges do not count)
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}
