//! Anchor model graph
//!
//! Arena storage for anchors, attributes and ties, plus the table view each
//! element is drawn as.

use crate::core::Column;

/// Index of an anchor in its [`AnchorGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnchorId(pub usize);

/// Index of an attribute in its [`AnchorGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttributeId(pub usize);

/// Index of a tie in its [`AnchorGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TieId(pub usize);

/// Element an attribute belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Owner {
    Anchor(AnchorId),
    Tie(TieId),
}

/// Whether an attribute keeps the history of its values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Historization {
    Historized,
    Static,
}

/// A core business concept
#[derive(Debug, Clone, PartialEq)]
pub struct Anchor {
    /// Mnemonic-free name (`customer`)
    pub name: String,
    /// Identity absorbed from the hub's business key
    pub key_columns: Vec<Column>,
    pub system_columns: Vec<Column>,
    /// Name of the hub this anchor was built from
    pub source: String,
}

/// A single descriptive property
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    /// `<satellite>_<column>` (`customer_details_name`)
    pub name: String,
    pub owner: Owner,
    /// The descriptive column itself
    pub column: Column,
    pub historization: Historization,
    /// Parent key columns carried by the satellite
    pub key_columns: Vec<Column>,
    pub system_columns: Vec<Column>,
    /// Name of the satellite this attribute was built from
    pub source: String,
}

/// One end of a tie
#[derive(Debug, Clone, PartialEq)]
pub struct TieEnd {
    pub anchor: AnchorId,
    pub role: String,
    /// Index into the tie's key columns, when the link drew one for this end
    pub key: Option<usize>,
}

/// A relationship between anchors
#[derive(Debug, Clone, PartialEq)]
pub struct Tie {
    /// Mnemonic-free name (`customer_order`)
    pub name: String,
    /// Ends in link reference order
    pub ends: Vec<TieEnd>,
    /// Hub key columns drawn on the link
    pub key_columns: Vec<Column>,
    pub system_columns: Vec<Column>,
    /// Name of the link this tie was built from
    pub source: String,
}

impl Tie {
    /// Key column holding `end`'s identity
    pub fn end_key(&self, end: &TieEnd) -> Option<&Column> {
        end.key.map(|idx| &self.key_columns[idx])
    }
}

/// Anchor model produced by the transformer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnchorGraph {
    anchors: Vec<Anchor>,
    attributes: Vec<Attribute>,
    ties: Vec<Tie>,
}

impl AnchorGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_anchor(&mut self, anchor: Anchor) -> AnchorId {
        self.anchors.push(anchor);
        AnchorId(self.anchors.len() - 1)
    }

    pub fn add_attribute(&mut self, attribute: Attribute) -> AttributeId {
        self.attributes.push(attribute);
        AttributeId(self.attributes.len() - 1)
    }

    pub fn add_tie(&mut self, tie: Tie) -> TieId {
        self.ties.push(tie);
        TieId(self.ties.len() - 1)
    }

    pub fn anchor(&self, id: AnchorId) -> &Anchor {
        &self.anchors[id.0]
    }

    pub fn attribute(&self, id: AttributeId) -> &Attribute {
        &self.attributes[id.0]
    }

    pub fn tie(&self, id: TieId) -> &Tie {
        &self.ties[id.0]
    }

    pub fn anchors(&self) -> impl Iterator<Item = (AnchorId, &Anchor)> {
        self.anchors.iter().enumerate().map(|(i, a)| (AnchorId(i), a))
    }

    pub fn attributes(&self) -> impl Iterator<Item = (AttributeId, &Attribute)> {
        self.attributes
            .iter()
            .enumerate()
            .map(|(i, a)| (AttributeId(i), a))
    }

    pub fn ties(&self) -> impl Iterator<Item = (TieId, &Tie)> {
        self.ties.iter().enumerate().map(|(i, t)| (TieId(i), t))
    }

    pub fn anchor_count(&self) -> usize {
        self.anchors.len()
    }

    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    pub fn tie_count(&self) -> usize {
        self.ties.len()
    }

    pub fn find_anchor(&self, name: &str) -> Option<AnchorId> {
        self.anchors.iter().position(|a| a.name == name).map(AnchorId)
    }

    pub fn find_attribute(&self, name: &str) -> Option<AttributeId> {
        self.attributes
            .iter()
            .position(|a| a.name == name)
            .map(AttributeId)
    }

    pub fn find_tie(&self, name: &str) -> Option<TieId> {
        self.ties.iter().position(|t| t.name == name).map(TieId)
    }

    /// Attributes of `owner`, in insertion order
    pub fn attributes_of(&self, owner: Owner) -> Vec<AttributeId> {
        self.attributes()
            .filter(|(_, a)| a.owner == owner)
            .map(|(id, _)| id)
            .collect()
    }

    /// Ties with at least one end on `anchor`
    pub fn ties_of(&self, anchor: AnchorId) -> Vec<TieId> {
        self.ties()
            .filter(|(_, t)| t.ends.iter().any(|end| end.anchor == anchor))
            .map(|(id, _)| id)
            .collect()
    }

    /// Table view of an anchor: key rows, then system rows
    pub fn anchor_table(&self, id: AnchorId) -> TableShape {
        let anchor = self.anchor(id);
        let mut rows: Vec<TableRow> = anchor.key_columns.iter().map(TableRow::key).collect();
        rows.extend(anchor.system_columns.iter().map(TableRow::system));
        TableShape::new(format!("a_{}", anchor.name), anchor.name.clone(), rows)
    }

    /// Table view of an attribute: owner key rows, the value row, system rows
    ///
    /// A satellite drawn without its parent key borrows the owner's keys.
    pub fn attribute_table(&self, id: AttributeId) -> TableShape {
        let attribute = self.attribute(id);
        let keys = if attribute.key_columns.is_empty() {
            match attribute.owner {
                Owner::Anchor(owner) => &self.anchor(owner).key_columns,
                Owner::Tie(owner) => &self.tie(owner).key_columns,
            }
        } else {
            &attribute.key_columns
        };
        let mut rows: Vec<TableRow> = keys.iter().map(TableRow::key).collect();
        rows.push(TableRow::value(&attribute.column));
        rows.extend(attribute.system_columns.iter().map(TableRow::system));
        TableShape::new(format!("r_{}", attribute.name), attribute.name.clone(), rows)
    }

    /// Table view of a tie: key rows, then system rows
    ///
    /// Row `i` is key column `i`, so [`TieEnd::key`] indexes rows too.
    pub fn tie_table(&self, id: TieId) -> TableShape {
        let tie = self.tie(id);
        let mut rows: Vec<TableRow> = tie.key_columns.iter().map(TableRow::key).collect();
        rows.extend(tie.system_columns.iter().map(TableRow::system));
        TableShape::new(format!("t_{}", tie.name), tie.name.clone(), rows)
    }
}

/// Kind of row in a generated table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Key,
    Value,
    System,
}

/// One row of a generated table
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub kind: RowKind,
    /// Column name, used for ids and connector lookup
    pub name: String,
    /// Text of the name cell
    pub text: String,
}

impl TableRow {
    /// Keys are never null, so the suffix is left off
    fn key(column: &Column) -> Self {
        let text = match &column.data_type {
            Some(data_type) => format!("{} {}", column.name, data_type),
            None => column.name.clone(),
        };
        Self {
            kind: RowKind::Key,
            name: column.name.clone(),
            text,
        }
    }

    fn value(column: &Column) -> Self {
        Self {
            kind: RowKind::Value,
            name: column.name.clone(),
            text: column.display_text(),
        }
    }

    fn system(column: &Column) -> Self {
        Self {
            kind: RowKind::System,
            name: column.name.clone(),
            text: column.display_text(),
        }
    }

    /// Text of the flag cell
    pub fn flag(&self) -> &'static str {
        match self.kind {
            RowKind::Key => "PK",
            RowKind::Value => "",
            RowKind::System => "SYS",
        }
    }
}

/// A generated table: id, title and rows
#[derive(Debug, Clone, PartialEq)]
pub struct TableShape {
    pub id: String,
    pub title: String,
    pub rows: Vec<TableRow>,
}

impl TableShape {
    pub fn new(id: String, title: String, rows: Vec<TableRow>) -> Self {
        Self { id, title, rows }
    }

    /// First key row named `name`
    pub fn key_row(&self, name: &str) -> Option<usize> {
        self.rows
            .iter()
            .position(|r| r.kind == RowKind::Key && r.name == name)
    }

    /// First key row of any name
    pub fn first_key_row(&self) -> Option<usize> {
        self.rows.iter().position(|r| r.kind == RowKind::Key)
    }
}
