//! Conversion settings
//!
//! Everything tunable about a run lives here and is passed explicitly into
//! the stage that needs it. All structs deserialize from partial documents:
//! missing fields keep their defaults.

use serde::{Deserialize, Serialize};

use super::SystemKind;

/// Settings for a complete conversion run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// Zero-based index of the diagram page to convert
    pub page: usize,
    /// Reserved column names that carry loading metadata
    pub system_columns: SystemColumns,
    /// Geometry of the generated diagram
    pub layout: LayoutConfig,
    /// draw.io styles of the generated shapes
    pub styles: StyleConfig,
}

/// Reserved system-column names, matched case-insensitively
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemColumns {
    pub load_timestamp: Vec<String>,
    pub record_source: Vec<String>,
    pub hash_diff: Vec<String>,
}

impl SystemColumns {
    /// Classify a column name as a system column
    pub fn kind_of(&self, name: &str) -> Option<SystemKind> {
        let matches = |names: &[String]| names.iter().any(|n| n.eq_ignore_ascii_case(name));
        if matches(&self.load_timestamp) {
            Some(SystemKind::LoadTimestamp)
        } else if matches(&self.record_source) {
            Some(SystemKind::RecordSource)
        } else if matches(&self.hash_diff) {
            Some(SystemKind::HashDiff)
        } else {
            None
        }
    }
}

impl Default for SystemColumns {
    fn default() -> Self {
        let owned = |names: &[&str]| names.iter().map(|n| n.to_string()).collect();
        Self {
            load_timestamp: owned(&["load_dttm", "load_dts", "load_date", "ldts"]),
            record_source: owned(&["source_id", "record_source", "rec_src", "rsrc"]),
            hash_diff: owned(&["hash_diff", "hashdiff"]),
        }
    }
}

/// Geometry of generated tables and their arrangement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Distance of the first shapes from the page origin
    pub margin: f64,
    /// Horizontal gap between neighbouring shapes
    pub horizontal_gap: f64,
    /// Vertical gap between bands
    pub vertical_gap: f64,
    /// Gap between the tie lane and the anchor column
    pub lane_gap: f64,
    /// Height of the table title row
    pub header_height: f64,
    /// Height of one column row
    pub row_height: f64,
    /// Width of the key flag cell
    pub flag_width: f64,
    /// Narrowest table
    pub min_width: f64,
    /// Estimated width of one text column
    pub char_width: f64,
    /// Attributes placed beside an anchor before wrapping to a new row
    pub max_attributes_per_row: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            margin: 50.0,
            horizontal_gap: 50.0,
            vertical_gap: 100.0,
            lane_gap: 120.0,
            header_height: 30.0,
            row_height: 30.0,
            flag_width: 30.0,
            min_width: 180.0,
            char_width: 8.0,
            max_attributes_per_row: 4,
        }
    }
}

/// draw.io styles, one per generated shape category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub anchor: String,
    /// Attribute without history
    pub attribute: String,
    /// Attribute that keeps the history of its values
    pub historized_attribute: String,
    pub tie: String,
    /// Row container of a key column
    pub key_row: String,
    /// Row container of any other column
    pub row: String,
    pub key_flag_cell: String,
    pub key_name_cell: String,
    pub flag_cell: String,
    pub name_cell: String,
    /// Anchor-to-attribute connectors
    pub ownership_edge: String,
    /// Anchor-to-tie connectors
    pub tie_edge: String,
}

const TABLE_BASE: &str = "shape=table;startSize=30;container=1;collapsible=1;childLayout=tableLayout;fixedRows=1;rowLines=0;fontStyle=1;align=center;resizeLast=1;html=1;";

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            anchor: format!("{TABLE_BASE}fillColor=#f8cecc;strokeColor=#b85450;"),
            attribute: format!("{TABLE_BASE}fillColor=#ffffff;strokeColor=#666666;rounded=1;"),
            historized_attribute: format!(
                "{TABLE_BASE}fillColor=#ffffff;strokeColor=#666666;rounded=1;strokeWidth=3;"
            ),
            tie: format!("{TABLE_BASE}fillColor=#f5f5f5;strokeColor=#666666;"),
            key_row: "shape=tableRow;horizontal=0;startSize=0;swimlaneHead=0;swimlaneBody=0;fillColor=none;collapsible=0;dropTarget=0;points=[[0,0.5],[1,0.5]];portConstraint=eastwest;top=0;left=0;right=0;bottom=1;".to_string(),
            row: "shape=tableRow;horizontal=0;startSize=0;swimlaneHead=0;swimlaneBody=0;fillColor=none;collapsible=0;dropTarget=0;points=[[0,0.5],[1,0.5]];portConstraint=eastwest;top=0;left=0;right=0;bottom=0;".to_string(),
            key_flag_cell: "shape=partialRectangle;connectable=0;fillColor=none;top=0;left=0;bottom=0;right=0;fontStyle=1;overflow=hidden;whiteSpace=wrap;html=1;".to_string(),
            key_name_cell: "shape=partialRectangle;connectable=0;fillColor=none;top=0;left=0;bottom=0;right=0;align=left;spacingLeft=6;fontStyle=5;overflow=hidden;whiteSpace=wrap;html=1;".to_string(),
            flag_cell: "shape=partialRectangle;connectable=0;fillColor=none;top=0;left=0;bottom=0;right=0;editable=1;overflow=hidden;whiteSpace=wrap;html=1;".to_string(),
            name_cell: "shape=partialRectangle;connectable=0;fillColor=none;top=0;left=0;bottom=0;right=0;align=left;spacingLeft=6;overflow=hidden;whiteSpace=wrap;html=1;".to_string(),
            ownership_edge: "edgeStyle=entityRelationEdgeStyle;fontSize=12;html=1;endArrow=ERmandOne;startArrow=ERmandOne;rounded=0;exitX=1;exitY=0.5;exitDx=0;exitDy=0;entryX=0;entryY=0.5;entryDx=0;entryDy=0;".to_string(),
            tie_edge: "edgeStyle=entityRelationEdgeStyle;fontSize=12;html=1;endArrow=ERmany;startArrow=ERmandOne;rounded=0;".to_string(),
        }
    }
}
