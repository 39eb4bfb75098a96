//! draw.io emitter for positioned anchor models
//!
//! Every anchor, attribute and tie becomes a draw.io table: a table cell,
//! one row container per column, and a flag cell plus a name cell inside
//! each row. Connectors run between key rows. Cell ids are derived from
//! element names, so the same positioned graph always yields the same
//! document.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, span, Level};

use super::graph::{Historization, Owner, RowKind, TableShape};
use super::layout::{PositionedAnchorGraph, PositionedTable};
use crate::core::{LayoutConfig, Renderer, StyleConfig};
use crate::drawio::{html_label, Cell, DiagramDocument, Geometry, GraphModel, Page};

const ROOT_ID: &str = "0";
const LAYER_ID: &str = "1";

/// Renders a positioned anchor graph as a draw.io document
pub struct DrawioEmitter {
    styles: StyleConfig,
    layout: LayoutConfig,
}

/// Cell ids of one emitted table
struct EmittedTable {
    id: String,
    /// Row container id per table row
    rows: Vec<String>,
}

impl EmittedTable {
    /// Row container of the key row named `name`, or of the first key row
    fn key_endpoint(&self, table: &TableShape, name: Option<&str>) -> &str {
        let row = name
            .and_then(|name| table.key_row(name))
            .or_else(|| table.first_key_row());
        match row {
            Some(idx) => &self.rows[idx],
            None => &self.id,
        }
    }
}

/// Allocates cell ids, suffixing repeats with `_2`, `_3`, ...
#[derive(Default)]
struct IdAllocator {
    used: HashSet<String>,
}

impl IdAllocator {
    fn allocate(&mut self, base: String) -> String {
        if self.used.insert(base.clone()) {
            return base;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{}_{}", base, n);
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}

impl DrawioEmitter {
    pub fn new() -> Self {
        Self::with_config(StyleConfig::default(), LayoutConfig::default())
    }

    pub fn with_config(styles: StyleConfig, layout: LayoutConfig) -> Self {
        Self { styles, layout }
    }

    fn emit_table(
        &self,
        model: &mut GraphModel,
        ids: &mut IdAllocator,
        positioned: &PositionedTable,
        style: &str,
    ) -> EmittedTable {
        let table = &positioned.table;
        let bounds = positioned.bounds;
        let table_id = ids.allocate(table.id.clone());

        model.add_cell(
            Cell::vertex(&table_id, LAYER_ID, html_label(&table.title), style).with_geometry(
                Geometry::rect(bounds.x, bounds.y, bounds.width, bounds.height),
            ),
        );

        let row_height = self.layout.row_height;
        let flag_width = self.layout.flag_width;
        let mut rows = Vec::with_capacity(table.rows.len());
        for (idx, row) in table.rows.iter().enumerate() {
            let key = row.kind == RowKind::Key;
            let base = ids.allocate(format!("{}_{}", table_id, row.name));
            let container = ids.allocate(format!("{}_container", base));

            let row_style = if key { &self.styles.key_row } else { &self.styles.row };
            model.add_cell(
                Cell::vertex(&container, &table_id, "", row_style).with_geometry(Geometry {
                    y: Some(self.layout.header_height + idx as f64 * row_height),
                    width: Some(bounds.width),
                    height: Some(row_height),
                    ..Geometry::default()
                }),
            );

            let flag_style = if key {
                &self.styles.key_flag_cell
            } else {
                &self.styles.flag_cell
            };
            let flag_id = ids.allocate(format!("{}_flag", base));
            model.add_cell(
                Cell::vertex(flag_id, &container, row.flag(), flag_style)
                    .with_geometry(Geometry {
                        width: Some(flag_width),
                        height: Some(row_height),
                        ..Geometry::default()
                    }
                    .with_alternate_bounds(flag_width, row_height)),
            );

            let name_style = if key {
                &self.styles.key_name_cell
            } else {
                &self.styles.name_cell
            };
            let name_width = bounds.width - flag_width;
            let column_id = ids.allocate(format!("{}_column", base));
            model.add_cell(
                Cell::vertex(column_id, &container, html_label(&row.text), name_style)
                    .with_geometry(
                        Geometry {
                            x: Some(flag_width),
                            width: Some(name_width),
                            height: Some(row_height),
                            ..Geometry::default()
                        }
                        .with_alternate_bounds(name_width, row_height),
                    ),
            );

            rows.push(container);
        }

        EmittedTable {
            id: table_id,
            rows,
        }
    }

    fn emit_edge(
        &self,
        model: &mut GraphModel,
        ids: &mut IdAllocator,
        source: &str,
        target: &str,
        label: &str,
        style: &str,
    ) {
        let id = ids.allocate(format!("{}_to_{}", source, target));
        model.add_cell(
            Cell::edge(id, LAYER_ID, source, target, style)
                .with_value(html_label(label))
                .with_geometry(Geometry {
                    width: Some(100.0),
                    height: Some(100.0),
                    ..Geometry::relative()
                }),
        );
    }

    fn graph_model_attributes(&self, input: &PositionedAnchorGraph) -> GraphModel {
        let page_width = (input.width.max(1100.0) / 10.0).ceil() * 10.0;
        let page_height = (input.height.max(850.0) / 10.0).ceil() * 10.0;
        GraphModel::new()
            .with_attribute("dx", "1426")
            .with_attribute("dy", "797")
            .with_attribute("grid", "1")
            .with_attribute("gridSize", "10")
            .with_attribute("guides", "1")
            .with_attribute("tooltips", "1")
            .with_attribute("connect", "1")
            .with_attribute("arrows", "1")
            .with_attribute("fold", "1")
            .with_attribute("page", "1")
            .with_attribute("pageScale", "1")
            .with_attribute("pageWidth", page_width.to_string())
            .with_attribute("pageHeight", page_height.to_string())
            .with_attribute("background", "none")
            .with_attribute("math", "0")
            .with_attribute("shadow", "0")
    }
}

impl Default for DrawioEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer<PositionedAnchorGraph> for DrawioEmitter {
    type Output = DiagramDocument;

    fn render(&self, input: &PositionedAnchorGraph) -> DiagramDocument {
        let render_span = span!(Level::INFO, "emit_drawio");
        let _enter = render_span.enter();

        let graph = &input.graph;
        let mut model = self.graph_model_attributes(input);
        model.add_cell(Cell::new(ROOT_ID));
        model.add_cell(Cell::new(LAYER_ID).with_parent(ROOT_ID));

        let mut ids = IdAllocator::default();
        ids.allocate(ROOT_ID.to_string());
        ids.allocate(LAYER_ID.to_string());

        let mut anchors = HashMap::new();
        for (id, _) in graph.anchors() {
            let emitted = self.emit_table(&mut model, &mut ids, input.anchor(id), &self.styles.anchor);
            anchors.insert(id, emitted);
        }
        let mut ties = HashMap::new();
        for (id, _) in graph.ties() {
            let emitted = self.emit_table(&mut model, &mut ids, input.tie(id), &self.styles.tie);
            ties.insert(id, emitted);
        }
        let mut attributes = Vec::new();
        for (id, attribute) in graph.attributes() {
            let style = match attribute.historization {
                Historization::Historized => &self.styles.historized_attribute,
                Historization::Static => &self.styles.attribute,
            };
            let emitted = self.emit_table(&mut model, &mut ids, input.attribute(id), style);
            attributes.push((id, emitted));
        }
        debug!(tables = model.cell_count(), "Emitted tables");

        let mut edges = 0;
        for (id, emitted) in &attributes {
            let attribute = graph.attribute(*id);
            let table = &input.attribute(*id).table;
            let key_name = table.first_key_row().map(|idx| table.rows[idx].name.as_str());
            let (owner, owner_table) = match attribute.owner {
                Owner::Anchor(owner) => (&anchors[&owner], &input.anchor(owner).table),
                Owner::Tie(owner) => (&ties[&owner], &input.tie(owner).table),
            };
            let source = owner.key_endpoint(owner_table, key_name).to_string();
            let target = emitted.key_endpoint(table, None).to_string();
            self.emit_edge(
                &mut model,
                &mut ids,
                &source,
                &target,
                "",
                &self.styles.ownership_edge,
            );
            edges += 1;
        }

        for (id, tie) in graph.ties() {
            let emitted = &ties[&id];
            for end in &tie.ends {
                let anchor = &anchors[&end.anchor];
                let source = anchor
                    .key_endpoint(&input.anchor(end.anchor).table, None)
                    .to_string();
                let target = match end.key {
                    Some(row) => emitted.rows[row].as_str(),
                    None => emitted.id.as_str(),
                }
                .to_string();
                self.emit_edge(
                    &mut model,
                    &mut ids,
                    &source,
                    &target,
                    &end.role,
                    &self.styles.tie_edge,
                );
                edges += 1;
            }
        }

        info!(cells = model.cell_count(), edges, "Emitted draw.io document");

        let mut document = DiagramDocument::new()
            .with_attribute("host", "dv2anchor")
            .with_attribute("version", env!("CARGO_PKG_VERSION"));
        document.pages.push(Page {
            id: Some("anchor-model".to_string()),
            name: Some("Page-1".to_string()),
            model,
        });
        document
    }

    fn name(&self) -> &'static str {
        "drawio"
    }

    fn version(&self) -> &'static str {
        "1.0.0"
    }

    fn format(&self) -> &'static str {
        "drawio-xml"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchor::graph::{
        Anchor, AnchorGraph, AnchorId, Attribute, Historization, Tie, TieEnd,
    };
    use crate::anchor::AnchorLayoutAlgorithm;
    use crate::core::{Column, LayoutAlgorithm, SystemKind};
    use crate::drawio::write_document;

    fn positioned() -> PositionedAnchorGraph {
        let mut graph = AnchorGraph::new();
        let customer = graph.add_anchor(Anchor {
            name: "customer".to_string(),
            key_columns: vec![Column::business_key("customer_id")],
            system_columns: vec![Column::system("load_dttm", SystemKind::LoadTimestamp)],
            source: "h_customer".to_string(),
        });
        let order = graph.add_anchor(Anchor {
            name: "order".to_string(),
            key_columns: vec![Column::business_key("order_id")],
            system_columns: Vec::new(),
            source: "h_order".to_string(),
        });
        graph.add_attribute(Attribute {
            name: "customer_details_name".to_string(),
            owner: Owner::Anchor(customer),
            column: Column::descriptive("name"),
            historization: Historization::Historized,
            key_columns: vec![Column::business_key("customer_id")],
            system_columns: vec![Column::system("load_dttm", SystemKind::LoadTimestamp)],
            source: "s_customer_details".to_string(),
        });
        graph.add_tie(Tie {
            name: "customer_order".to_string(),
            ends: vec![
                TieEnd {
                    anchor: customer,
                    role: "buyer".to_string(),
                    key: Some(0),
                },
                TieEnd {
                    anchor: order,
                    role: "role-2".to_string(),
                    key: None,
                },
            ],
            key_columns: vec![Column::foreign_key("customer_id")],
            system_columns: Vec::new(),
            source: "l_customer_order".to_string(),
        });
        AnchorLayoutAlgorithm::new().layout(&graph)
    }

    fn cell<'a>(document: &'a DiagramDocument, id: &str) -> &'a Cell {
        document.pages[0]
            .model
            .cells
            .iter()
            .find(|c| c.id == id)
            .unwrap_or_else(|| panic!("missing cell {}", id))
    }

    #[test]
    fn test_skeleton() {
        let document = DrawioEmitter::new().render(&positioned());
        assert_eq!(document.page_count(), 1);
        let page = &document.pages[0];
        assert_eq!(page.name.as_deref(), Some("Page-1"));
        assert_eq!(page.model.cells[0].id, "0");
        assert_eq!(page.model.cells[1].parent.as_deref(), Some("0"));
    }

    #[test]
    fn test_tables_and_rows() {
        let document = DrawioEmitter::new().render(&positioned());
        let anchor = cell(&document, "a_customer");
        assert_eq!(anchor.label(), "customer");
        assert_eq!(anchor.style, Some(StyleConfig::default().anchor));

        let row = cell(&document, "a_customer_customer_id_container");
        assert_eq!(row.parent.as_deref(), Some("a_customer"));
        assert_eq!(cell(&document, "a_customer_customer_id_flag").label(), "PK");
        assert_eq!(cell(&document, "a_customer_load_dttm_flag").label(), "SYS");
        assert_eq!(
            cell(&document, "r_customer_details_name_name_column").label(),
            "name"
        );
        assert!(cell(&document, "t_customer_order").vertex);
    }

    #[test]
    fn test_edges_between_key_rows() {
        let document = DrawioEmitter::new().render(&positioned());
        let ownership = cell(
            &document,
            "a_customer_customer_id_container_to_r_customer_details_name_customer_id_container",
        );
        assert!(ownership.edge);

        let buyer = cell(
            &document,
            "a_customer_customer_id_container_to_t_customer_order_customer_id_container",
        );
        assert_eq!(buyer.label(), "buyer");

        // No key column for this end: connect to the tie table itself
        let second = cell(&document, "a_order_order_id_container_to_t_customer_order");
        assert_eq!(second.label(), "role-2");
    }

    #[test]
    fn test_attribute_style_follows_historization() {
        let mut input = positioned();
        let styles = StyleConfig::default();
        let document = DrawioEmitter::new().render(&input);
        assert_eq!(
            cell(&document, "r_customer_details_name").style,
            Some(styles.historized_attribute.clone())
        );

        let mut graph = input.graph.clone();
        graph.add_attribute(Attribute {
            name: "customer_details_nickname".to_string(),
            owner: Owner::Anchor(AnchorId(0)),
            column: Column::descriptive("nickname"),
            historization: Historization::Static,
            key_columns: Vec::new(),
            system_columns: Vec::new(),
            source: "s_customer_details".to_string(),
        });
        input = AnchorLayoutAlgorithm::new().layout(&graph);
        let document = DrawioEmitter::new().render(&input);
        assert_eq!(
            cell(&document, "r_customer_details_nickname").style,
            Some(styles.attribute)
        );
    }

    #[test]
    fn test_labels_are_html_escaped() {
        let mut graph = AnchorGraph::new();
        let customer = graph.add_anchor(Anchor {
            name: "customer".to_string(),
            key_columns: vec![Column::business_key("customer_id")],
            system_columns: Vec::new(),
            source: "h_customer".to_string(),
        });
        graph.add_attribute(Attribute {
            name: "customer_tags_tags".to_string(),
            owner: Owner::Anchor(customer),
            column: Column::descriptive("tags").with_type("array<int>"),
            historization: Historization::Static,
            key_columns: Vec::new(),
            system_columns: Vec::new(),
            source: "s_customer_tags".to_string(),
        });
        let document = DrawioEmitter::new().render(&AnchorLayoutAlgorithm::new().layout(&graph));
        assert_eq!(
            cell(&document, "r_customer_tags_tags_tags_column").label(),
            "tags array&lt;int&gt;"
        );
    }

    #[test]
    fn test_repeated_tie_key_rows_get_their_own_edges() {
        let mut graph = AnchorGraph::new();
        let person = graph.add_anchor(Anchor {
            name: "person".to_string(),
            key_columns: vec![Column::business_key("person_id")],
            system_columns: Vec::new(),
            source: "h_person".to_string(),
        });
        graph.add_tie(Tie {
            name: "referral".to_string(),
            ends: vec![
                TieEnd {
                    anchor: person,
                    role: "referrer".to_string(),
                    key: Some(0),
                },
                TieEnd {
                    anchor: person,
                    role: "referee".to_string(),
                    key: Some(1),
                },
            ],
            key_columns: vec![
                Column::foreign_key("person_id"),
                Column::foreign_key("person_id"),
            ],
            system_columns: Vec::new(),
            source: "l_referral".to_string(),
        });
        let document = DrawioEmitter::new().render(&AnchorLayoutAlgorithm::new().layout(&graph));

        let referrer = cell(
            &document,
            "a_person_person_id_container_to_t_referral_person_id_container",
        );
        assert_eq!(referrer.label(), "referrer");
        let referee = cell(
            &document,
            "a_person_person_id_container_to_t_referral_person_id_2_container",
        );
        assert_eq!(referee.label(), "referee");
        assert_eq!(
            referee.target.as_deref(),
            Some("t_referral_person_id_2_container")
        );
    }

    #[test]
    fn test_id_allocator() {
        let mut ids = IdAllocator::default();
        assert_eq!(ids.allocate("a".to_string()), "a");
        assert_eq!(ids.allocate("a".to_string()), "a_2");
        assert_eq!(ids.allocate("a".to_string()), "a_3");
    }

    #[test]
    fn test_emission_is_byte_identical() {
        let input = positioned();
        let emitter = DrawioEmitter::new();
        let first = write_document(&emitter.render(&input)).unwrap();
        let second = write_document(&emitter.render(&input)).unwrap();
        assert_eq!(first, second);
    }
}
