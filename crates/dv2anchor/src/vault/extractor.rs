//! Data Vault extractor
//!
//! Reads one diagram page and builds a [`VaultGraph`]. Shapes are classified
//! by the first line of their label. A classified shape owns everything
//! drawn inside it: its rows and cells are read as columns and never
//! classified themselves.

use std::collections::HashMap;

use tracing::{debug, info, span, trace, warn, Level};

use super::columns::{infer_role, ColumnLineParser};
use super::graph::{
    Dv2Construct, EntityRef, Hub, HubId, HubReference, Link, LinkId, Satellite, SatelliteId,
    StrayConnection, VaultGraph,
};
use super::{Dv2Feature, ShapeKind};
use crate::core::{Column, ColumnRole, ExtractionError, Extractor, KeyFlag, SystemColumns};
use crate::drawio::{label_lines, label_title, Cell, CellIndex, GraphModel};

/// Where a classified shape went in the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Hub(HubId),
    Link(LinkId),
    Satellite(SatelliteId),
    /// Recorded as a DV 2.0 construct, connectors are not read
    Dv2,
}

/// What one end of a connector is attached to
enum Endpoint<'a> {
    Missing,
    Dangling(&'a str),
    Classified(Slot),
    Unclassified(&'a Cell),
}

/// Extractor that reads Data Vault tables from a draw.io page
#[derive(Debug, Clone, Default)]
pub struct VaultExtractor {
    system_columns: SystemColumns,
    parser: ColumnLineParser,
}

impl VaultExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_system_columns(mut self, system_columns: SystemColumns) -> Self {
        self.system_columns = system_columns;
        self
    }

    /// Vertices that start a classified shape, with their kind and title
    ///
    /// A candidate nested inside another candidate belongs to the outer one.
    fn classified_shapes<'a>(
        &self,
        page: &'a GraphModel,
        index: &CellIndex<'a>,
    ) -> Vec<(&'a Cell, String, Option<ShapeKind>)> {
        let mut candidates: HashMap<&str, (String, Option<ShapeKind>)> = HashMap::new();
        for cell in page.cells.iter().filter(|c| c.vertex) {
            if index.is_edge_label(cell) {
                continue;
            }
            let title = label_title(cell.label());
            match ShapeKind::classify(&title) {
                ShapeKind::Unrecognized => {
                    if Dv2Feature::detect_shape(&title).is_some() {
                        candidates.insert(cell.id.as_str(), (title, None));
                    }
                }
                kind => {
                    candidates.insert(cell.id.as_str(), (title, Some(kind)));
                }
            }
        }

        page.cells
            .iter()
            .filter_map(|cell| {
                let (title, kind) = candidates.get(cell.id.as_str())?;
                let nested = index
                    .ancestors(cell)
                    .iter()
                    .any(|ancestor| candidates.contains_key(ancestor.id.as_str()));
                if nested {
                    trace!(cell_id = %cell.id, title = %title, "Skipping nested name");
                    return None;
                }
                Some((cell, title.clone(), *kind))
            })
            .collect()
    }

    /// Read every column drawn inside `shape`, in document order
    fn read_columns(
        &self,
        index: &CellIndex<'_>,
        shape: &Cell,
        title: &str,
        kind: ShapeKind,
    ) -> Result<Vec<Column>, ExtractionError> {
        let rows = index.vertex_children(&shape.id);
        let mut columns = Vec::new();

        if rows.is_empty() {
            for line in label_lines(shape.label()).iter().skip(1) {
                columns.push(self.read_line(shape, title, kind, line, KeyFlag::None)?);
            }
            return Ok(columns);
        }

        for row in rows {
            let cells = index.vertex_children(&row.id);
            if cells.is_empty() {
                for line in label_lines(row.label()) {
                    columns.push(self.read_line(shape, title, kind, &line, KeyFlag::None)?);
                }
                continue;
            }

            let (flag, text) = match cells.as_slice() {
                [only] => (KeyFlag::None, label_title(only.label())),
                [first, second] => {
                    let first = label_title(first.label());
                    let second = label_title(second.label());
                    match (KeyFlag::parse(&first), KeyFlag::parse(&second)) {
                        (Some(flag), _) if !second.is_empty() => (flag, second),
                        (_, Some(flag)) if !first.is_empty() => (flag, first),
                        (Some(_), Some(_)) => {
                            return Err(ExtractionError::malformed(
                                &shape.id,
                                title,
                                format!("row {} has no column name", row.id),
                            ))
                        }
                        _ => {
                            return Err(ExtractionError::malformed(
                                &shape.id,
                                title,
                                format!(
                                    "row {} has no key flag cell ('{}', '{}')",
                                    row.id, first, second
                                ),
                            ))
                        }
                    }
                }
                other => {
                    return Err(ExtractionError::malformed(
                        &shape.id,
                        title,
                        format!(
                            "row {} has {} cells, expected 1 or 2",
                            row.id,
                            other.len()
                        ),
                    ))
                }
            };

            if text.is_empty() {
                return Err(ExtractionError::malformed(
                    &shape.id,
                    title,
                    format!("row {} has no column name", row.id),
                ));
            }
            columns.push(self.read_line(shape, title, kind, &text, flag)?);
        }
        Ok(columns)
    }

    fn read_line(
        &self,
        shape: &Cell,
        title: &str,
        kind: ShapeKind,
        line: &str,
        flag: KeyFlag,
    ) -> Result<Column, ExtractionError> {
        let mut parsed = self
            .parser
            .parse_line(line)
            .map_err(|reason| ExtractionError::malformed(&shape.id, title, reason))?;
        if flag != KeyFlag::None {
            parsed.key = flag;
        }
        let role = infer_role(kind, &parsed.name, parsed.key, &self.system_columns);
        trace!(shape = %title, column = %parsed.name, %role, "Read column");
        Ok(parsed.into_column(role))
    }

    fn resolve<'a>(
        &self,
        index: &CellIndex<'a>,
        slots: &HashMap<String, Slot>,
        endpoint: Option<&'a str>,
    ) -> Endpoint<'a> {
        let Some(id) = endpoint else {
            return Endpoint::Missing;
        };
        let Some(cell) = index.get(id) else {
            return Endpoint::Dangling(id);
        };
        std::iter::once(cell)
            .chain(index.ancestors(cell))
            .find_map(|c| slots.get(&c.id).copied())
            .map(Endpoint::Classified)
            .unwrap_or(Endpoint::Unclassified(cell))
    }

    /// Connector label from its value or from a label cell on the edge
    fn edge_label(index: &CellIndex<'_>, edge: &Cell) -> Option<String> {
        let own = label_title(edge.label());
        if !own.is_empty() {
            return Some(own);
        }
        index
            .children(&edge.id)
            .into_iter()
            .map(|child| label_title(child.label()))
            .find(|text| !text.is_empty())
    }

    fn slot_name<'g>(graph: &'g VaultGraph, slot: Slot) -> &'g str {
        match slot {
            Slot::Hub(id) => &graph.hub(id).name,
            Slot::Link(id) => &graph.link(id).name,
            Slot::Satellite(id) => &graph.satellite(id).name,
            Slot::Dv2 => "",
        }
    }

    fn connect(
        graph: &mut VaultGraph,
        index: &CellIndex<'_>,
        edge: &Cell,
        a: Slot,
        b: Slot,
    ) {
        match (a, b) {
            (Slot::Satellite(sat), Slot::Hub(hub)) | (Slot::Hub(hub), Slot::Satellite(sat)) => {
                Self::attach(graph, sat, EntityRef::Hub(hub));
            }
            (Slot::Satellite(sat), Slot::Link(link))
            | (Slot::Link(link), Slot::Satellite(sat)) => {
                Self::attach(graph, sat, EntityRef::Link(link));
            }
            (Slot::Link(link), Slot::Hub(hub)) | (Slot::Hub(hub), Slot::Link(link)) => {
                let mut reference = HubReference::new(hub).with_edge(edge.id.clone());
                if let Some(role) = Self::edge_label(index, edge) {
                    reference = reference.with_role(role);
                }
                debug!(
                    link = %graph.link(link).name,
                    hub = %graph.hub(hub).name,
                    role = ?reference.role,
                    "Link references hub"
                );
                graph.link_mut(link).references.push(reference);
            }
            _ => {
                let connection = StrayConnection {
                    edge_id: edge.id.clone(),
                    source: Self::slot_name(graph, a).to_string(),
                    target: Self::slot_name(graph, b).to_string(),
                };
                debug!(
                    edge_id = %edge.id,
                    source = %connection.source,
                    target = %connection.target,
                    "Stray connection"
                );
                graph.add_stray_connection(connection);
            }
        }
    }

    fn attach(graph: &mut VaultGraph, sat: SatelliteId, parent: EntityRef) {
        let parent_name = graph.entity_name(parent).to_string();
        let satellite = graph.satellite_mut(sat);
        if !satellite.parents.contains(&parent) {
            debug!(satellite = %satellite.name, parent = %parent_name, "Satellite attached");
            satellite.parents.push(parent);
        }
    }

    /// Settle the roles that depend on connectors
    ///
    /// Link columns naming an inherited hub key are foreign keys. Satellite
    /// columns flagged `FK` that name a key of their parent are the parent
    /// key.
    fn refine_roles(graph: &mut VaultGraph) {
        let link_ids: Vec<LinkId> = graph.links().map(|(id, _)| id).collect();
        for id in link_ids {
            let inherited = graph.inherited_keys(id);
            for column in graph.link_mut(id).columns.iter_mut() {
                if !column.role.is_system() && inherited.contains(&column.name) {
                    column.role = ColumnRole::ForeignKey;
                }
            }
        }

        let sat_ids: Vec<SatelliteId> = graph.satellites().map(|(id, _)| id).collect();
        for id in sat_ids {
            let parent_keys: Vec<String> = graph
                .satellite(id)
                .parents
                .iter()
                .flat_map(|parent| graph.parent_keys(*parent))
                .collect();
            for column in graph.satellite_mut(id).columns.iter_mut() {
                if column.role == ColumnRole::ForeignKey && parent_keys.contains(&column.name) {
                    column.role = ColumnRole::BusinessKey;
                }
            }
        }
    }
}

impl Extractor<GraphModel> for VaultExtractor {
    type Model = VaultGraph;
    type Error = ExtractionError;

    fn extract(&self, page: &GraphModel) -> Result<VaultGraph, ExtractionError> {
        let extract_span = span!(Level::INFO, "extract_vault", cells = page.cell_count());
        let _enter = extract_span.enter();

        let index = page.index();
        let mut graph = VaultGraph::new();
        let mut slots: HashMap<String, Slot> = HashMap::new();

        for (shape, title, kind) in self.classified_shapes(page, &index) {
            let slot = match kind {
                None => {
                    let Some(feature) = Dv2Feature::detect_shape(&title) else {
                        continue;
                    };
                    debug!(name = %title, %feature, "Recorded DV 2.0 construct");
                    graph.add_dv2_construct(Dv2Construct {
                        name: title,
                        feature,
                    });
                    Slot::Dv2
                }
                Some(kind) => {
                    let columns = self.read_columns(&index, shape, &title, kind)?;
                    debug!(%kind, name = %title, columns = columns.len(), "Read shape");
                    match kind {
                        ShapeKind::Hub => {
                            let mut hub = Hub::new(title);
                            hub.columns = columns;
                            Slot::Hub(graph.add_hub(hub))
                        }
                        ShapeKind::Link => {
                            let mut link = Link::new(title);
                            link.columns = columns;
                            Slot::Link(graph.add_link(link))
                        }
                        ShapeKind::Satellite => {
                            let mut satellite = Satellite::new(title);
                            satellite.columns = columns;
                            Slot::Satellite(graph.add_satellite(satellite))
                        }
                        ShapeKind::Unrecognized => continue,
                    }
                }
            };
            slots.insert(shape.id.clone(), slot);
        }

        for edge in page.cells.iter().filter(|c| c.edge) {
            let source = self.resolve(&index, &slots, edge.source.as_deref());
            let target = self.resolve(&index, &slots, edge.target.as_deref());

            match (source, target) {
                (Endpoint::Classified(Slot::Dv2), _) | (_, Endpoint::Classified(Slot::Dv2)) => {
                    trace!(edge_id = %edge.id, "Skipping connector of DV 2.0 construct");
                }
                (Endpoint::Classified(a), Endpoint::Classified(b)) => {
                    Self::connect(&mut graph, &index, edge, a, b);
                }
                (Endpoint::Classified(slot), Endpoint::Unclassified(cell))
                | (Endpoint::Unclassified(cell), Endpoint::Classified(slot)) => {
                    let shape = label_title(cell.label());
                    return Err(ExtractionError::UnclassifiedParticipant {
                        edge_id: edge.id.clone(),
                        cell_id: cell.id.clone(),
                        shape: if shape.is_empty() { cell.id.clone() } else { shape },
                        peer: Self::slot_name(&graph, slot).to_string(),
                    });
                }
                (Endpoint::Classified(_), Endpoint::Dangling(id))
                | (Endpoint::Dangling(id), Endpoint::Classified(_)) => {
                    return Err(ExtractionError::DanglingReference {
                        edge_id: edge.id.clone(),
                        endpoint: id.to_string(),
                    });
                }
                (Endpoint::Classified(_), Endpoint::Missing)
                | (Endpoint::Missing, Endpoint::Classified(_)) => {
                    return Err(ExtractionError::DanglingReference {
                        edge_id: edge.id.clone(),
                        endpoint: "(none)".to_string(),
                    });
                }
                _ => {
                    trace!(edge_id = %edge.id, "Ignoring decoration connector");
                }
            }
        }

        Self::refine_roles(&mut graph);

        if graph.hub_count() + graph.link_count() + graph.satellite_count() == 0 {
            warn!("No hub, link or satellite found on page");
        }
        info!(
            hubs = graph.hub_count(),
            links = graph.link_count(),
            satellites = graph.satellite_count(),
            stray_connections = graph.stray_connections().len(),
            dv2_constructs = graph.dv2_constructs().len(),
            "Extracted Data Vault graph"
        );
        Ok(graph)
    }

    fn name(&self) -> &'static str {
        "vault"
    }

    fn version(&self) -> &'static str {
        "1.0.0"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawio::read_document;

    fn page(cells: &str) -> GraphModel {
        let xml = format!(
            r#"<mxGraphModel><root><mxCell id="0"/><mxCell id="1" parent="0"/>{}</root></mxGraphModel>"#,
            cells
        );
        read_document(&xml).unwrap().pages.remove(0).model
    }

    fn table(id: &str, name: &str, rows: &[(&str, &str)]) -> String {
        let mut xml = format!(
            r#"<mxCell id="{id}" value="{name}" style="shape=table;" vertex="1" parent="1"/>"#
        );
        for (i, (flag, column)) in rows.iter().enumerate() {
            xml.push_str(&format!(
                r#"<mxCell id="{id}_r{i}" value="" style="shape=tableRow;" vertex="1" parent="{id}"/>
<mxCell id="{id}_r{i}_f" value="{flag}" vertex="1" parent="{id}_r{i}"/>
<mxCell id="{id}_r{i}_n" value="{column}" vertex="1" parent="{id}_r{i}"/>"#
            ));
        }
        xml
    }

    fn edge(id: &str, source: &str, target: &str, label: &str) -> String {
        format!(
            r#"<mxCell id="{id}" value="{label}" edge="1" parent="1" source="{source}" target="{target}"/>"#
        )
    }

    fn extract(cells: &str) -> Result<VaultGraph, ExtractionError> {
        VaultExtractor::new().extract(&page(cells))
    }

    #[test]
    fn test_extracts_tables_and_columns() {
        let cells = table("h", "h_customer", &[("PK", "customer_id"), ("", "load_dttm")]);
        let graph = extract(&cells).unwrap();
        assert_eq!(graph.hub_count(), 1);
        let hub = graph.hub(HubId(0));
        assert_eq!(hub.name, "h_customer");
        assert_eq!(hub.columns[0].role, ColumnRole::BusinessKey);
        assert!(hub.columns[1].role.is_system());
    }

    #[test]
    fn test_flag_cell_in_either_order() {
        let cells = r#"<mxCell id="h" value="h_x" vertex="1" parent="1"/>
<mxCell id="r" vertex="1" parent="h"/>
<mxCell id="n" value="x_id" vertex="1" parent="r"/>
<mxCell id="f" value="PK" vertex="1" parent="r"/>"#;
        let graph = extract(cells).unwrap();
        let column = &graph.hub(HubId(0)).columns[0];
        assert_eq!(column.name, "x_id");
        assert_eq!(column.key, KeyFlag::Primary);
    }

    #[test]
    fn test_label_body_columns() {
        let cells = r#"<mxCell id="h" value="h_x&lt;br&gt;PK x_id&lt;br&gt;load_dttm" vertex="1" parent="1"/>"#;
        let graph = extract(cells).unwrap();
        let hub = graph.hub(HubId(0));
        assert_eq!(hub.name, "h_x");
        assert_eq!(hub.columns.len(), 2);
        assert_eq!(hub.columns[0].name, "x_id");
    }

    #[test]
    fn test_text_rows() {
        let cells = r#"<mxCell id="s" value="s_x_details" vertex="1" parent="1"/>
<mxCell id="t" value="PK x_id&lt;br&gt;name text&lt;br&gt;load_dttm" vertex="1" parent="s"/>"#;
        let graph = extract(cells).unwrap();
        let satellite = graph.satellite(SatelliteId(0));
        assert_eq!(satellite.columns.len(), 3);
        assert_eq!(satellite.descriptive_columns().count(), 1);
    }

    #[test]
    fn test_nested_names_are_not_classified() {
        let cells = table("h", "h_customer", &[("PK", "h_legacy_id")]);
        let graph = extract(&cells).unwrap();
        assert_eq!(graph.hub_count(), 1);
        assert_eq!(graph.hub(HubId(0)).columns[0].name, "h_legacy_id");
    }

    #[test]
    fn test_row_with_three_cells_is_malformed() {
        let cells = r#"<mxCell id="h" value="h_x" vertex="1" parent="1"/>
<mxCell id="r" vertex="1" parent="h"/>
<mxCell id="a" value="PK" vertex="1" parent="r"/>
<mxCell id="b" value="x_id" vertex="1" parent="r"/>
<mxCell id="c" value="int" vertex="1" parent="r"/>"#;
        let result = extract(cells);
        assert!(matches!(
            result,
            Err(ExtractionError::MalformedShape { ref shape, .. }) if shape == "h_x"
        ));
    }

    #[test]
    fn test_row_without_flag_is_malformed() {
        let cells = table("h", "h_x", &[("x_id", "int")]);
        assert!(matches!(
            extract(&cells),
            Err(ExtractionError::MalformedShape { .. })
        ));
    }

    #[test]
    fn test_connectors() {
        let mut cells = table("h1", "h_customer", &[("PK", "customer_id")]);
        cells.push_str(&table("h2", "h_order", &[("PK", "order_id")]));
        cells.push_str(&table(
            "l",
            "l_customer_order",
            &[("FK", "customer_id"), ("FK", "order_id")],
        ));
        cells.push_str(&table("s", "s_customer_details", &[("PK", "customer_id"), ("", "name")]));
        // Endpoints on rows resolve to the table
        cells.push_str(&edge("e1", "l_r0", "h1_r0", "buyer"));
        cells.push_str(&edge("e2", "h2", "l", ""));
        cells.push_str(&edge("e3", "s", "h1", ""));

        let graph = extract(&cells).unwrap();
        let link = graph.link(LinkId(0));
        assert_eq!(link.references.len(), 2);
        assert_eq!(link.references[0].hub, HubId(0));
        assert_eq!(link.references[0].role.as_deref(), Some("buyer"));
        assert_eq!(link.references[1].role, None);
        assert!(link.columns.iter().all(|c| c.role == ColumnRole::ForeignKey));
        assert_eq!(
            graph.satellite(SatelliteId(0)).parents,
            vec![EntityRef::Hub(HubId(0))]
        );
    }

    #[test]
    fn test_role_from_label_cell() {
        let mut cells = table("h", "h_customer", &[("PK", "customer_id")]);
        cells.push_str(&table("l", "l_x", &[]));
        cells.push_str(&edge("e", "l", "h", ""));
        cells.push_str(r#"<mxCell id="lbl" value="seller" vertex="1" parent="e"/>"#);
        let graph = extract(&cells).unwrap();
        assert_eq!(
            graph.link(LinkId(0)).references[0].role.as_deref(),
            Some("seller")
        );
    }

    #[test]
    fn test_satellite_parent_key_flagged_fk() {
        let mut cells = table("h", "h_customer", &[("PK", "customer_id")]);
        cells.push_str(&table("s", "s_c", &[("PK,FK", "customer_id"), ("", "name")]));
        cells.push_str(&edge("e", "s", "h", ""));
        let graph = extract(&cells).unwrap();
        assert_eq!(
            graph.satellite(SatelliteId(0)).columns[0].role,
            ColumnRole::BusinessKey
        );
    }

    #[test]
    fn test_hub_to_hub_is_stray() {
        let mut cells = table("a", "h_a", &[("PK", "a_id")]);
        cells.push_str(&table("b", "h_b", &[("PK", "b_id")]));
        cells.push_str(&edge("e", "a", "b", ""));
        let graph = extract(&cells).unwrap();
        assert_eq!(graph.stray_connections().len(), 1);
        assert_eq!(graph.stray_connections()[0].source, "h_a");
    }

    #[test]
    fn test_dangling_reference() {
        let mut cells = table("h", "h_a", &[("PK", "a_id")]);
        cells.push_str(&edge("e", "h", "ghost", ""));
        assert_eq!(
            extract(&cells).unwrap_err(),
            ExtractionError::DanglingReference {
                edge_id: "e".to_string(),
                endpoint: "ghost".to_string(),
            }
        );
    }

    #[test]
    fn test_unclassified_participant() {
        let mut cells = table("h", "h_a", &[("PK", "a_id")]);
        cells.push_str(r#"<mxCell id="n" value="customer" vertex="1" parent="1"/>"#);
        cells.push_str(&edge("e", "n", "h", ""));
        assert!(matches!(
            extract(&cells),
            Err(ExtractionError::UnclassifiedParticipant { ref shape, ref peer, .. })
                if shape == "customer" && peer == "h_a"
        ));
    }

    #[test]
    fn test_decoration_is_ignored() {
        let mut cells = table("h", "h_a", &[("PK", "a_id")]);
        cells.push_str(r#"<mxCell id="n1" value="note" vertex="1" parent="1"/>"#);
        cells.push_str(r#"<mxCell id="n2" value="other" vertex="1" parent="1"/>"#);
        cells.push_str(&edge("e", "n1", "n2", ""));
        let graph = extract(&cells).unwrap();
        assert_eq!(graph.hub_count(), 1);
    }

    #[test]
    fn test_dv2_constructs_are_recorded() {
        let mut cells = table("h", "h_a", &[("PK", "a_id")]);
        cells.push_str(&table("p", "pit_a", &[("PK", "a_id"), ("", "snapshot_dts")]));
        cells.push_str(&edge("e", "p", "h", ""));
        let graph = extract(&cells).unwrap();
        assert_eq!(graph.dv2_constructs().len(), 1);
        assert_eq!(graph.dv2_constructs()[0].feature, Dv2Feature::PointInTime);
        assert!(graph.stray_connections().is_empty());
    }
}
