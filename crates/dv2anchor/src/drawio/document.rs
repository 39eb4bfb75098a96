//! In-memory draw.io document model
//!
//! A thin, order-preserving mirror of the mxGraph XML: files hold pages,
//! pages hold one graph model, the model holds a flat list of cells linked
//! by `parent` ids. Nothing here knows about Data Vault or Anchor modeling.

use std::collections::HashMap;

/// A draw.io file (`<mxfile>`)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiagramDocument {
    /// Attributes of the `<mxfile>` element, in document order
    pub attributes: Vec<(String, String)>,
    /// Pages (`<diagram>` elements)
    pub pages: Vec<Page>,
}

impl DiagramDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// One page (`<diagram>`) of a draw.io file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub id: Option<String>,
    pub name: Option<String>,
    pub model: GraphModel,
}

/// The `<mxGraphModel>` of a page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphModel {
    /// Attributes of the `<mxGraphModel>` element, in document order
    pub attributes: Vec<(String, String)>,
    /// Cells in document order
    pub cells: Vec<Cell>,
}

impl GraphModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    pub fn add_cell(&mut self, cell: Cell) {
        self.cells.push(cell);
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Build a lookup index over the cells
    pub fn index(&self) -> CellIndex<'_> {
        CellIndex::new(self)
    }
}

/// An `<mxCell>` (vertex, edge, layer or root)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cell {
    pub id: String,
    pub parent: Option<String>,
    pub value: Option<String>,
    pub style: Option<String>,
    pub vertex: bool,
    pub edge: bool,
    pub source: Option<String>,
    pub target: Option<String>,
    /// Attributes without a dedicated field, in document order
    pub extra: Vec<(String, String)>,
    pub geometry: Option<Geometry>,
}

impl Cell {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// A vertex cell with a label and style
    pub fn vertex(
        id: impl Into<String>,
        parent: impl Into<String>,
        value: impl Into<String>,
        style: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            parent: Some(parent.into()),
            value: Some(value.into()),
            style: Some(style.into()),
            vertex: true,
            ..Self::default()
        }
    }

    /// An edge cell connecting `source` to `target`
    pub fn edge(
        id: impl Into<String>,
        parent: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        style: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            parent: Some(parent.into()),
            value: Some(String::new()),
            style: Some(style.into()),
            edge: true,
            source: Some(source.into()),
            target: Some(target.into()),
            ..Self::default()
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = Some(geometry);
        self
    }

    /// Label text, empty when absent
    pub fn label(&self) -> &str {
        self.value.as_deref().unwrap_or("")
    }
}

/// An `<mxGeometry>`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geometry {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub relative: bool,
    /// Width and height of the nested `<mxRectangle as="alternateBounds">`
    pub alternate_bounds: Option<(f64, f64)>,
}

impl Geometry {
    /// Absolute geometry with position and size
    pub fn rect(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            width: Some(width),
            height: Some(height),
            ..Self::default()
        }
    }

    /// Relative geometry used by edges
    pub fn relative() -> Self {
        Self {
            relative: true,
            ..Self::default()
        }
    }

    pub fn with_alternate_bounds(mut self, width: f64, height: f64) -> Self {
        self.alternate_bounds = Some((width, height));
        self
    }
}

/// Read-only lookup structure over a graph model
///
/// Children are kept in document order, which is the order the extractor
/// reads rows and connectors in.
pub struct CellIndex<'a> {
    cells: &'a [Cell],
    by_id: HashMap<&'a str, usize>,
    children: HashMap<&'a str, Vec<usize>>,
}

impl<'a> CellIndex<'a> {
    pub fn new(model: &'a GraphModel) -> Self {
        let mut by_id = HashMap::new();
        let mut children: HashMap<&'a str, Vec<usize>> = HashMap::new();
        for (idx, cell) in model.cells.iter().enumerate() {
            by_id.insert(cell.id.as_str(), idx);
            if let Some(parent) = cell.parent.as_deref() {
                children.entry(parent).or_default().push(idx);
            }
        }
        Self {
            cells: &model.cells,
            by_id,
            children,
        }
    }

    pub fn get(&self, id: &str) -> Option<&'a Cell> {
        self.by_id.get(id).map(|&idx| &self.cells[idx])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Direct children of `id`, in document order
    pub fn children(&self, id: &str) -> Vec<&'a Cell> {
        self.children
            .get(id)
            .map(|indices| indices.iter().map(|&idx| &self.cells[idx]).collect())
            .unwrap_or_default()
    }

    /// Direct vertex children of `id`, in document order
    pub fn vertex_children(&self, id: &str) -> Vec<&'a Cell> {
        self.children(id)
            .into_iter()
            .filter(|cell| cell.vertex)
            .collect()
    }

    pub fn parent(&self, cell: &Cell) -> Option<&'a Cell> {
        cell.parent.as_deref().and_then(|id| self.get(id))
    }

    /// Ancestors of `cell`, nearest first. Stops on cycles.
    pub fn ancestors(&self, cell: &Cell) -> Vec<&'a Cell> {
        let mut out: Vec<&'a Cell> = Vec::new();
        let mut current = self.parent(cell);
        while let Some(ancestor) = current {
            if ancestor.id == cell.id || out.iter().any(|seen| seen.id == ancestor.id) {
                break;
            }
            out.push(ancestor);
            current = self.parent(ancestor);
        }
        out
    }

    /// True when the cell sits directly on an edge (an edge label)
    pub fn is_edge_label(&self, cell: &Cell) -> bool {
        self.parent(cell).is_some_and(|parent| parent.edge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> GraphModel {
        let mut model = GraphModel::new();
        model.add_cell(Cell::new("0"));
        model.add_cell(Cell::new("1").with_parent("0"));
        model.add_cell(Cell::vertex("t", "1", "h_customer", "shape=table;"));
        model.add_cell(Cell::vertex("r1", "t", "", "shape=tableRow;"));
        model.add_cell(Cell::vertex("r2", "t", "", "shape=tableRow;"));
        model.add_cell(Cell::edge("e", "1", "r1", "t", ""));
        model.add_cell(Cell::vertex("lbl", "e", "buyer", "edgeLabel;"));
        model
    }

    #[test]
    fn test_index_lookup() {
        let model = sample();
        let index = model.index();
        assert!(index.contains("t"));
        assert!(!index.contains("missing"));
        assert_eq!(index.get("t").map(|c| c.label()), Some("h_customer"));
    }

    #[test]
    fn test_children_keep_document_order() {
        let model = sample();
        let index = model.index();
        let rows: Vec<_> = index.vertex_children("t").iter().map(|c| c.id.clone()).collect();
        assert_eq!(rows, vec!["r1", "r2"]);
    }

    #[test]
    fn test_ancestors_nearest_first() {
        let model = sample();
        let index = model.index();
        let row = index.get("r1").unwrap();
        let ids: Vec<_> = index.ancestors(row).iter().map(|c| c.id.clone()).collect();
        assert_eq!(ids, vec!["t", "1", "0"]);
    }

    #[test]
    fn test_edge_label_detection() {
        let model = sample();
        let index = model.index();
        assert!(index.is_edge_label(index.get("lbl").unwrap()));
        assert!(!index.is_edge_label(index.get("t").unwrap()));
    }
}
