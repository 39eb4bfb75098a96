//! Anchor model layout algorithm
//!
//! Places every anchor, attribute and tie as a draw.io table:
//!
//! - anchors stack in one column, sorted by name, one horizontal band each
//! - an anchor's attributes follow to its right, wrapping into further rows
//!   of the band after `max_attributes_per_row`
//! - ties sit in a lane left of the anchor column, centred on their anchors
//!   and pushed down until no two tie bands overlap
//! - a tie's attributes extend leftwards from the tie
//!
//! Bands are disjoint vertically and the lane is disjoint horizontally from
//! the anchor column, so no two shapes intersect.

use tracing::{debug, info, span, trace, Level};
use unicode_width::UnicodeWidthStr;

use super::graph::{AnchorGraph, AnchorId, AttributeId, Owner, TableShape, TieId};
use crate::core::{Bounds, LayoutAlgorithm, LayoutConfig};

/// Left padding of name cells and both paddings of the title
const NAME_PADDING: f64 = 12.0;
const TITLE_PADDING: f64 = 24.0;

/// A table with its position
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedTable {
    pub table: TableShape,
    pub bounds: Bounds,
}

/// Layout result: the anchor graph plus one positioned table per element
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedAnchorGraph {
    pub graph: AnchorGraph,
    anchors: Vec<PositionedTable>,
    attributes: Vec<PositionedTable>,
    ties: Vec<PositionedTable>,
    pub width: f64,
    pub height: f64,
}

impl PositionedAnchorGraph {
    pub fn anchor(&self, id: AnchorId) -> &PositionedTable {
        &self.anchors[id.0]
    }

    pub fn attribute(&self, id: AttributeId) -> &PositionedTable {
        &self.attributes[id.0]
    }

    pub fn tie(&self, id: TieId) -> &PositionedTable {
        &self.ties[id.0]
    }

    /// Every positioned table: anchors, then attributes, then ties
    pub fn tables(&self) -> impl Iterator<Item = &PositionedTable> {
        self.anchors
            .iter()
            .chain(self.attributes.iter())
            .chain(self.ties.iter())
    }
}

/// Rows of attributes placed next to a lead shape
struct Band {
    /// Per attribute: distance from the band origin and from the band top
    offsets: Vec<(f64, f64)>,
    /// Horizontal extent of the widest attribute row
    extent: f64,
    height: f64,
}

/// Anchor model layout algorithm
pub struct AnchorLayoutAlgorithm {
    config: LayoutConfig,
}

impl AnchorLayoutAlgorithm {
    pub fn new() -> Self {
        Self::with_config(LayoutConfig::default())
    }

    pub fn with_config(config: LayoutConfig) -> Self {
        Self { config }
    }

    /// Size of a table from its text
    fn table_size(&self, table: &TableShape) -> (f64, f64) {
        let c = &self.config;
        let title = UnicodeWidthStr::width(table.title.as_str()) as f64 * c.char_width + TITLE_PADDING;
        let widest_row = table
            .rows
            .iter()
            .map(|row| UnicodeWidthStr::width(row.text.as_str()))
            .max()
            .unwrap_or(0) as f64;
        let rows = c.flag_width + widest_row * c.char_width + NAME_PADDING;
        let width = c.min_width.max(title).max(rows);
        // Whole tens keep the drawing on the draw.io grid
        let width = (width / 10.0).ceil() * 10.0;
        let height = c.header_height + table.rows.len() as f64 * c.row_height;
        (width, height)
    }

    fn band(&self, lead_height: f64, items: &[(f64, f64)]) -> Band {
        let gap = self.config.horizontal_gap;
        let per_row = self.config.max_attributes_per_row.max(1);

        let mut offsets = Vec::with_capacity(items.len());
        let mut extent: f64 = 0.0;
        let mut height = lead_height;
        for (row, chunk) in items.chunks(per_row).enumerate() {
            let top = if row == 0 { 0.0 } else { height + gap };
            let row_height = chunk.iter().map(|(_, h)| *h).fold(0.0, f64::max);
            let mut dx = 0.0;
            for (w, _) in chunk {
                offsets.push((dx, top));
                dx += w + gap;
            }
            extent = extent.max(dx - gap);
            height = height.max(top + row_height);
        }
        Band {
            offsets,
            extent,
            height,
        }
    }
}

impl Default for AnchorLayoutAlgorithm {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutAlgorithm<AnchorGraph> for AnchorLayoutAlgorithm {
    type Output = PositionedAnchorGraph;

    fn layout(&self, graph: &AnchorGraph) -> PositionedAnchorGraph {
        let layout_span = span!(
            Level::INFO,
            "layout_anchor",
            anchors = graph.anchor_count(),
            attributes = graph.attribute_count(),
            ties = graph.tie_count()
        );
        let _enter = layout_span.enter();
        let c = &self.config;

        let size_span = span!(Level::DEBUG, "calculate_table_sizes");
        let size_enter = size_span.enter();
        let anchor_tables: Vec<TableShape> =
            graph.anchors().map(|(id, _)| graph.anchor_table(id)).collect();
        let attribute_tables: Vec<TableShape> = graph
            .attributes()
            .map(|(id, _)| graph.attribute_table(id))
            .collect();
        let tie_tables: Vec<TableShape> = graph.ties().map(|(id, _)| graph.tie_table(id)).collect();

        let anchor_sizes: Vec<(f64, f64)> = anchor_tables.iter().map(|t| self.table_size(t)).collect();
        let attribute_sizes: Vec<(f64, f64)> =
            attribute_tables.iter().map(|t| self.table_size(t)).collect();
        let tie_sizes: Vec<(f64, f64)> = tie_tables.iter().map(|t| self.table_size(t)).collect();
        drop(size_enter);
        debug!(tables = anchor_sizes.len() + attribute_sizes.len() + tie_sizes.len(), "Calculated table sizes");

        let mut anchor_bounds = vec![Bounds::default(); anchor_sizes.len()];
        let mut attribute_bounds = vec![Bounds::default(); attribute_sizes.len()];
        let mut tie_bounds = vec![Bounds::default(); tie_sizes.len()];

        let band_items = |owner: Owner| -> (Vec<AttributeId>, Vec<(f64, f64)>) {
            let ids = graph.attributes_of(owner);
            let sizes = ids.iter().map(|id| attribute_sizes[id.0]).collect();
            (ids, sizes)
        };

        // Tie bands first: their width decides where the anchor column starts
        let tie_bands: Vec<(Vec<AttributeId>, Band)> = graph
            .ties()
            .map(|(id, _)| {
                let (ids, sizes) = band_items(Owner::Tie(id));
                let band = self.band(tie_sizes[id.0].1, &sizes);
                (ids, band)
            })
            .collect();
        let lane_width = tie_bands
            .iter()
            .zip(&tie_sizes)
            .map(|((ids, band), (w, _))| {
                if ids.is_empty() {
                    *w
                } else {
                    w + c.horizontal_gap + band.extent
                }
            })
            .fold(0.0, f64::max);
        let anchor_x = if tie_sizes.is_empty() {
            c.margin
        } else {
            c.margin + lane_width + c.lane_gap
        };

        // Anchor column, one band per anchor in name order
        let mut order: Vec<AnchorId> = graph.anchors().map(|(id, _)| id).collect();
        order.sort_by(|a, b| graph.anchor(*a).name.cmp(&graph.anchor(*b).name));

        let mut y = c.margin;
        for id in order {
            let (w, h) = anchor_sizes[id.0];
            anchor_bounds[id.0] = Bounds::new(anchor_x, y, w, h);

            let (ids, sizes) = band_items(Owner::Anchor(id));
            let band = self.band(h, &sizes);
            let origin = anchor_x + w + c.horizontal_gap;
            for ((attr, (dx, dy)), (aw, ah)) in ids.iter().zip(&band.offsets).zip(&sizes) {
                attribute_bounds[attr.0] = Bounds::new(origin + dx, y + dy, *aw, *ah);
            }
            trace!(anchor = %graph.anchor(id).name, y, band_height = band.height, "Placed anchor band");
            y += band.height + c.vertical_gap;
        }

        // Tie lane: centre on the anchors, sweep down to stay disjoint
        let tie_right = anchor_x - c.lane_gap;
        let mut desired: Vec<(f64, TieId)> = graph
            .ties()
            .map(|(id, tie)| {
                let centres: Vec<f64> = tie
                    .ends
                    .iter()
                    .map(|end| anchor_bounds[end.anchor.0].center_y())
                    .collect();
                let centre = if centres.is_empty() {
                    c.margin
                } else {
                    centres.iter().sum::<f64>() / centres.len() as f64
                };
                let top = centre - tie_sizes[id.0].1 / 2.0;
                ((top / 10.0).round() * 10.0, id)
            })
            .collect();
        desired.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let mut next_free = c.margin;
        for (top, id) in desired {
            let (w, h) = tie_sizes[id.0];
            let ty = top.max(next_free);
            let tx = tie_right - w;
            tie_bounds[id.0] = Bounds::new(tx, ty, w, h);

            let (ids, band) = &tie_bands[id.0];
            for (attr, (dx, dy)) in ids.iter().zip(&band.offsets) {
                let (aw, ah) = attribute_sizes[attr.0];
                attribute_bounds[attr.0] =
                    Bounds::new(tx - c.horizontal_gap - dx - aw, ty + dy, aw, ah);
            }
            trace!(tie = %graph.tie(id).name, y = ty, "Placed tie band");
            next_free = ty + band.height + c.horizontal_gap;
        }

        let all = anchor_bounds
            .iter()
            .chain(&attribute_bounds)
            .chain(&tie_bounds);
        let (width, height) = all.fold((0.0_f64, 0.0_f64), |(w, h), b| {
            (w.max(b.right()), h.max(b.bottom()))
        });

        let position = |tables: Vec<TableShape>, bounds: Vec<Bounds>| -> Vec<PositionedTable> {
            tables
                .into_iter()
                .zip(bounds)
                .map(|(table, bounds)| PositionedTable { table, bounds })
                .collect()
        };

        info!(width, height, "Layout completed");
        PositionedAnchorGraph {
            graph: graph.clone(),
            anchors: position(anchor_tables, anchor_bounds),
            attributes: position(attribute_tables, attribute_bounds),
            ties: position(tie_tables, tie_bounds),
            width: width + c.margin,
            height: height + c.margin,
        }
    }

    fn name(&self) -> &'static str {
        "anchor"
    }

    fn version(&self) -> &'static str {
        "1.0.0"
    }
}
