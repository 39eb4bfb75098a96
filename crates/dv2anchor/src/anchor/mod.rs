//! Anchor model
//!
//! Transformation of a validated Data Vault graph into anchors, attributes
//! and ties, their layout, and their emission as a draw.io document.

mod emitter;
mod graph;
mod layout;
mod transformer;

pub use emitter::DrawioEmitter;
pub use graph::*;
pub use layout::{AnchorLayoutAlgorithm, PositionedAnchorGraph, PositionedTable};
pub use transformer::AnchorTransformer;
