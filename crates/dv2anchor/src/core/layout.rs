//! Core layout trait for diagram positioning
//!
//! This trait defines the interface for arranging model elements in the
//! draw.io coordinate system.

/// Core trait for layout algorithms
///
/// A layout algorithm takes a finished model graph and returns a new,
/// positioned value. It never fails: every well-formed graph has a layout.
pub trait LayoutAlgorithm<G>: Send + Sync {
    /// The output type of this layout algorithm
    type Output;

    /// Arrange the elements of `graph`
    fn layout(&self, graph: &G) -> Self::Output;

    /// Get the name of this layout algorithm
    fn name(&self) -> &'static str;

    /// Get the version of this layout algorithm
    fn version(&self) -> &'static str;
}
