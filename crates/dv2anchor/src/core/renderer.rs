//! Core renderer trait for diagram output
//!
//! This trait defines the interface for turning a positioned model into
//! an output representation.

/// Core trait for diagram renderers
pub trait Renderer<I>: Send + Sync {
    /// The output type of this renderer
    type Output;

    /// Render the positioned input
    fn render(&self, input: &I) -> Self::Output;

    /// Get the name of this renderer
    fn name(&self) -> &'static str;

    /// Get the version of this renderer
    fn version(&self) -> &'static str;

    /// Get the supported output format
    fn format(&self) -> &'static str;
}
