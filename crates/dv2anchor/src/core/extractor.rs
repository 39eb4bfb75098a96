//! Core extractor trait for model recovery
//!
//! This trait defines the interface for reading a typed model out of a
//! diagram page.

/// Core trait for model extractors
///
/// An extractor reads one page of a diagram document and builds a typed
/// model graph from it. It is pure: the page is only borrowed.
pub trait Extractor<P>: Send + Sync {
    /// The model produced by this extractor
    type Model;

    /// The failure reported when the page cannot be read as a model
    type Error;

    /// Build the model from `page`
    fn extract(&self, page: &P) -> Result<Self::Model, Self::Error>;

    /// Get the name of this extractor
    fn name(&self) -> &'static str;

    /// Get the version of this extractor
    fn version(&self) -> &'static str;
}
