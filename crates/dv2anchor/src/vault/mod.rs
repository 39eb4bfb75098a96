//! Data Vault model
//!
//! Extraction of hubs, links and satellites from a draw.io page, and the
//! structural rules they must satisfy before conversion.

mod classify;
pub mod columns;
mod extractor;
mod graph;
mod validator;

pub use classify::{Dv2Feature, ShapeKind};
pub use columns::{ColumnLineParser, ParsedColumn};
pub use extractor::VaultExtractor;
pub use graph::*;
pub use validator::{ValidatedVault, VaultValidator};
