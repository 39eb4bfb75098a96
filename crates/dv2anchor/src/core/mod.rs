//! Core abstractions for the conversion pipeline
//!
//! This module defines the stage traits, the shared column model, errors,
//! configuration, and logging setup.

pub mod chumsky_utils;
pub mod config;
mod error;
mod extractor;
mod layout;
pub mod logging;
mod renderer;
mod types;

pub use config::*;
pub use error::*;
pub use extractor::*;
pub use layout::*;
pub use logging::*;
pub use renderer::*;
pub use types::*;
