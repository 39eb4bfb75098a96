//! draw.io document model
//!
//! Reading, writing and inspecting mxGraph XML. Pure data: nothing in here
//! knows about Data Vault or Anchor modeling.

mod document;
mod label;
mod reader;
mod writer;

pub use document::*;
pub use label::{html_label, label_lines, label_title};
pub use reader::read_document;
pub use writer::write_document;
