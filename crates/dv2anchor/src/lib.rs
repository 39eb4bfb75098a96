//! dv2anchor - Convert Data Vault draw.io diagrams into Anchor model diagrams
//!
//! A library for reading a Data Vault model drawn in draw.io (hubs, links
//! and satellites as tables), checking it against the Data Vault rules, and
//! drawing the equivalent Anchor model (anchors, attributes and ties) as a
//! new draw.io document.
//!
//! # Quick Start
//!
//! ```rust
//! use dv2anchor::convert;
//!
//! let input = r#"<mxGraphModel><root>
//!   <mxCell id="0"/>
//!   <mxCell id="1" parent="0"/>
//!   <mxCell id="2" value="h_customer&lt;br&gt;PK customer_id" vertex="1" parent="1"/>
//! </root></mxGraphModel>"#;
//! let xml = convert(input).unwrap();
//! assert!(xml.contains("a_customer"));
//! ```
//!
//! # Advanced Usage
//!
//! For more control, run the individual stages:
//!
//! ```rust
//! use dv2anchor::prelude::*;
//!
//! let input = r#"<mxGraphModel><root>
//!   <mxCell id="0"/>
//!   <mxCell id="1" parent="0"/>
//!   <mxCell id="2" value="h_order&lt;br&gt;PK order_id" vertex="1" parent="1"/>
//! </root></mxGraphModel>"#;
//!
//! // Read the document and extract the Data Vault graph
//! let document = read_document(input).unwrap();
//! let vault = VaultExtractor::new().extract(&document.pages[0].model).unwrap();
//! assert_eq!(vault.hub_count(), 1);
//!
//! // Validate, transform, lay out and emit
//! let validated = VaultValidator::new().validate(vault).unwrap();
//! let anchors = AnchorTransformer::new().transform(&validated);
//! let positioned = AnchorLayoutAlgorithm::new().layout(&anchors);
//! let output = DrawioEmitter::new().render(&positioned);
//! assert_eq!(output.page_count(), 1);
//! ```

pub mod anchor;
pub mod core;
pub mod drawio;
pub mod pipeline;
pub mod vault;

pub use core::*;
pub use pipeline::Pipeline;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::anchor::{
        AnchorGraph, AnchorLayoutAlgorithm, AnchorTransformer, DrawioEmitter,
        PositionedAnchorGraph,
    };
    pub use crate::core::{
        Column, ColumnRole, ConvertConfig, ConvertError, Extractor, LayoutAlgorithm, Renderer,
        SystemKind,
    };
    pub use crate::drawio::{read_document, write_document, DiagramDocument};
    pub use crate::pipeline::Pipeline;
    pub use crate::vault::{ValidatedVault, VaultExtractor, VaultGraph, VaultValidator};
}

/// Convert Data Vault diagram XML into Anchor model diagram XML
///
/// Uses the default configuration: first page, default system columns,
/// layout and styles.
///
/// # Returns
/// * `Ok(String)` - The Anchor model diagram XML
/// * `Err` - If the input cannot be read, extracted or validated
pub fn convert(xml: &str) -> Result<String, ConvertError> {
    Pipeline::new().process(xml)
}

/// Convert Data Vault diagram XML with a specific configuration
///
/// # Example
/// ```rust
/// use dv2anchor::{convert_with_config, ConvertConfig, ConvertError};
///
/// let config = ConvertConfig {
///     page: 1,
///     ..ConvertConfig::default()
/// };
/// let result = convert_with_config("<mxGraphModel><root/></mxGraphModel>", &config);
/// assert!(matches!(result, Err(ConvertError::MissingPage { index: 1, .. })));
/// ```
pub fn convert_with_config(xml: &str, config: &ConvertConfig) -> Result<String, ConvertError> {
    Pipeline::with_config(config.clone()).process(xml)
}

/// Extract and validate a Data Vault diagram without converting it
///
/// # Example
/// ```rust
/// use dv2anchor::check;
///
/// let input = r#"<mxGraphModel><root>
///   <mxCell id="0"/>
///   <mxCell id="1" parent="0"/>
///   <mxCell id="2" value="customer&lt;br&gt;PK customer_id" vertex="1" parent="1"/>
/// </root></mxGraphModel>"#;
/// // No h_/l_/s_ prefix: nothing to convert, nothing to reject
/// let vault = check(input).unwrap();
/// assert_eq!(vault.hub_count(), 0);
/// ```
pub fn check(xml: &str) -> Result<vault::ValidatedVault, ConvertError> {
    Pipeline::new().check(xml)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CUSTOMER: &str = r#"<mxGraphModel><root>
        <mxCell id="0"/>
        <mxCell id="1" parent="0"/>
        <mxCell id="2" value="h_customer&lt;br&gt;PK customer_id" vertex="1" parent="1"/>
        <mxCell id="3" value="s_customer_details&lt;br&gt;PK customer_id&lt;br&gt;name&lt;br&gt;load_dttm" vertex="1" parent="1"/>
        <mxCell id="4" edge="1" parent="1" source="3" target="2"/>
    </root></mxGraphModel>"#;

    #[test]
    fn test_convert() {
        let output = convert(CUSTOMER).unwrap();
        assert!(output.contains("id=\"a_customer\""));
        assert!(output.contains("id=\"r_customer_details_name\""));
    }

    #[test]
    fn test_convert_with_config_styles() {
        let mut config = ConvertConfig::default();
        config.styles.anchor = "shape=table;fillColor=#000000;".to_string();
        let output = convert_with_config(CUSTOMER, &config).unwrap();
        assert!(output.contains("fillColor=#000000"));
    }

    #[test]
    fn test_check() {
        let vault = check(CUSTOMER).unwrap();
        assert_eq!(vault.hub_count(), 1);
        assert_eq!(vault.satellite_count(), 1);
    }
}
