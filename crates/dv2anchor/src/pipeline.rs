//! Conversion pipeline
//!
//! Runs every stage in order:
//! XML → Document → Extractor → Validator → Transformer → Layout → Emitter → XML

use tracing::{debug, info, span, Level};

use crate::anchor::{AnchorGraph, AnchorLayoutAlgorithm, AnchorTransformer, DrawioEmitter};
use crate::core::{ConvertConfig, ConvertError, Extractor, LayoutAlgorithm, Renderer};
use crate::drawio::{read_document, write_document, DiagramDocument, GraphModel};
use crate::vault::{ValidatedVault, VaultExtractor, VaultValidator};

/// Pipeline that converts a Data Vault diagram into an Anchor model diagram
///
/// Every stage is built from the same [`ConvertConfig`], so one pipeline
/// value can convert any number of documents with identical results.
pub struct Pipeline {
    config: ConvertConfig,
    extractor: VaultExtractor,
    validator: VaultValidator,
    transformer: AnchorTransformer,
    layout: AnchorLayoutAlgorithm,
    emitter: DrawioEmitter,
}

impl Pipeline {
    /// Create a pipeline with the default configuration
    pub fn new() -> Self {
        Self::with_config(ConvertConfig::default())
    }

    /// Create a pipeline for a specific configuration
    pub fn with_config(config: ConvertConfig) -> Self {
        Self {
            extractor: VaultExtractor::new().with_system_columns(config.system_columns.clone()),
            validator: VaultValidator::new(),
            transformer: AnchorTransformer::new(),
            layout: AnchorLayoutAlgorithm::with_config(config.layout.clone()),
            emitter: DrawioEmitter::with_config(config.styles.clone(), config.layout.clone()),
            config,
        }
    }

    pub fn config(&self) -> &ConvertConfig {
        &self.config
    }

    /// The configured page of `document`
    fn page<'d>(&self, document: &'d DiagramDocument) -> Result<&'d GraphModel, ConvertError> {
        document
            .page(self.config.page)
            .map(|page| &page.model)
            .ok_or(ConvertError::MissingPage {
                index: self.config.page,
                available: document.page_count(),
            })
    }

    /// Extract and validate the Data Vault model of a parsed document
    pub fn check_document(&self, document: &DiagramDocument) -> Result<ValidatedVault, ConvertError> {
        let page = self.page(document)?;

        let extract_span = span!(Level::DEBUG, "pipeline_extract", page = self.config.page);
        let extract_enter = extract_span.enter();
        let graph = self.extractor.extract(page)?;
        debug!(
            extractor = self.extractor.name(),
            hubs = graph.hub_count(),
            links = graph.link_count(),
            satellites = graph.satellite_count(),
            "Extraction completed"
        );
        drop(extract_enter);

        let validate_span = span!(Level::DEBUG, "pipeline_validate");
        let _validate_enter = validate_span.enter();
        Ok(self.validator.validate(graph)?)
    }

    /// Extract and validate the Data Vault model of diagram XML
    pub fn check(&self, xml: &str) -> Result<ValidatedVault, ConvertError> {
        let check_span = span!(Level::INFO, "check_diagram", input_len = xml.len());
        let _enter = check_span.enter();

        let document = read_document(xml)?;
        self.check_document(&document)
    }

    /// Build the Anchor model of diagram XML without laying it out
    pub fn to_anchor_graph(&self, xml: &str) -> Result<AnchorGraph, ConvertError> {
        let vault = self.check(xml)?;
        Ok(self.transformer.transform(&vault))
    }

    /// Convert a parsed document into the Anchor model document
    pub fn convert_document(&self, document: &DiagramDocument) -> Result<DiagramDocument, ConvertError> {
        let vault = self.check_document(document)?;

        let transform_span = span!(Level::DEBUG, "pipeline_transform");
        let transform_enter = transform_span.enter();
        let graph = self.transformer.transform(&vault);
        drop(transform_enter);

        let layout_span = span!(Level::DEBUG, "pipeline_layout");
        let layout_enter = layout_span.enter();
        let positioned = self.layout.layout(&graph);
        debug!(
            layout = self.layout.name(),
            width = positioned.width,
            height = positioned.height,
            "Layout completed"
        );
        drop(layout_enter);

        let render_span = span!(Level::DEBUG, "pipeline_render");
        let _render_enter = render_span.enter();
        let output = self.emitter.render(&positioned);
        debug!(
            renderer = self.emitter.name(),
            format = self.emitter.format(),
            "Rendering completed"
        );
        Ok(output)
    }

    /// Convert Data Vault diagram XML into Anchor model diagram XML
    pub fn process(&self, xml: &str) -> Result<String, ConvertError> {
        let process_span = span!(Level::INFO, "process_diagram", input_len = xml.len());
        let _enter = process_span.enter();

        info!("Starting conversion pipeline");

        let document = read_document(xml)?;
        debug!(pages = document.page_count(), "Document read");

        let output = self.convert_document(&document)?;
        let xml = write_document(&output)?;

        info!(output_len = xml.len(), "Pipeline completed successfully");
        Ok(xml)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}
