//! Core error types for the conversion pipeline
//!
//! Every stage has its own error type so callers can tell a broken XML file
//! from a model the converter refuses. `ConvertError` wraps them all.

use std::fmt;

use thiserror::Error;

use crate::vault::{Dv2Feature, ShapeKind};

/// Failures while reading or writing draw.io XML
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Attribute error: {0}")]
    Attr(#[from] quick_xml::events::attributes::AttrError),

    #[error("Encoding error: {0}")]
    Encoding(#[from] quick_xml::encoding::EncodingError),

    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("Missing required attribute: {0}")]
    MissingAttr(&'static str),

    #[error("Invalid number for {field}: {value}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("Unexpected structure: {0}")]
    Structure(String),

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures while building the Data Vault graph from a page
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("Malformed shape '{shape}' (cell {cell_id}): {reason}")]
    MalformedShape {
        cell_id: String,
        shape: String,
        reason: String,
    },

    #[error("Dangling reference: connector {edge_id} points to missing cell '{endpoint}'")]
    DanglingReference { edge_id: String, endpoint: String },

    #[error(
        "Unclassified participant: connector {edge_id} joins '{shape}' (cell {cell_id}) to '{peer}', \
         but '{shape}' has no h_/l_/s_ prefix"
    )]
    UnclassifiedParticipant {
        edge_id: String,
        cell_id: String,
        shape: String,
        peer: String,
    },
}

impl ExtractionError {
    pub fn malformed(cell_id: &str, shape: &str, reason: impl Into<String>) -> Self {
        Self::MalformedShape {
            cell_id: cell_id.to_string(),
            shape: shape.to_string(),
            reason: reason.into(),
        }
    }
}

/// A single Data Vault rule broken by the input model
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    #[error("{kind} '{name}' must be named with the '{expected}' prefix")]
    PrefixViolation {
        kind: ShapeKind,
        name: String,
        expected: &'static str,
    },

    #[error("link '{link}' must reference at least two hubs (or one hub twice with distinct roles), found {references} reference(s)")]
    LinkArity { link: String, references: usize },

    #[error("link '{link}' carries column '{column}' that no referenced hub provides; transactional links are unsupported")]
    TransactionalLinkUnsupported { link: String, column: String },

    #[error("'{entity}' declares a foreign key ({reference}); foreign keys are unsupported")]
    ForeignKeyUnsupported { entity: String, reference: String },

    #[error("'{name}' is a Data Vault 2.0 construct ({feature}); DV 2.0 features are unsupported")]
    Dv2FeatureUnsupported { name: String, feature: Dv2Feature },

    #[error("satellite '{satellite}' must have exactly one parent hub or link, found {parents}")]
    SatelliteParent { satellite: String, parents: usize },

    #[error("hub '{hub}' has no business key column")]
    MissingBusinessKey { hub: String },
}

/// Every violation found in one validation run
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    violations: Vec<Violation>,
}

impl ValidationError {
    pub fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Validation failed with {} violation(s):",
            self.violations.len()
        )?;
        for violation in &self.violations {
            write!(f, "\n  - {}", violation)?;
        }
        Ok(())
    }
}

/// Top-level error of a conversion run
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Page {index} not found: document has {available} page(s)")]
    MissingPage { index: usize, available: usize },

    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}
