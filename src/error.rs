//! Error types for xosc-validator
//!
//! Two planes of failure are kept apart: `Error` covers fatal conditions
//! (unreadable files, malformed markup, limit violations), while
//! `ValidationIssue` carries the categorized findings that document
//! validation accumulates without ever aborting.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Result type alias using the crate-wide Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for fatal operations
#[derive(Error, Debug)]
pub enum Error {
    /// Markup parsing/building error
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Schema misuse outside validation (builder/factory in strict mode)
    #[error("schema error: {0}")]
    Schema(String),

    /// Limit exceeded error
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON conversion error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Markup parsing error with source context
#[derive(Debug, Clone)]
pub struct ParseError {
    /// Error message
    pub message: String,
    /// Location in the input (file, byte offset)
    pub location: Option<String>,
    /// Offending source snippet
    pub source: Option<String>,
}

impl ParseError {
    /// Create a new parse error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
            source: None,
        }
    }

    /// Set the location
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set the source snippet
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(ref loc) = self.location {
            write!(f, "\n\nLocation: {}", loc)?;
        }

        if let Some(ref src) = self.source {
            write!(f, "\n\nSource:\n{}", src)?;
        }

        Ok(())
    }
}

impl std::error::Error for ParseError {}

/// Category tag carried by every validation finding.
///
/// The rendered labels are stable; downstream tooling matches on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    /// Unknown element tag
    SchemaError,
    /// Unknown attribute on a known element
    AttributeError,
    /// Required attribute missing or blank
    RequiredAttributeError,
    /// Attribute value fails its declared type
    TypeError,
    /// Attribute value outside its enumeration
    ValueError,
    /// Disallowed child or missing document-level requirement
    StructureError,
    /// Minimum/choice occurrence violation
    OccurrenceError,
    /// Child out of declared sequence order
    SequenceOrderError,
    /// Unresolvable entity/parameter/variable/storyboard/signal reference
    ReferenceError,
    /// Domain rule violation (range constraints on numeric attributes)
    DataTypeError,
    /// Duplicate sibling name
    UniquenessError,
    /// Validation invoked without a usable schema
    ConfigurationError,
}

impl ErrorCategory {
    /// The stable label used in rendered messages
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::SchemaError => "SCHEMA_ERROR",
            ErrorCategory::AttributeError => "ATTRIBUTE_ERROR",
            ErrorCategory::RequiredAttributeError => "REQUIRED_ATTRIBUTE_ERROR",
            ErrorCategory::TypeError => "TYPE_ERROR",
            ErrorCategory::ValueError => "VALUE_ERROR",
            ErrorCategory::StructureError => "STRUCTURE_ERROR",
            ErrorCategory::OccurrenceError => "OCCURRENCE_ERROR",
            ErrorCategory::SequenceOrderError => "SEQUENCE_ORDER_ERROR",
            ErrorCategory::ReferenceError => "REFERENCE_ERROR",
            ErrorCategory::DataTypeError => "DATA_TYPE_ERROR",
            ErrorCategory::UniquenessError => "UNIQUENESS_ERROR",
            ErrorCategory::ConfigurationError => "CONFIGURATION_ERROR",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One categorized validation finding.
///
/// Findings are data, not exceptions: validators return ordered lists of
/// these and never abort on a malformed document. Messages are
/// self-contained (offending element/attribute, path, remedy); `path` is
/// additionally kept as a structured field for tooling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// Taxonomy category
    pub category: ErrorCategory,
    /// Human-readable description with remedy
    pub message: String,
    /// Slash-joined tag path from the document root (empty at the root)
    pub path: String,
}

impl ValidationIssue {
    /// Create a new finding with an empty path
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            path: String::new(),
        }
    }

    /// Set the element path
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.category, self.message)
    }
}
