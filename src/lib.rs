//! # xosc-validator
//!
//! Schema-driven validation for OpenSCENARIO documents.
//!
//! The crate loads an XSD-subset schema into an in-memory model and runs a
//! fixed pipeline of validation passes over parsed XML documents, reporting
//! every problem it finds with a category, a message and the path of the
//! offending element.
//!
//! ## Features
//!
//! - Schema loading for an XSD subset (complex types, groups, simple types)
//! - Structural checks: declarations, attributes, allowed children
//! - Occurrence, sequence-order and choice-selection checks
//! - Cross-reference resolution for entities, parameters, variables and
//!   storyboard elements
//! - Domain value checks for times, speeds, distances and probabilities
//! - Name uniqueness within each parent scope
//! - Schema-aware element construction with builder and factory APIs
//!
//! ## Example
//!
//! ```rust,ignore
//! use xosc_validator::schema::SchemaModel;
//! use xosc_validator::validators::ValidationPipeline;
//! use xosc_validator::xml;
//!
//! let schema = SchemaModel::from_file("OpenSCENARIO.xsd")?;
//! let document = xml::read_file("scenario.xosc")?;
//!
//! let outcome = ValidationPipeline::standard().validate(&document, &schema);
//! for issue in &outcome.issues {
//!     eprintln!("[{}] {}", issue.path, issue);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Foundation
pub mod error;
pub mod limits;

// Document and schema representation
pub mod schema;
pub mod tree;
pub mod xml;

// Validation passes
pub mod validators;

// Schema-aware construction
pub mod builder;

// Re-exports for convenience
pub use error::{Error, Result};
pub use validators::{ValidationOutcome, ValidationPipeline};

/// Version of the xosc-validator library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
