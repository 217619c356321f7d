//! Document validation passes
//!
//! Seven independent validators, composed by [`pipeline::ValidationPipeline`]
//! in a fixed order: schema structure, document structure, minimum
//! occurrence, sequence order, references, data-type domains, name
//! uniqueness. Each pass walks the full tree on its own and returns its
//! findings as [`crate::error::ValidationIssue`] values.

pub mod datatypes;
pub mod document_structure;
pub mod helpers;
pub mod min_occurrence;
pub mod pipeline;
pub mod references;
pub mod schema_structure;
pub mod sequence_order;
pub mod uniqueness;

pub use datatypes::DataTypeValidator;
pub use document_structure::DocumentStructureValidator;
pub use min_occurrence::MinOccurrenceValidator;
pub use pipeline::{ValidationOutcome, ValidationPipeline, Validator};
pub use references::ReferenceValidator;
pub use schema_structure::SchemaStructureValidator;
pub use sequence_order::SequenceOrderValidator;
pub use uniqueness::UniquenessValidator;
