//! Validator composition and the top-level validation entry point

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::error::{ErrorCategory, ValidationIssue};
use crate::schema::SchemaModel;
use crate::tree::Element;
use crate::validators::datatypes::DataTypeValidator;
use crate::validators::document_structure::DocumentStructureValidator;
use crate::validators::min_occurrence::MinOccurrenceValidator;
use crate::validators::references::ReferenceValidator;
use crate::validators::schema_structure::SchemaStructureValidator;
use crate::validators::sequence_order::SequenceOrderValidator;
use crate::validators::uniqueness::UniquenessValidator;

/// One independent validation pass over a document tree.
///
/// Implementations read the tree and schema and report findings; they
/// never mutate either, so any subset may run in any order without
/// changing results. The pipeline's fixed order exists purely to keep
/// reports deterministic and readable.
pub trait Validator: fmt::Debug {
    /// Short name used in logs and reports
    fn name(&self) -> &'static str;

    /// Run the pass and return every finding, in tree order
    fn validate(&self, root: &Element, schema: &SchemaModel) -> Vec<ValidationIssue>;
}

/// Aggregated result of a full pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct ValidationOutcome {
    /// True when no validator reported anything
    pub is_valid: bool,
    /// Every finding, grouped by validator in registration order
    pub issues: Vec<ValidationIssue>,
}

impl ValidationOutcome {
    fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        ValidationOutcome {
            is_valid: issues.is_empty(),
            issues,
        }
    }

    /// Number of findings in the given category
    pub fn count_for(&self, category: ErrorCategory) -> usize {
        self.issues.iter().filter(|i| i.category == category).count()
    }
}

/// Ordered, explicitly registered collection of validators.
///
/// Registration replaces any runtime discovery: callers either take the
/// standard set or supply their own boxed list. Foundational checks run
/// before derived ones so reports read top-down, but no validator
/// consumes another's output.
#[derive(Debug)]
pub struct ValidationPipeline {
    validators: Vec<Box<dyn Validator>>,
}

impl ValidationPipeline {
    /// The standard seven-stage pipeline, in fixed order
    pub fn standard() -> Self {
        ValidationPipeline {
            validators: vec![
                Box::new(SchemaStructureValidator::new()),
                Box::new(DocumentStructureValidator::new()),
                Box::new(MinOccurrenceValidator::new()),
                Box::new(SequenceOrderValidator::new()),
                Box::new(ReferenceValidator::new()),
                Box::new(DataTypeValidator::new()),
                Box::new(UniquenessValidator::new()),
            ],
        }
    }

    /// A pipeline running exactly the given validators, in the given order
    pub fn with_validators(validators: Vec<Box<dyn Validator>>) -> Self {
        ValidationPipeline { validators }
    }

    /// Registered validator names, in run order
    pub fn names(&self) -> Vec<&'static str> {
        self.validators.iter().map(|v| v.name()).collect()
    }

    /// Run every validator over the tree and concatenate their findings
    pub fn validate(&self, root: &Element, schema: &SchemaModel) -> ValidationOutcome {
        let mut issues = Vec::new();
        for validator in &self.validators {
            let found = validator.validate(root, schema);
            debug!("{} reported {} issue(s)", validator.name(), found.len());
            issues.extend(found);
        }
        ValidationOutcome::from_issues(issues)
    }

    /// The misconfiguration path: no usable schema was loaded
    pub fn validate_without_schema(&self, _root: &Element) -> ValidationOutcome {
        ValidationOutcome::from_issues(vec![ValidationIssue::new(
            ErrorCategory::ConfigurationError,
            "Schema information required for validation. \
             Fix: ensure the schema is properly loaded before validating documents.",
        )])
    }
}

impl Default for ValidationPipeline {
    fn default() -> Self {
        ValidationPipeline::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = r#"<schema>
        <complexType name="DocType">
            <sequence>
                <element name="Item" maxOccurs="unbounded"/>
            </sequence>
        </complexType>
        <element name="Doc" type="DocType"/>
        <complexType name="ItemType">
            <attribute name="name" type="String" use="required"/>
        </complexType>
        <element name="Item" type="ItemType"/>
    </schema>"#;

    fn schema() -> SchemaModel {
        SchemaModel::from_string(SCHEMA).unwrap()
    }

    fn valid_doc() -> Element {
        Element::new("Doc")
            .with_child(Element::new("Item").with_attribute("name", "a"))
            .with_child(Element::new("Item").with_attribute("name", "b"))
    }

    #[test]
    fn test_standard_registration_order() {
        let names = ValidationPipeline::standard().names();
        assert_eq!(
            names,
            vec![
                "Schema-Structure",
                "Document-Structure",
                "Minimum-Occurrence",
                "Sequence-Order",
                "Reference",
                "Data-Type",
                "Uniqueness",
            ]
        );
    }

    #[test]
    fn test_valid_document_passes() {
        let outcome = ValidationPipeline::standard().validate(&valid_doc(), &schema());
        assert!(outcome.is_valid);
        assert!(outcome.issues.is_empty());
    }

    #[test]
    fn test_issues_grouped_by_validator_order() {
        let doc = Element::new("Doc")
            .with_child(Element::new("Item").with_attribute("name", "dup"))
            .with_child(Element::new("Item").with_attribute("name", "dup"))
            .with_child(Element::new("Bogus"));

        let outcome = ValidationPipeline::standard().validate(&doc, &schema());
        assert!(!outcome.is_valid);
        assert_eq!(outcome.issues.len(), 3);
        assert_eq!(outcome.issues[0].category, ErrorCategory::StructureError);
        assert_eq!(outcome.issues[1].category, ErrorCategory::SchemaError);
        assert_eq!(outcome.issues[2].category, ErrorCategory::UniquenessError);
        assert_eq!(outcome.count_for(ErrorCategory::UniquenessError), 1);
    }

    #[test]
    fn test_repeat_runs_are_identical() {
        let doc = Element::new("Doc")
            .with_child(Element::new("Item").with_attribute("name", "dup"))
            .with_child(Element::new("Item").with_attribute("name", "dup"));

        let pipeline = ValidationPipeline::standard();
        let first = pipeline.validate(&doc, &schema());
        let second = pipeline.validate(&doc, &schema());
        assert_eq!(first.issues, second.issues);
    }

    #[test]
    fn test_without_schema_single_configuration_error() {
        let outcome = ValidationPipeline::standard().validate_without_schema(&valid_doc());
        assert!(!outcome.is_valid);
        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(
            outcome.issues[0].category,
            ErrorCategory::ConfigurationError
        );
    }

    #[test]
    fn test_custom_registration() {
        let pipeline = ValidationPipeline::with_validators(vec![
            Box::new(UniquenessValidator::new()),
            Box::new(ReferenceValidator::new()),
        ]);
        assert_eq!(pipeline.names(), vec!["Uniqueness", "Reference"]);

        let doc = Element::new("Doc")
            .with_child(Element::new("Thing").with_attribute("name", "dup"))
            .with_child(Element::new("Thing").with_attribute("name", "dup"))
            .with_child(Element::new("Bogus"));

        // only the registered validators run
        let outcome = pipeline.validate(&doc, &schema());
        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.issues[0].category, ErrorCategory::UniquenessError);
    }
}
