//! Whole-document shape rules

use crate::error::{ErrorCategory, ValidationIssue};
use crate::schema::SchemaModel;
use crate::tree::Element;
use crate::validators::helpers;
use crate::validators::pipeline::Validator;

/// Scenario root spellings recognized by default (the second is legacy)
const SCENARIO_ROOT_TAGS: &[&str] = &["OpenSCENARIO", "OpenScenario"];

/// Header attributes every scenario file must fill in
const SCENARIO_HEADER_ATTRIBUTES: &[&str] = &["revMajor", "revMinor", "date", "description"];

/// Document-level shape rules: a designated root tag must contain a header
/// child carrying a fixed set of descriptive attributes.
///
/// Schema-independent. Roots outside the designated set produce no findings.
/// Defaults target scenario files (`OpenSCENARIO` with a `FileHeader`);
/// other document families configure their own rule set.
#[derive(Debug)]
pub struct DocumentStructureValidator {
    root_tags: Vec<String>,
    header_tag: String,
    header_attributes: Vec<String>,
}

impl Default for DocumentStructureValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStructureValidator {
    /// Validator with the scenario-file rule set
    pub fn new() -> Self {
        DocumentStructureValidator {
            root_tags: SCENARIO_ROOT_TAGS.iter().map(|t| t.to_string()).collect(),
            header_tag: "FileHeader".to_string(),
            header_attributes: SCENARIO_HEADER_ATTRIBUTES
                .iter()
                .map(|a| a.to_string())
                .collect(),
        }
    }

    /// Validator with a custom root/header rule set
    pub fn with_rules(
        root_tags: impl IntoIterator<Item = impl Into<String>>,
        header_tag: impl Into<String>,
        header_attributes: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        DocumentStructureValidator {
            root_tags: root_tags.into_iter().map(Into::into).collect(),
            header_tag: header_tag.into(),
            header_attributes: header_attributes.into_iter().map(Into::into).collect(),
        }
    }

    fn check_root(&self, root: &Element, issues: &mut Vec<ValidationIssue>) {
        let Some(header) = root.child_by_tag(&self.header_tag) else {
            issues.push(
                ValidationIssue::new(
                    ErrorCategory::StructureError,
                    format!(
                        "{} element is required in {}. \
                         Fix: add a {} element as the first child of {}.",
                        self.header_tag, root.tag, self.header_tag, root.tag
                    ),
                )
                .with_path(&root.tag),
            );
            return;
        };

        let header_path = helpers::child_path(&root.tag, &header.tag);
        for attr in &self.header_attributes {
            let missing = header.attribute(attr).map(str::is_empty).unwrap_or(true);
            if missing {
                issues.push(
                    ValidationIssue::new(
                        ErrorCategory::StructureError,
                        format!(
                            "{} is missing required attribute '{}'. \
                             Fix: add '{}' attribute to the {} element.",
                            self.header_tag, attr, attr, self.header_tag
                        ),
                    )
                    .with_path(&header_path),
                );
            }
        }
    }
}

impl Validator for DocumentStructureValidator {
    fn name(&self) -> &'static str {
        "Document-Structure"
    }

    fn validate(&self, root: &Element, _schema: &SchemaModel) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        if self.root_tags.iter().any(|t| t == &root.tag) {
            self.check_root(root, &mut issues);
        }
        issues
    }
}
