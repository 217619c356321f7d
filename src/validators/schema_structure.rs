//! Element, attribute, and child-set checks against the schema

use crate::error::{ErrorCategory, ValidationIssue};
use crate::schema::{ElementDefinition, Resolver, SchemaModel};
use crate::tree::Element;
use crate::validators::helpers;
use crate::validators::pipeline::Validator;

/// Checks every node's tag, attributes, and direct children against the
/// schema definitions.
///
/// An unknown tag short-circuits that node's own checks, but its subtree is
/// still visited so independent defects deeper down are not masked.
#[derive(Debug, Default)]
pub struct SchemaStructureValidator;

impl SchemaStructureValidator {
    /// Create the validator
    pub fn new() -> Self {
        SchemaStructureValidator
    }

    fn walk(
        &self,
        element: &Element,
        path: &str,
        schema: &SchemaModel,
        resolver: &Resolver<'_>,
        issues: &mut Vec<ValidationIssue>,
    ) {
        self.check_node(element, path, schema, resolver, issues);
        for child in &element.children {
            let child_path = helpers::child_path(path, &child.tag);
            self.walk(child, &child_path, schema, resolver, issues);
        }
    }

    fn check_node(
        &self,
        element: &Element,
        path: &str,
        schema: &SchemaModel,
        resolver: &Resolver<'_>,
        issues: &mut Vec<ValidationIssue>,
    ) {
        let Some(def) = schema.element(&element.tag) else {
            issues.push(
                ValidationIssue::new(
                    ErrorCategory::SchemaError,
                    format!(
                        "Unknown element '{}' is not defined in the schema. \
                         Fix: replace '{}' with a valid element name.",
                        element.tag, element.tag
                    ),
                )
                .with_path(path),
            );
            return;
        };

        self.check_attributes(element, def, schema, path, issues);
        self.check_children(element, def, resolver, path, issues);
    }

    fn check_attributes(
        &self,
        element: &Element,
        def: &ElementDefinition,
        schema: &SchemaModel,
        path: &str,
        issues: &mut Vec<ValidationIssue>,
    ) {
        for attr_name in element.attributes.keys() {
            // namespace machinery is not part of any definition
            if attr_name.starts_with("xmlns") || attr_name.contains(':') {
                continue;
            }
            if def.attribute(attr_name).is_none() {
                let valid: Vec<&str> = def.attributes.iter().map(|a| a.name.as_str()).collect();
                issues.push(
                    ValidationIssue::new(
                        ErrorCategory::AttributeError,
                        format!(
                            "Unknown attribute '{}' for element '{}'. \
                             Valid attributes for '{}': {}. \
                             Fix: remove '{}' or replace it with a valid attribute name.",
                            attr_name,
                            element.tag,
                            element.tag,
                            valid.join(", "),
                            attr_name
                        ),
                    )
                    .with_path(path),
                );
            }
        }

        for attr_def in &def.attributes {
            let value = element.attribute(&attr_def.name);
            let blank = value.map(|v| v.trim().is_empty()).unwrap_or(true);

            if attr_def.required && blank {
                issues.push(
                    ValidationIssue::new(
                        ErrorCategory::RequiredAttributeError,
                        format!(
                            "Required attribute '{}' is missing, empty, or contains only \
                             whitespace for element '{}'. Expected type: {}. \
                             Fix: add '{}=\"...\"' to the '{}' element.",
                            attr_def.name,
                            element.tag,
                            attr_def.attr_type,
                            attr_def.name,
                            element.tag
                        ),
                    )
                    .with_path(path),
                );
                continue;
            }

            let Some(value) = value else { continue };
            if value.trim().is_empty() {
                continue;
            }
            // parameter references and expressions are resolved elsewhere
            if helpers::is_parameter_form(value) {
                continue;
            }

            if !helpers::check_value_for_type(value, &attr_def.attr_type) {
                issues.push(
                    ValidationIssue::new(
                        ErrorCategory::TypeError,
                        format!(
                            "Invalid type for attribute '{}' in element '{}': \
                             expected {}, got '{}'. Fix: use {}.",
                            attr_def.name,
                            element.tag,
                            attr_def.attr_type,
                            value,
                            helpers::type_hint(&attr_def.attr_type)
                        ),
                    )
                    .with_path(path),
                );
            }

            if let Some(permitted) = schema.enumeration(&attr_def.name) {
                if !permitted.iter().any(|p| p == value) {
                    issues.push(
                        ValidationIssue::new(
                            ErrorCategory::ValueError,
                            format!(
                                "Invalid value '{}' for attribute '{}' in element '{}'. \
                                 Valid values: {}. \
                                 Fix: replace '{}' with one of the valid values.",
                                value,
                                attr_def.name,
                                element.tag,
                                permitted.join(", "),
                                value
                            ),
                        )
                        .with_path(path),
                    );
                }
            }
        }
    }

    fn check_children(
        &self,
        element: &Element,
        def: &ElementDefinition,
        resolver: &Resolver<'_>,
        path: &str,
        issues: &mut Vec<ValidationIssue>,
    ) {
        if element.children.is_empty() {
            return;
        }

        let valid_children = resolver.allowed_children(&def.children);
        for child in &element.children {
            if !valid_children.iter().any(|v| v == &child.tag) {
                let rendered = if valid_children.is_empty() {
                    "None".to_string()
                } else {
                    valid_children.join(", ")
                };
                issues.push(
                    ValidationIssue::new(
                        ErrorCategory::StructureError,
                        format!(
                            "Child element '{}' is not allowed in '{}'. \
                             Valid child elements for '{}': {}. \
                             Fix: remove '{}' or replace it with a valid child element.",
                            child.tag, element.tag, element.tag, rendered, child.tag
                        ),
                    )
                    .with_path(path),
                );
            }
        }
    }
}

impl Validator for SchemaStructureValidator {
    fn name(&self) -> &'static str {
        "Schema-Structure"
    }

    fn validate(&self, root: &Element, schema: &SchemaModel) -> Vec<ValidationIssue> {
        let resolver = Resolver::new(schema);
        let mut issues = Vec::new();
        self.walk(root, &root.tag, schema, &resolver, &mut issues);
        issues
    }
}
