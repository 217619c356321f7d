//! Declared-order checks for sequence content models

use std::collections::HashMap;

use crate::error::{ErrorCategory, ValidationIssue};
use crate::schema::{Resolver, SchemaModel, SequenceSlot};
use crate::tree::Element;
use crate::validators::helpers;
use crate::validators::pipeline::Validator;

/// Checks that children of sequence-model elements appear in declared
/// order, using a greedy cursor over the flattened slot list.
///
/// All alternatives of a choice slot share one position, so they are
/// interchangeable there. Tags not present in the flattened sequence are
/// ignored; the structure checks report those. A violation does not move
/// the cursor, so one misplaced element cannot cascade into errors on
/// every correctly placed element after it.
#[derive(Debug, Default)]
pub struct SequenceOrderValidator;

impl SequenceOrderValidator {
    /// Create the validator
    pub fn new() -> Self {
        SequenceOrderValidator
    }

    fn walk(
        &self,
        element: &Element,
        path: &str,
        schema: &SchemaModel,
        resolver: &Resolver<'_>,
        issues: &mut Vec<ValidationIssue>,
    ) {
        let current = helpers::child_path(path, &element.tag);

        if let Some(def) = schema.element(&element.tag) {
            if def.content_model == crate::schema::ContentModel::Sequence {
                self.check_order(element, &def.children, resolver, &current, issues);
            }
        }

        for child in &element.children {
            self.walk(child, &current, schema, resolver, issues);
        }
    }

    fn check_order(
        &self,
        element: &Element,
        declared: &[crate::schema::ChildSlot],
        resolver: &Resolver<'_>,
        path: &str,
        issues: &mut Vec<ValidationIssue>,
    ) {
        if element.children.is_empty() {
            return;
        }

        let slots = resolver.flatten_sequence(declared);
        if slots.is_empty() {
            return;
        }

        // tag -> slot indices where it may appear, in ascending order
        let mut positions: HashMap<&str, Vec<usize>> = HashMap::new();
        for (index, slot) in slots.iter().enumerate() {
            for name in &slot.alternatives {
                positions.entry(name.as_str()).or_default().push(index);
            }
        }

        let mut cursor: i64 = -1;
        for child in &element.children {
            let Some(valid) = positions.get(child.tag.as_str()) else {
                continue;
            };

            // repeats may stay at the cursor position, hence >=
            match valid.iter().find(|&&pos| pos as i64 >= cursor) {
                Some(&pos) => cursor = pos as i64,
                None => issues.push(self.order_issue(element, child, &slots, cursor, path)),
            }
        }
    }

    fn order_issue(
        &self,
        parent: &Element,
        child: &Element,
        slots: &[SequenceSlot],
        cursor: i64,
        path: &str,
    ) -> ValidationIssue {
        let mut sequence_names = Vec::new();
        for slot in slots {
            for name in &slot.alternatives {
                if !sequence_names.iter().any(|n| n == name) {
                    sequence_names.push(name.clone());
                }
            }
        }

        let mut expected_next = Vec::new();
        'scan: for (index, slot) in slots.iter().enumerate() {
            if index as i64 <= cursor {
                continue;
            }
            for name in &slot.alternatives {
                if !expected_next.iter().any(|n| n == name) {
                    expected_next.push(name.clone());
                    if expected_next.len() >= 5 {
                        break 'scan;
                    }
                }
            }
        }

        let expected_display = if expected_next.is_empty() {
            "elements that haven't appeared yet".to_string()
        } else {
            expected_next.join(", ")
        };

        ValidationIssue::new(
            ErrorCategory::SequenceOrderError,
            format!(
                "Element '{}' appears out of sequence order in parent element '{}'. \
                 This element should appear earlier in the sequence. \
                 Expected sequence: {}. \
                 At current position, expected one of: {}. \
                 Fix: reorder the elements in '{}' to match the required sequence.",
                child.tag,
                parent.tag,
                sequence_names.join(" -> "),
                expected_display,
                parent.tag
            ),
        )
        .with_path(path)
    }
}

impl Validator for SequenceOrderValidator {
    fn name(&self) -> &'static str {
        "Sequence-Order"
    }

    fn validate(&self, root: &Element, schema: &SchemaModel) -> Vec<ValidationIssue> {
        let resolver = Resolver::new(schema);
        let mut issues = Vec::new();
        self.walk(root, "", schema, &resolver, &mut issues);
        issues
    }
}
