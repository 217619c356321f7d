//! Per-parent name uniqueness checks

use indexmap::IndexMap;

use crate::error::{ErrorCategory, ValidationIssue};
use crate::schema::SchemaModel;
use crate::tree::Element;
use crate::validators::helpers;
use crate::validators::pipeline::Validator;

/// Checks that the named children of every parent carry pairwise
/// distinct `name` attributes, whatever their tags are.
///
/// Scope is strictly one level: the same name may recur under another
/// parent or at another depth. One finding is emitted per duplicated
/// name, listing every colliding child tag.
#[derive(Debug, Default)]
pub struct UniquenessValidator;

impl UniquenessValidator {
    /// Create the validator
    pub fn new() -> Self {
        UniquenessValidator
    }

    fn walk(&self, element: &Element, path: &str, issues: &mut Vec<ValidationIssue>) {
        let current = helpers::child_path(path, &element.tag);

        // name -> tags of the children carrying it, in document order
        let mut names: IndexMap<&str, Vec<&str>> = IndexMap::new();
        for child in &element.children {
            if let Some(name) = child.attribute("name") {
                names.entry(name).or_default().push(child.tag.as_str());
            }
        }

        for (name, tags) in &names {
            if tags.len() > 1 {
                issues.push(
                    ValidationIssue::new(
                        ErrorCategory::UniquenessError,
                        format!(
                            "Duplicate name '{}' found in {} elements: {} under parent '{}'. \
                             Fix: ensure each element has a unique name within its parent scope.",
                            name,
                            tags.len(),
                            tags.join(", "),
                            element.tag
                        ),
                    )
                    .with_path(current.as_str()),
                );
            }
        }

        for child in &element.children {
            self.walk(child, &current, issues);
        }
    }
}

impl Validator for UniquenessValidator {
    fn name(&self) -> &'static str {
        "Uniqueness"
    }

    fn validate(&self, root: &Element, _schema: &SchemaModel) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        self.walk(root, "", &mut issues);
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(doc: &Element) -> Vec<ValidationIssue> {
        UniquenessValidator::new().validate(doc, &SchemaModel::default())
    }

    #[test]
    fn test_duplicate_names_under_one_parent() {
        let doc = Element::new("Doc")
            .with_child(Element::new("Thing").with_attribute("name", "dup"))
            .with_child(Element::new("Thing").with_attribute("name", "dup"));

        let issues = run(&doc);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].category, ErrorCategory::UniquenessError);
        assert!(issues[0]
            .message
            .contains("Duplicate name 'dup' found in 2 elements: Thing, Thing under parent 'Doc'"));
        assert_eq!(issues[0].path, "Doc");
    }

    #[test]
    fn test_duplicates_across_differing_tags() {
        let doc = Element::new("Entities")
            .with_child(Element::new("Vehicle").with_attribute("name", "x"))
            .with_child(Element::new("Pedestrian").with_attribute("name", "x"));

        let issues = run(&doc);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("Vehicle, Pedestrian"));
    }

    #[test]
    fn test_same_name_under_different_parents_allowed() {
        let doc = Element::new("Doc")
            .with_child(Element::new("GroupA").with_child(
                Element::new("Thing").with_attribute("name", "shared"),
            ))
            .with_child(Element::new("GroupB").with_child(
                Element::new("Thing").with_attribute("name", "shared"),
            ));

        assert!(run(&doc).is_empty());
    }

    #[test]
    fn test_same_name_at_different_depths_allowed() {
        let inner = Element::new("Leaf").with_attribute("name", "n");
        let doc = Element::new("Doc")
            .with_child(Element::new("Mid").with_attribute("name", "n").with_child(inner));

        assert!(run(&doc).is_empty());
    }

    #[test]
    fn test_unnamed_children_ignored() {
        let doc = Element::new("Doc")
            .with_child(Element::new("Thing"))
            .with_child(Element::new("Thing"))
            .with_child(Element::new("Thing"));

        assert!(run(&doc).is_empty());
    }

    #[test]
    fn test_triple_duplicate_counted() {
        let doc = Element::new("Doc")
            .with_child(Element::new("A").with_attribute("name", "n"))
            .with_child(Element::new("B").with_attribute("name", "n"))
            .with_child(Element::new("C").with_attribute("name", "n"));

        let issues = run(&doc);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("found in 3 elements: A, B, C"));
    }

    #[test]
    fn test_one_finding_per_duplicated_name() {
        let doc = Element::new("Doc")
            .with_child(Element::new("A").with_attribute("name", "first"))
            .with_child(Element::new("B").with_attribute("name", "second"))
            .with_child(Element::new("C").with_attribute("name", "first"))
            .with_child(Element::new("D").with_attribute("name", "second"));

        let issues = run(&doc);
        assert_eq!(issues.len(), 2);
        assert!(issues[0].message.contains("'first'"));
        assert!(issues[1].message.contains("'second'"));
    }

    #[test]
    fn test_empty_names_still_collide() {
        let doc = Element::new("Doc")
            .with_child(Element::new("A").with_attribute("name", ""))
            .with_child(Element::new("B").with_attribute("name", ""));

        assert_eq!(run(&doc).len(), 1);
    }

    #[test]
    fn test_nested_parent_path() {
        let doc = Element::new("Doc").with_child(
            Element::new("Entities")
                .with_child(Element::new("Vehicle").with_attribute("name", "v"))
                .with_child(Element::new("Vehicle").with_attribute("name", "v")),
        );

        let issues = run(&doc);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, "Doc/Entities");
    }
}
