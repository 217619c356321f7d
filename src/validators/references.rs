//! Cross-reference resolution checks

use indexmap::IndexSet;

use crate::error::{ErrorCategory, ValidationIssue};
use crate::schema::SchemaModel;
use crate::tree::Element;
use crate::validators::helpers;
use crate::validators::pipeline::Validator;

/// Tags that declare a referenceable entity, keyed by their `name` attribute
const ENTITY_TAGS: [&str; 5] = [
    "ScenarioObject",
    "EntityObject",
    "Vehicle",
    "Pedestrian",
    "MiscObject",
];

/// Attributes that refer to an entity, on any element
const ENTITY_REF_ATTRS: [&str; 3] = ["entityRef", "objectRef", "actorRef"];

/// Tags that declare a referenceable storyboard construct
const STORYBOARD_TAGS: [&str; 5] = ["Act", "ManeuverGroup", "Maneuver", "Event", "Action"];

/// Attributes that refer to a storyboard construct, on any element
const STORYBOARD_REF_ATTRS: [&str; 4] = ["actRef", "maneuverRef", "eventRef", "actionRef"];

/// Role-specific attributes, excluded from the ordinary parameter pass
const ROLE_ATTRS: [&str; 10] = [
    "entityRef",
    "objectRef",
    "actorRef",
    "variableRef",
    "actRef",
    "maneuverRef",
    "eventRef",
    "actionRef",
    "trafficSignalControllerRef",
    "signalId",
];

/// Every declaration set gathered in one pass over the tree.
///
/// Insertion order is document order, so candidate listings in messages
/// read the way the document does.
#[derive(Debug, Default)]
struct Declarations {
    entities: IndexSet<String>,
    variables: IndexSet<String>,
    parameters: IndexSet<String>,
    storyboard: IndexSet<String>,
    controllers: IndexSet<String>,
    signals: IndexSet<String>,
}

impl Declarations {
    fn collect(root: &Element) -> Self {
        let mut declarations = Declarations::default();
        declarations.visit(root);
        declarations
    }

    fn visit(&mut self, element: &Element) {
        let tag = element.tag.as_str();

        if ENTITY_TAGS.contains(&tag) {
            record(&mut self.entities, element, "name");
        }
        if tag == "VariableDeclaration" {
            record(&mut self.variables, element, "name");
        }
        if tag == "ParameterDeclaration" {
            record(&mut self.parameters, element, "name");
        }
        if STORYBOARD_TAGS.contains(&tag) {
            record(&mut self.storyboard, element, "name");
        }
        if tag == "TrafficSignalController" {
            record(&mut self.controllers, element, "name");
        }
        if tag == "TrafficSignal" {
            record(&mut self.signals, element, "id");
        }

        for child in &element.children {
            self.visit(child);
        }
    }
}

fn record(set: &mut IndexSet<String>, element: &Element, key: &str) {
    if let Some(value) = element.attribute(key) {
        if !value.is_empty() {
            set.insert(value.to_string());
        }
    }
}

fn available(set: &IndexSet<String>) -> String {
    if set.is_empty() {
        "None".to_string()
    } else {
        set.iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Names a reference value fails to resolve against `declared`.
///
/// A plain value is looked up as-is. A parameter form contributes its
/// `$Name` mentions instead, so `${ 2 + 3 }` is literal and always
/// resolves. A `$`-prefixed value that is not a well-formed parameter
/// form is left to the type checks.
fn unresolved(value: &str, declared: &IndexSet<String>) -> Vec<String> {
    if value.is_empty() {
        return Vec::new();
    }
    if helpers::is_parameter_form(value) {
        return helpers::extract_mentions(value)
            .into_iter()
            .filter(|name| !declared.contains(name))
            .collect();
    }
    if value.starts_with('$') {
        return Vec::new();
    }
    if declared.contains(value) {
        Vec::new()
    } else {
        vec![value.to_string()]
    }
}

/// Issue lists per reference role, concatenated in a fixed order so the
/// final list groups findings by role rather than by tree position.
#[derive(Debug, Default)]
struct Buckets {
    entity: Vec<ValidationIssue>,
    variable: Vec<ValidationIssue>,
    parameter: Vec<ValidationIssue>,
    storyboard: Vec<ValidationIssue>,
    traffic: Vec<ValidationIssue>,
}

impl Buckets {
    fn into_issues(self) -> Vec<ValidationIssue> {
        let mut issues = self.entity;
        issues.extend(self.variable);
        issues.extend(self.parameter);
        issues.extend(self.storyboard);
        issues.extend(self.traffic);
        issues
    }
}

/// Resolves every reference-carrying attribute against the declarations
/// present in the same document.
///
/// Role attributes (entity, variable, storyboard, traffic-signal
/// references) resolve against their own declaration sets; `$Name`
/// mentions in them resolve against the same role set, not against
/// parameters. Parameter forms in any other attribute resolve against
/// the parameter declarations.
#[derive(Debug, Default)]
pub struct ReferenceValidator;

impl ReferenceValidator {
    /// Create the validator
    pub fn new() -> Self {
        ReferenceValidator
    }

    fn walk(&self, element: &Element, path: &str, decls: &Declarations, buckets: &mut Buckets) {
        let current = helpers::child_path(path, &element.tag);

        self.check_entity_refs(element, decls, &current, buckets);
        self.check_variable_ref(element, decls, &current, buckets);
        self.check_parameter_mentions(element, decls, &current, buckets);
        self.check_storyboard_refs(element, decls, &current, buckets);
        self.check_traffic_refs(element, decls, &current, buckets);

        for child in &element.children {
            self.walk(child, &current, decls, buckets);
        }
    }

    fn check_entity_refs(
        &self,
        element: &Element,
        decls: &Declarations,
        path: &str,
        buckets: &mut Buckets,
    ) {
        for attr in ENTITY_REF_ATTRS {
            let Some(value) = element.attribute(attr) else {
                continue;
            };
            for name in unresolved(value, &decls.entities) {
                buckets.entity.push(
                    ValidationIssue::new(
                        ErrorCategory::ReferenceError,
                        format!(
                            "Entity reference '{}' in element '{}' cannot be resolved. \
                             Available entities: {}. \
                             Fix: use one of the available entity names or define the referenced entity.",
                            name,
                            element.tag,
                            available(&decls.entities)
                        ),
                    )
                    .with_path(path),
                );
            }
        }
    }

    fn check_variable_ref(
        &self,
        element: &Element,
        decls: &Declarations,
        path: &str,
        buckets: &mut Buckets,
    ) {
        if element.tag != "VariableAction" {
            return;
        }
        let Some(value) = element.attribute("variableRef") else {
            return;
        };
        for name in unresolved(value, &decls.variables) {
            buckets.variable.push(
                ValidationIssue::new(
                    ErrorCategory::ReferenceError,
                    format!(
                        "Variable reference '{}' in VariableAction cannot be resolved. \
                         Available variables: {}. \
                         Fix: use one of the available variable names or declare the referenced variable.",
                        name,
                        available(&decls.variables)
                    ),
                )
                .with_path(path),
            );
        }
    }

    fn check_parameter_mentions(
        &self,
        element: &Element,
        decls: &Declarations,
        path: &str,
        buckets: &mut Buckets,
    ) {
        for (attr, value) in &element.attributes {
            if ROLE_ATTRS.contains(&attr.as_str()) {
                continue;
            }
            if !helpers::is_parameter_form(value) {
                continue;
            }
            for name in helpers::extract_mentions(value) {
                if decls.parameters.contains(&name) {
                    continue;
                }
                buckets.parameter.push(
                    ValidationIssue::new(
                        ErrorCategory::ReferenceError,
                        format!(
                            "Parameter reference '{}' in element '{}' attribute '{}' cannot be resolved. \
                             Available parameters: {}. \
                             Fix: use one of the available parameter names or define the referenced parameter.",
                            name,
                            element.tag,
                            attr,
                            available(&decls.parameters)
                        ),
                    )
                    .with_path(path),
                );
            }
        }
    }

    fn check_storyboard_refs(
        &self,
        element: &Element,
        decls: &Declarations,
        path: &str,
        buckets: &mut Buckets,
    ) {
        for attr in STORYBOARD_REF_ATTRS {
            let Some(value) = element.attribute(attr) else {
                continue;
            };
            for name in unresolved(value, &decls.storyboard) {
                buckets.storyboard.push(
                    ValidationIssue::new(
                        ErrorCategory::ReferenceError,
                        format!(
                            "Storyboard element reference '{}' in element '{}' cannot be resolved. \
                             Available elements: {}. \
                             Fix: use one of the available element names or define the referenced element.",
                            name,
                            element.tag,
                            available(&decls.storyboard)
                        ),
                    )
                    .with_path(path),
                );
            }
        }
    }

    fn check_traffic_refs(
        &self,
        element: &Element,
        decls: &Declarations,
        path: &str,
        buckets: &mut Buckets,
    ) {
        if element.tag != "TrafficSignalStateAction" {
            return;
        }

        if let Some(value) = element.attribute("trafficSignalControllerRef") {
            for name in unresolved(value, &decls.controllers) {
                buckets.traffic.push(
                    ValidationIssue::new(
                        ErrorCategory::ReferenceError,
                        format!(
                            "Traffic signal controller reference '{}' cannot be resolved. \
                             Available controllers: {}. \
                             Fix: use one of the available controller names or define the referenced controller.",
                            name,
                            available(&decls.controllers)
                        ),
                    )
                    .with_path(path),
                );
            }
        }

        if let Some(value) = element.attribute("signalId") {
            for name in unresolved(value, &decls.signals) {
                buckets.traffic.push(
                    ValidationIssue::new(
                        ErrorCategory::ReferenceError,
                        format!(
                            "Signal ID '{}' cannot be resolved. \
                             Available signal IDs: {}. \
                             Fix: use one of the available signal IDs or define the referenced signal.",
                            name,
                            available(&decls.signals)
                        ),
                    )
                    .with_path(path),
                );
            }
        }
    }
}

impl Validator for ReferenceValidator {
    fn name(&self) -> &'static str {
        "Reference"
    }

    fn validate(&self, root: &Element, _schema: &SchemaModel) -> Vec<ValidationIssue> {
        let decls = Declarations::collect(root);
        let mut buckets = Buckets::default();
        self.walk(root, "", &decls, &mut buckets);
        buckets.into_issues()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(doc: &Element) -> Vec<ValidationIssue> {
        ReferenceValidator::new().validate(doc, &SchemaModel::default())
    }

    fn scenario_with_entity() -> Element {
        Element::new("OpenSCENARIO")
            .with_child(
                Element::new("Entities")
                    .with_child(Element::new("ScenarioObject").with_attribute("name", "ego")),
            )
    }

    #[test]
    fn test_resolved_entity_reference() {
        let mut doc = scenario_with_entity();
        doc.add_child(Element::new("SpeedAction").with_attribute("entityRef", "ego"));
        assert!(run(&doc).is_empty());
    }

    #[test]
    fn test_unresolved_entity_reference() {
        let mut doc = scenario_with_entity();
        doc.add_child(Element::new("SpeedAction").with_attribute("entityRef", "ghost"));

        let issues = run(&doc);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].category, ErrorCategory::ReferenceError);
        assert!(issues[0]
            .message
            .contains("Entity reference 'ghost' in element 'SpeedAction'"));
        assert!(issues[0].message.contains("Available entities: ego"));
        assert_eq!(issues[0].path, "OpenSCENARIO/SpeedAction");
    }

    #[test]
    fn test_no_declarations_renders_none() {
        let doc = Element::new("OpenSCENARIO")
            .with_child(Element::new("SpeedAction").with_attribute("entityRef", "ghost"));

        let issues = run(&doc);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("Available entities: None"));
    }

    #[test]
    fn test_dollar_entity_reference_checked_against_entities() {
        // the role set wins even when a parameter of the same name exists
        let mut doc = Element::new("OpenSCENARIO").with_child(
            Element::new("ParameterDeclarations")
                .with_child(Element::new("ParameterDeclaration").with_attribute("name", "Hero")),
        );
        doc.add_child(Element::new("SpeedAction").with_attribute("entityRef", "$Hero"));

        let issues = run(&doc);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("Entity reference 'Hero'"));
    }

    #[test]
    fn test_dollar_entity_reference_resolving() {
        let mut doc = Element::new("OpenSCENARIO").with_child(
            Element::new("Entities")
                .with_child(Element::new("Vehicle").with_attribute("name", "Hero")),
        );
        doc.add_child(Element::new("SpeedAction").with_attribute("entityRef", "$Hero"));
        assert!(run(&doc).is_empty());
    }

    #[test]
    fn test_variable_ref_scoped_to_variable_action() {
        let doc = Element::new("OpenSCENARIO")
            .with_child(Element::new("VariableAction").with_attribute("variableRef", "missing"));
        let issues = run(&doc);
        assert_eq!(issues.len(), 1);
        assert!(issues[0]
            .message
            .contains("Variable reference 'missing' in VariableAction"));

        // the same attribute elsewhere is not a variable reference
        let doc = Element::new("OpenSCENARIO")
            .with_child(Element::new("Oddball").with_attribute("variableRef", "missing"));
        assert!(run(&doc).is_empty());
    }

    #[test]
    fn test_parameter_mention_in_ordinary_attribute() {
        let mut doc = Element::new("OpenSCENARIO").with_child(
            Element::new("ParameterDeclarations")
                .with_child(Element::new("ParameterDeclaration").with_attribute("name", "Fast")),
        );
        doc.add_child(Element::new("SpeedAction").with_attribute("speed", "$Fast"));
        assert!(run(&doc).is_empty());

        let doc = Element::new("OpenSCENARIO")
            .with_child(Element::new("SpeedAction").with_attribute("speed", "$Fast"));
        let issues = run(&doc);
        assert_eq!(issues.len(), 1);
        assert!(issues[0]
            .message
            .contains("Parameter reference 'Fast' in element 'SpeedAction' attribute 'speed'"));
    }

    #[test]
    fn test_expression_mentions() {
        let decls = Element::new("ParameterDeclarations")
            .with_child(Element::new("ParameterDeclaration").with_attribute("name", "a"));

        let doc = Element::new("OpenSCENARIO")
            .with_child(decls.clone())
            .with_child(Element::new("Offset").with_attribute("value", "${ $a + 2 }"));
        assert!(run(&doc).is_empty());

        let doc = Element::new("OpenSCENARIO")
            .with_child(decls)
            .with_child(Element::new("Offset").with_attribute("value", "${ $a + $b }"));
        let issues = run(&doc);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("Parameter reference 'b'"));
    }

    #[test]
    fn test_literal_expression_always_resolves() {
        let doc = Element::new("OpenSCENARIO")
            .with_child(Element::new("Offset").with_attribute("value", "${ 2 + 3 }"));
        assert!(run(&doc).is_empty());
    }

    #[test]
    fn test_role_attribute_not_double_reported_as_parameter() {
        let doc = Element::new("OpenSCENARIO")
            .with_child(Element::new("SpeedAction").with_attribute("entityRef", "$Hero"));
        let issues = run(&doc);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("Entity reference"));
    }

    #[test]
    fn test_storyboard_reference() {
        let mut doc = Element::new("OpenSCENARIO")
            .with_child(Element::new("Act").with_attribute("name", "MainAct"));
        doc.add_child(Element::new("Trigger").with_attribute("actRef", "MainAct"));
        assert!(run(&doc).is_empty());

        doc.add_child(Element::new("Trigger").with_attribute("eventRef", "nope"));
        let issues = run(&doc);
        assert_eq!(issues.len(), 1);
        assert!(issues[0]
            .message
            .contains("Storyboard element reference 'nope' in element 'Trigger'"));
        assert!(issues[0].message.contains("Available elements: MainAct"));
    }

    #[test]
    fn test_traffic_signal_references() {
        let declared = Element::new("OpenSCENARIO")
            .with_child(Element::new("TrafficSignalController").with_attribute("name", "ctrl"))
            .with_child(Element::new("TrafficSignal").with_attribute("id", "sig1"));

        let mut doc = declared.clone();
        doc.add_child(
            Element::new("TrafficSignalStateAction")
                .with_attribute("trafficSignalControllerRef", "ctrl")
                .with_attribute("signalId", "sig1"),
        );
        assert!(run(&doc).is_empty());

        let mut doc = declared;
        doc.add_child(
            Element::new("TrafficSignalStateAction")
                .with_attribute("trafficSignalControllerRef", "other")
                .with_attribute("signalId", "sig9"),
        );
        let issues = run(&doc);
        assert_eq!(issues.len(), 2);
        assert!(issues[0]
            .message
            .contains("Traffic signal controller reference 'other'"));
        assert!(issues[1].message.contains("Signal ID 'sig9'"));
    }

    #[test]
    fn test_issues_grouped_by_role() {
        // the parameter miss comes first in the tree, the entity miss second;
        // the report still lists entity findings first
        let doc = Element::new("OpenSCENARIO")
            .with_child(Element::new("Weather").with_attribute("sun", "$Bright"))
            .with_child(Element::new("SpeedAction").with_attribute("entityRef", "ghost"));

        let issues = run(&doc);
        assert_eq!(issues.len(), 2);
        assert!(issues[0].message.contains("Entity reference"));
        assert!(issues[1].message.contains("Parameter reference"));
    }

    #[test]
    fn test_declaration_position_does_not_matter() {
        let doc = Element::new("OpenSCENARIO")
            .with_child(Element::new("SpeedAction").with_attribute("entityRef", "late"))
            .with_child(
                Element::new("Entities")
                    .with_child(Element::new("Pedestrian").with_attribute("name", "late")),
            );
        assert!(run(&doc).is_empty());
    }

    #[test]
    fn test_empty_reference_value_skipped() {
        let doc = Element::new("OpenSCENARIO")
            .with_child(Element::new("SpeedAction").with_attribute("entityRef", ""));
        assert!(run(&doc).is_empty());
    }
}
