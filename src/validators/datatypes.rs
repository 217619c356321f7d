//! Domain-specific numeric range checks

use crate::error::{ErrorCategory, ValidationIssue};
use crate::schema::SchemaModel;
use crate::tree::Element;
use crate::validators::helpers;
use crate::validators::pipeline::Validator;

/// Which elements a rule applies to
#[derive(Debug, Clone, Copy)]
enum Scope {
    /// Any element carrying the attribute
    Any,
    /// Only the named element
    Only(&'static str),
    /// Any element except the named one
    Except(&'static str),
}

#[derive(Debug, Clone, Copy)]
enum Constraint {
    NonNegative,
    Positive,
    UnitInterval,
    /// Any real number; range-free, malformed literals are the type
    /// checker's business
    Numeric,
}

struct DomainRule {
    attribute: &'static str,
    scope: Scope,
    constraint: Constraint,
}

/// Checked in order per element, so findings list in a stable order.
const RULES: [DomainRule; 7] = [
    DomainRule {
        attribute: "transitionTime",
        scope: Scope::Only("LightStateAction"),
        constraint: Constraint::NonNegative,
    },
    DomainRule {
        attribute: "duration",
        scope: Scope::Only("Phase"),
        constraint: Constraint::Positive,
    },
    DomainRule {
        attribute: "speed",
        scope: Scope::Any,
        constraint: Constraint::NonNegative,
    },
    DomainRule {
        attribute: "probability",
        scope: Scope::Any,
        constraint: Constraint::UnitInterval,
    },
    DomainRule {
        attribute: "acceleration",
        scope: Scope::Any,
        constraint: Constraint::Numeric,
    },
    DomainRule {
        attribute: "distance",
        scope: Scope::Any,
        constraint: Constraint::NonNegative,
    },
    DomainRule {
        attribute: "time",
        scope: Scope::Except("AbsoluteTime"),
        constraint: Constraint::NonNegative,
    },
];

/// Applies domain range rules on top of structural typing: transition
/// times, speeds, distances and times must not be negative, phase
/// durations must be strictly positive, probabilities must stay inside
/// [0, 1].
///
/// Values starting with `$` are deferred parameter input and exempt.
/// Values that do not parse as numbers are skipped here; the structural
/// type checks already report those.
#[derive(Debug, Default)]
pub struct DataTypeValidator;

impl DataTypeValidator {
    /// Create the validator
    pub fn new() -> Self {
        DataTypeValidator
    }

    fn walk(&self, element: &Element, path: &str, issues: &mut Vec<ValidationIssue>) {
        let current = helpers::child_path(path, &element.tag);

        for rule in &RULES {
            if !rule.applies_to(&element.tag) {
                continue;
            }
            let Some(value) = element.attribute(rule.attribute) else {
                continue;
            };
            if let Some(issue) = rule.check(value, &element.tag, &current) {
                issues.push(issue);
            }
        }

        for child in &element.children {
            self.walk(child, &current, issues);
        }
    }
}

impl DomainRule {
    fn applies_to(&self, tag: &str) -> bool {
        match self.scope {
            Scope::Any => true,
            Scope::Only(only) => tag == only,
            Scope::Except(except) => tag != except,
        }
    }

    fn check(&self, value: &str, tag: &str, path: &str) -> Option<ValidationIssue> {
        if value.starts_with('$') {
            return None;
        }
        let number: f64 = value.trim().parse().ok()?;

        let (requirement, fix) = match self.constraint {
            Constraint::NonNegative if number < 0.0 => ("must be non-negative", "use a value >= 0"),
            Constraint::Positive if number <= 0.0 => ("must be positive", "use a value > 0"),
            Constraint::UnitInterval if !(0.0..=1.0).contains(&number) => (
                "must be between 0 and 1",
                "use a value between 0.0 and 1.0",
            ),
            _ => return None,
        };

        Some(
            ValidationIssue::new(
                ErrorCategory::DataTypeError,
                format!(
                    "{} in {} {}, got '{}'. Fix: {}.",
                    display_name(self.attribute),
                    tag,
                    requirement,
                    value,
                    fix
                ),
            )
            .with_path(path),
        )
    }
}

/// Attribute name with the first letter raised for message prose
fn display_name(attribute: &str) -> String {
    let mut chars = attribute.chars();
    match chars.next() {
        Some(first) => format!("{}{}", first.to_ascii_uppercase(), chars.as_str()),
        None => String::new(),
    }
}

impl Validator for DataTypeValidator {
    fn name(&self) -> &'static str {
        "Data-Type"
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
        DataTypeValidator::new().validate(doc, &SchemaModel::default())
    }

    #[test]
    fn test_in_range_values_pass() {
        let doc = Element::new("Scenario")
            .with_child(Element::new("SpeedAction").with_attribute("speed", "10.5"))
            .with_child(Element::new("Stochastics").with_attribute("probability", "0.5"))
            .with_child(Element::new("Phase").with_attribute("duration", "3"))
            .with_child(Element::new("LightStateAction").with_attribute("transitionTime", "0"))
            .with_child(Element::new("Condition").with_attribute("distance", "0"))
            .with_child(Element::new("Condition").with_attribute("time", "5"))
            .with_child(Element::new("Dynamics").with_attribute("acceleration", "-3.2"));

        assert!(run(&doc).is_empty());
    }

    #[test]
    fn test_negative_speed() {
        let doc = Element::new("SpeedAction").with_attribute("speed", "-5");
        let issues = run(&doc);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].category, ErrorCategory::DataTypeError);
        assert_eq!(
            issues[0].message,
            "Speed in SpeedAction must be non-negative, got '-5'. Fix: use a value >= 0."
        );
    }

    #[test]
    fn test_phase_duration_must_be_positive() {
        let doc = Element::new("Phase").with_attribute("duration", "0");
        let issues = run(&doc);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("Duration in Phase must be positive"));

        // duration outside Phase carries no domain rule
        let doc = Element::new("Event").with_attribute("duration", "-1");
        assert!(run(&doc).is_empty());
    }

    #[test]
    fn test_transition_time_scoped_to_light_state_action() {
        let doc = Element::new("LightStateAction").with_attribute("transitionTime", "-0.1");
        assert_eq!(run(&doc).len(), 1);

        let doc = Element::new("Other").with_attribute("transitionTime", "-0.1");
        assert!(run(&doc).is_empty());
    }

    #[test]
    fn test_probability_range() {
        let doc = Element::new("Stochastics").with_attribute("probability", "1.5");
        let issues = run(&doc);
        assert_eq!(issues.len(), 1);
        assert!(issues[0]
            .message
            .contains("Probability in Stochastics must be between 0 and 1"));

        let doc = Element::new("Stochastics").with_attribute("probability", "-0.01");
        assert_eq!(run(&doc).len(), 1);
    }

    #[test]
    fn test_parameter_values_exempt() {
        let doc = Element::new("Stochastics").with_attribute("probability", "$P");
        assert!(run(&doc).is_empty());

        let doc = Element::new("SpeedAction").with_attribute("speed", "${ $v * 2 }");
        assert!(run(&doc).is_empty());
    }

    #[test]
    fn test_absolute_time_exempt_from_time_rule() {
        let doc = Element::new("AbsoluteTime").with_attribute("time", "-5");
        assert!(run(&doc).is_empty());

        let doc = Element::new("RelativeTime").with_attribute("time", "-5");
        assert_eq!(run(&doc).len(), 1);
    }

    #[test]
    fn test_unparsable_numbers_skipped() {
        let doc = Element::new("SpeedAction").with_attribute("speed", "fast");
        assert!(run(&doc).is_empty());

        let doc = Element::new("Dynamics").with_attribute("acceleration", "abc");
        assert!(run(&doc).is_empty());
    }

    #[test]
    fn test_padded_value_still_checked() {
        let doc = Element::new("SpeedAction").with_attribute("speed", " -1 ");
        let issues = run(&doc);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("got ' -1 '"));
    }

    #[test]
    fn test_rule_order_within_element() {
        let doc = Element::new("Mix")
            .with_attribute("probability", "2")
            .with_attribute("speed", "-1");

        let issues = run(&doc);
        assert_eq!(issues.len(), 2);
        assert!(issues[0].message.starts_with("Speed"));
        assert!(issues[1].message.starts_with("Probability"));
    }

    #[test]
    fn test_nested_path_attached() {
        let doc = Element::new("Scenario")
            .with_child(Element::new("Story").with_child(
                Element::new("SpeedAction").with_attribute("speed", "-2"),
            ));

        let issues = run(&doc);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, "Scenario/Story/SpeedAction");
    }
}
