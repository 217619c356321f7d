//! Group-reference expansion
//!
//! Pure read-only operations over a [`SchemaModel`]. Several validators need
//! the concrete element names behind a content model; this module owns the
//! expansion rules, including the cycle guard for malformed schemas where
//! groups reference themselves directly or mutually.

use crate::limits::Limits;
use crate::schema::model::{ChildRef, ChildSlot, GroupDefinition, SchemaModel};

/// Result of expanding a named group.
///
/// `Unresolved` names a group that is absent from the model, or whose
/// expansion re-entered itself. Callers decide whether to surface the marker
/// or skip the branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expansion {
    /// Recursive member closure, in declaration order
    Expanded(Vec<String>),
    /// The group could not be expanded
    Unresolved(String),
}

impl Expansion {
    /// Expanded names, empty when unresolved
    pub fn names(&self) -> &[String] {
        match self {
            Expansion::Expanded(names) => names,
            Expansion::Unresolved(_) => &[],
        }
    }

    /// Whether expansion succeeded
    pub fn is_resolved(&self) -> bool {
        matches!(self, Expansion::Expanded(_))
    }
}

/// One logical position in a flattened sequence.
///
/// A concrete element contributes a single alternative; a choice group
/// contributes all of its alternatives at one position, since any one of
/// them may legitimately appear there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceSlot {
    /// Element names admissible at this position
    pub alternatives: Vec<String>,
}

impl SequenceSlot {
    fn single(name: impl Into<String>) -> Self {
        SequenceSlot {
            alternatives: vec![name.into()],
        }
    }
}

/// Expansion operations borrowed against one schema.
pub struct Resolver<'a> {
    schema: &'a SchemaModel,
    limits: Limits,
}

impl<'a> Resolver<'a> {
    /// Resolver with default limits
    pub fn new(schema: &'a SchemaModel) -> Self {
        Resolver {
            schema,
            limits: Limits::default(),
        }
    }

    /// Resolver with explicit limits
    pub fn with_limits(schema: &'a SchemaModel, limits: Limits) -> Self {
        Resolver { schema, limits }
    }

    /// Full recursive member closure of a group, choice members included.
    /// Nested unresolved references are skipped inside an otherwise
    /// successful expansion.
    pub fn expand_group(&self, name: &str) -> Expansion {
        let mut visited = Vec::new();
        self.expand_rec(name, &mut visited, 0)
    }

    fn expand_rec(&self, name: &str, visited: &mut Vec<String>, depth: usize) -> Expansion {
        if visited.iter().any(|v| v == name) {
            return Expansion::Unresolved(name.to_string());
        }
        if self.limits.check_group_depth(depth + 1).is_err() {
            return Expansion::Unresolved(name.to_string());
        }
        let Some(group) = self.schema.group(name) else {
            return Expansion::Unresolved(name.to_string());
        };

        visited.push(name.to_string());
        let mut names = Vec::new();
        for slot in &group.children {
            match &slot.child {
                ChildRef::Element(member) => names.push(member.clone()),
                ChildRef::Group(nested) => {
                    if let Expansion::Expanded(inner) = self.expand_rec(nested, visited, depth + 1)
                    {
                        names.extend(inner);
                    }
                }
            }
        }
        visited.pop();
        Expansion::Expanded(names)
    }

    /// Flat set of concrete child tags a slot list admits. An unresolved
    /// group keeps its `GROUP:<name>` marker so diagnostics can show what
    /// is missing.
    pub fn allowed_children(&self, slots: &[ChildSlot]) -> Vec<String> {
        let mut out = Vec::new();
        for slot in slots {
            match &slot.child {
                ChildRef::Element(name) => out.push(name.clone()),
                ChildRef::Group(name) => match self.expand_group(name) {
                    Expansion::Expanded(names) => out.extend(names),
                    Expansion::Unresolved(name) => out.push(format!("GROUP:{}", name)),
                },
            }
        }
        out
    }

    /// Alternatives of a choice group: direct element members plus the
    /// recursive closure of nested groups
    pub fn choice_alternatives(&self, group: &GroupDefinition) -> Vec<String> {
        self.allowed_children(&group.children)
    }

    /// Order-preserving flattening of a sequence's slots. Sequence/all
    /// groups splice their members; a choice group occupies one position
    /// with all of its alternatives; unresolved groups keep their marker.
    pub fn flatten_sequence(&self, slots: &[ChildSlot]) -> Vec<SequenceSlot> {
        let mut out = Vec::new();
        let mut visited = Vec::new();
        self.flatten_rec(slots, &mut visited, 0, &mut out);
        out
    }

    fn flatten_rec(
        &self,
        slots: &[ChildSlot],
        visited: &mut Vec<String>,
        depth: usize,
        out: &mut Vec<SequenceSlot>,
    ) {
        for slot in slots {
            let name = match &slot.child {
                ChildRef::Element(name) => {
                    out.push(SequenceSlot::single(name.clone()));
                    continue;
                }
                ChildRef::Group(name) => name,
            };

            let Some(group) = self.schema.group(name) else {
                out.push(SequenceSlot::single(format!("GROUP:{}", name)));
                continue;
            };
            if group.is_choice() {
                out.push(SequenceSlot {
                    alternatives: self.choice_alternatives(group),
                });
                continue;
            }
            if visited.iter().any(|v| v == name)
                || self.limits.check_group_depth(depth + 1).is_err()
            {
                out.push(SequenceSlot::single(format!("GROUP:{}", name)));
                continue;
            }

            visited.push(name.clone());
            self.flatten_rec(&group.children, visited, depth + 1, out);
            visited.pop();
        }
    }
}
