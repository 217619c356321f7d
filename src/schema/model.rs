//! In-memory schema model
//!
//! Everything here is built once by the schema parser and then read-only for
//! the lifetime of a validation run. Definitions keep their declaration order
//! (IndexMap / Vec) so that diagnostics and serialized output are stable.

use std::fmt;

use indexmap::IndexMap;

/// Upper bound of an occurrence constraint.
///
/// Schemas encode this as either a number or the literal `unbounded`; the
/// distinction is kept as a variant instead of re-parsing text at every use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxOccurs {
    /// At most this many instances
    Bounded(u32),
    /// No upper bound
    Unbounded,
}

impl Default for MaxOccurs {
    fn default() -> Self {
        MaxOccurs::Bounded(1)
    }
}

impl MaxOccurs {
    /// Parse the schema text form: `"unbounded"` or a base-10 integer
    pub fn parse(text: &str) -> Option<Self> {
        if text.eq_ignore_ascii_case("unbounded") {
            Some(MaxOccurs::Unbounded)
        } else {
            text.trim().parse::<u32>().ok().map(MaxOccurs::Bounded)
        }
    }
}

impl fmt::Display for MaxOccurs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaxOccurs::Bounded(n) => write!(f, "{}", n),
            MaxOccurs::Unbounded => write!(f, "unbounded"),
        }
    }
}

/// Occurrence constraint for one content-model slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurs {
    /// Minimum number of instances
    pub min: u32,
    /// Maximum number of instances
    pub max: MaxOccurs,
}

impl Default for Occurs {
    fn default() -> Self {
        Occurs::once()
    }
}

impl Occurs {
    /// Exactly one
    pub fn once() -> Self {
        Occurs {
            min: 1,
            max: MaxOccurs::Bounded(1),
        }
    }

    /// Zero or one
    pub fn optional() -> Self {
        Occurs {
            min: 0,
            max: MaxOccurs::Bounded(1),
        }
    }

    /// Zero or more
    pub fn zero_or_more() -> Self {
        Occurs {
            min: 0,
            max: MaxOccurs::Unbounded,
        }
    }

    /// One or more
    pub fn one_or_more() -> Self {
        Occurs {
            min: 1,
            max: MaxOccurs::Unbounded,
        }
    }

    /// Whether `count` instances fall short of the minimum
    pub fn is_missing(&self, count: usize) -> bool {
        count < self.min as usize
    }

    /// Whether `count` instances exceed the maximum
    pub fn is_exceeded(&self, count: usize) -> bool {
        match self.max {
            MaxOccurs::Bounded(n) => count > n as usize,
            MaxOccurs::Unbounded => false,
        }
    }

    /// Whether the slot may legally be absent
    pub fn is_emptiable(&self) -> bool {
        self.min == 0
    }
}

impl fmt::Display for Occurs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.min, self.max)
    }
}

/// One reference in a content model: a concrete element or a named group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChildRef {
    /// A concrete element name
    Element(String),
    /// A reference to a named group
    Group(String),
}

impl ChildRef {
    /// The referenced name, without the group marker
    pub fn name(&self) -> &str {
        match self {
            ChildRef::Element(name) | ChildRef::Group(name) => name,
        }
    }

    /// Whether this reference points at a group
    pub fn is_group(&self) -> bool {
        matches!(self, ChildRef::Group(_))
    }
}

impl fmt::Display for ChildRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChildRef::Element(name) => write!(f, "{}", name),
            ChildRef::Group(name) => write!(f, "GROUP:{}", name),
        }
    }
}

/// A content-model slot: what may appear there, and how often.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildSlot {
    /// Element or group reference occupying the slot
    pub child: ChildRef,
    /// Occurrence constraint for the slot
    pub occurs: Occurs,
}

impl ChildSlot {
    /// Slot holding a concrete element
    pub fn element(name: impl Into<String>, occurs: Occurs) -> Self {
        ChildSlot {
            child: ChildRef::Element(name.into()),
            occurs,
        }
    }

    /// Slot holding a group reference
    pub fn group(name: impl Into<String>, occurs: Occurs) -> Self {
        ChildSlot {
            child: ChildRef::Group(name.into()),
            occurs,
        }
    }

    /// Whether the slot's reference matches a rendered name
    /// (`Tag` or `GROUP:Name`)
    pub fn matches(&self, rendered: &str) -> bool {
        match &self.child {
            ChildRef::Element(name) => name == rendered,
            ChildRef::Group(name) => {
                rendered.strip_prefix("GROUP:").map(|r| r == name) == Some(true)
            }
        }
    }
}

/// Discipline governing how an element's children combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentModel {
    /// Children appear in declaration order
    #[default]
    Sequence,
    /// Exactly one alternative appears
    Choice,
    /// Any order, each child per its own occurrence
    All,
}

impl ContentModel {
    /// Parse a content-model block tag
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "sequence" => Some(ContentModel::Sequence),
            "choice" => Some(ContentModel::Choice),
            "all" => Some(ContentModel::All),
            _ => None,
        }
    }
}

impl fmt::Display for ContentModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ContentModel::Sequence => "sequence",
            ContentModel::Choice => "choice",
            ContentModel::All => "all",
        };
        write!(f, "{}", label)
    }
}

/// Declared attribute of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDefinition {
    /// Attribute name
    pub name: String,
    /// Mapped type tag (`string`, `int`, `unsignedInt`, `unsignedShort`,
    /// `double`, `float`, `boolean`, `dateTime`; anything else behaves as
    /// `string`)
    pub attr_type: String,
    /// Whether the attribute must be present and non-blank
    pub required: bool,
}

impl AttributeDefinition {
    /// Create an attribute definition
    pub fn new(name: impl Into<String>, attr_type: impl Into<String>, required: bool) -> Self {
        AttributeDefinition {
            name: name.into(),
            attr_type: attr_type.into(),
            required,
        }
    }
}

/// Declared element: attributes, content model, and child slots.
#[derive(Debug, Clone, Default)]
pub struct ElementDefinition {
    /// Element name
    pub name: String,
    /// Declared attributes in declaration order
    pub attributes: Vec<AttributeDefinition>,
    /// Content-model slots (elements and unexpanded choice groups)
    pub children: Vec<ChildSlot>,
    /// Child combination discipline
    pub content_model: ContentModel,
    /// Declared abstract (never instantiated directly)
    pub is_abstract: bool,
    /// Never referenced as anyone's child
    pub is_root: bool,
    /// Free-text description from the schema
    pub description: Option<String>,
}

impl ElementDefinition {
    /// Create an empty definition
    pub fn new(name: impl Into<String>) -> Self {
        ElementDefinition {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Look up a declared attribute by name
    pub fn attribute(&self, name: &str) -> Option<&AttributeDefinition> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Declared attributes with `required = true`
    pub fn required_attributes(&self) -> impl Iterator<Item = &AttributeDefinition> {
        self.attributes.iter().filter(|a| a.required)
    }

    /// Declared attributes with `required = false`
    pub fn optional_attributes(&self) -> impl Iterator<Item = &AttributeDefinition> {
        self.attributes.iter().filter(|a| !a.required)
    }

    /// Rendered child references in declaration order
    pub fn child_names(&self) -> Vec<String> {
        self.children.iter().map(|s| s.child.to_string()).collect()
    }

    /// Occurrence constraint for a rendered child reference
    pub fn occurs_for(&self, rendered: &str) -> Option<Occurs> {
        self.children
            .iter()
            .find(|s| s.matches(rendered))
            .map(|s| s.occurs)
    }
}

/// Named reusable content-model fragment.
#[derive(Debug, Clone)]
pub struct GroupDefinition {
    /// Group name
    pub name: String,
    /// Combination discipline of the group's members
    pub model: ContentModel,
    /// Member slots (elements or nested group references)
    pub children: Vec<ChildSlot>,
}

impl GroupDefinition {
    /// Create a group definition
    pub fn new(name: impl Into<String>, model: ContentModel) -> Self {
        GroupDefinition {
            name: name.into(),
            model,
            children: Vec::new(),
        }
    }

    /// Whether the group's members are exclusive alternatives
    pub fn is_choice(&self) -> bool {
        self.model == ContentModel::Choice
    }

    /// Rendered member references in declaration order
    pub fn member_names(&self) -> Vec<String> {
        self.children.iter().map(|s| s.child.to_string()).collect()
    }

    /// Occurrence constraint for a rendered member reference
    pub fn occurs_for(&self, rendered: &str) -> Option<Occurs> {
        self.children
            .iter()
            .find(|s| s.matches(rendered))
            .map(|s| s.occurs)
    }
}

/// Complete parsed schema.
///
/// Shared immutably by every validator in a run; all maps keep declaration
/// order.
#[derive(Debug, Clone, Default)]
pub struct SchemaModel {
    /// Element name -> definition
    pub elements: IndexMap<String, ElementDefinition>,
    /// Group name -> definition
    pub groups: IndexMap<String, GroupDefinition>,
    /// Names of legal top-level document tags, in declaration order
    pub root_elements: Vec<String>,
    /// Element name -> rendered child list (derived)
    pub hierarchy: IndexMap<String, Vec<String>>,
    /// Simple-type name -> permitted enumeration values, in document order
    pub simple_types: IndexMap<String, Vec<String>>,
}

impl SchemaModel {
    /// Create an empty model
    pub fn new() -> Self {
        SchemaModel::default()
    }

    /// Look up an element definition
    pub fn element(&self, name: &str) -> Option<&ElementDefinition> {
        self.elements.get(name)
    }

    /// Look up a group definition
    pub fn group(&self, name: &str) -> Option<&GroupDefinition> {
        self.groups.get(name)
    }

    /// Enumeration values for a simple-type name, matched case-insensitively
    /// (first declared match wins)
    pub fn enumeration(&self, name: &str) -> Option<&[String]> {
        self.simple_types
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, values)| values.as_slice())
    }

    /// Whether a tag is a legal document root
    pub fn is_root(&self, tag: &str) -> bool {
        self.root_elements.iter().any(|r| r == tag)
    }

    /// Number of declared elements
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Number of declared groups
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Number of declared simple types
    pub fn simple_type_count(&self) -> usize {
        self.simple_types.len()
    }
}
