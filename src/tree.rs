//! Scenario document tree
//!
//! `Element` is the attributed tree a scenario document becomes in memory:
//! a tag, an insertion-ordered attribute map, optional text, and exclusively
//! owned children. Validators only read trees; mutation belongs to editors
//! and builders, and every mutating operation touches the modification
//! timestamp. No validation logic lives here.

use std::fmt;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Bookkeeping metadata carried by every element.
///
/// Used by interactive editing and tooling; never consulted by validation.
#[derive(Debug, Clone)]
pub struct Metadata {
    /// Creation instant
    pub created_at: DateTime<Utc>,
    /// Last mutation instant
    pub modified_at: DateTime<Utc>,
    /// Optional author tag
    pub created_by: Option<String>,
    /// Free-text description
    pub description: Option<String>,
    /// Free-text labels
    pub tags: Vec<String>,
}

impl Default for Metadata {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            modified_at: now,
            created_by: None,
            description: None,
            tags: Vec::new(),
        }
    }
}

impl Metadata {
    /// Create metadata stamped with the current instant
    pub fn new() -> Self {
        Self::default()
    }

    fn touch(&mut self) {
        self.modified_at = Utc::now();
    }
}

/// One node of a scenario document.
///
/// Children are exclusively owned; there are no parent back-pointers and no
/// shared nodes, so a subtree can always be moved or dropped wholesale.
/// Deep copies come from `Clone` and alias nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    /// Tag name
    pub tag: String,
    /// Attributes in insertion order
    #[serde(default)]
    pub attributes: IndexMap<String, String>,
    /// Text content, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Owned child elements in document order
    #[serde(default)]
    pub children: Vec<Element>,
    /// Editing metadata (not serialized; fresh on import)
    #[serde(skip)]
    pub metadata: Metadata,
}

impl Element {
    /// Create a new element with the given tag
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: IndexMap::new(),
            text: None,
            children: Vec::new(),
            metadata: Metadata::new(),
        }
    }

    /// Builder-style: set one attribute
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Builder-style: set the text content
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Builder-style: append one child
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Append a child element
    pub fn add_child(&mut self, child: Element) {
        self.children.push(child);
        self.metadata.touch();
    }

    /// Insert a child at the given position (clamped to the child count)
    pub fn insert_child(&mut self, index: usize, child: Element) {
        let index = index.min(self.children.len());
        self.children.insert(index, child);
        self.metadata.touch();
    }

    /// Remove and return the child at the given position
    pub fn remove_child(&mut self, index: usize) -> Option<Element> {
        if index < self.children.len() {
            let removed = self.children.remove(index);
            self.metadata.touch();
            Some(removed)
        } else {
            None
        }
    }

    /// First direct child with the given tag
    pub fn child_by_tag(&self, tag: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.tag == tag)
    }

    /// First direct child with the given tag, mutably
    pub fn child_by_tag_mut(&mut self, tag: &str) -> Option<&mut Element> {
        self.children.iter_mut().find(|c| c.tag == tag)
    }

    /// All direct children with the given tag
    pub fn children_by_tag(&self, tag: &str) -> Vec<&Element> {
        self.children.iter().filter(|c| c.tag == tag).collect()
    }

    /// Set an attribute value
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
        self.metadata.touch();
    }

    /// Get an attribute value
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|v| v.as_str())
    }

    /// Get an attribute value, falling back to a default
    pub fn attribute_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.attribute(name).unwrap_or(default)
    }

    /// Remove an attribute, returning whether it was present
    pub fn remove_attribute(&mut self, name: &str) -> bool {
        // shift_remove keeps the remaining attribute order stable
        if self.attributes.shift_remove(name).is_some() {
            self.metadata.touch();
            true
        } else {
            false
        }
    }

    /// Check whether an attribute is present
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// All elements with the given tag in this subtree, self included,
    /// in document order
    pub fn find_by_tag(&self, tag: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        self.collect_by_tag(tag, &mut found);
        found
    }

    fn collect_by_tag<'a>(&'a self, tag: &str, found: &mut Vec<&'a Element>) {
        if self.tag == tag {
            found.push(self);
        }
        for child in &self.children {
            child.collect_by_tag(tag, found);
        }
    }

    /// Total number of nodes in this subtree, self included
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Element::node_count).sum::<usize>()
    }

    /// Maximum nesting depth of this subtree (a leaf has depth 1)
    pub fn depth(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(Element::depth)
            .max()
            .unwrap_or(0)
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.tag)?;
        for (name, value) in &self.attributes {
            write!(f, " {}=\"{}\"", name, value)?;
        }
        write!(f, "> ({} children)", self.children.len())
    }
}
