//! Fluent, schema-aware element construction
//!
//! [`ElementBuilder`] assembles one element chainably and hands it to
//! [`ElementFactory`] for creation-time validation; the factory also
//! answers schema lookups (allowed children, attribute requirements)
//! for interactive tooling. Both reuse the validators, so creation-time
//! findings read exactly like pipeline findings.

use chrono::{SecondsFormat, Utc};
use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{Error, ErrorCategory, Result, ValidationIssue};
use crate::schema::{AttributeDefinition, Resolver, SchemaModel};
use crate::tree::Element;
use crate::validators::helpers;
use crate::validators::pipeline::Validator;
use crate::validators::{DataTypeValidator, DocumentStructureValidator, SchemaStructureValidator};

/// Chainable single-element builder.
///
/// `build()` validates the assembled element in strict mode and returns
/// `Error::Schema` when the element breaks its declaration;
/// `build_with_defaults()` instead scaffolds missing required attributes
/// with type-appropriate placeholders and leaves full validation to a
/// later pipeline run.
#[derive(Debug)]
pub struct ElementBuilder<'a> {
    factory: ElementFactory<'a>,
    tag: Option<String>,
    attributes: IndexMap<String, String>,
    children: Vec<Element>,
}

impl<'a> ElementBuilder<'a> {
    /// Strict builder: `build()` fails on any validation finding
    pub fn new(schema: &'a SchemaModel) -> Self {
        ElementBuilder {
            factory: ElementFactory::new(schema),
            tag: None,
            attributes: IndexMap::new(),
            children: Vec::new(),
        }
    }

    /// Lenient builder: `build()` always returns the assembled element
    pub fn lenient(schema: &'a SchemaModel) -> Self {
        ElementBuilder {
            factory: ElementFactory::lenient(schema),
            ..ElementBuilder::new(schema)
        }
    }

    /// Set the element tag
    pub fn element(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Add one attribute
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Add several attributes at once
    pub fn attrs<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in pairs {
            self.attributes.insert(name.into(), value.into());
        }
        self
    }

    /// Add one child
    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Add several children at once
    pub fn children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children.extend(children);
        self
    }

    /// Assemble and, in strict mode, validate the element
    pub fn build(self) -> Result<Element> {
        let Self {
            factory,
            tag,
            attributes,
            children,
        } = self;
        let tag = tag.ok_or_else(|| {
            Error::Schema("element tag must be set before building".to_string())
        })?;

        let mut element = Element::new(tag);
        for (name, value) in attributes {
            element.set_attribute(name, value);
        }
        for child in children {
            element.add_child(child);
        }
        factory.finish(element)
    }

    /// Assemble with placeholders for any missing required attribute.
    ///
    /// The result is a scaffold meant for further editing; it is not
    /// validated beyond the tag being declared.
    pub fn build_with_defaults(self) -> Result<Element> {
        let Self {
            factory,
            tag,
            attributes,
            children,
        } = self;
        let tag = tag.ok_or_else(|| {
            Error::Schema("element tag must be set before building".to_string())
        })?;

        let mut element = factory.create_with_required_attrs(&tag)?;
        for (name, value) in attributes {
            element.set_attribute(name, value);
        }
        for child in children {
            element.add_child(child);
        }
        Ok(element)
    }
}

/// Attribute summary for interactive display
#[derive(Debug, Clone, Serialize)]
pub struct AttributeInfo {
    /// Attribute name
    pub name: String,
    /// Mapped type tag
    #[serde(rename = "type")]
    pub attr_type: String,
    /// Whether the attribute must be present
    pub required: bool,
}

impl AttributeInfo {
    fn from_definition(def: &AttributeDefinition) -> Self {
        AttributeInfo {
            name: def.name.clone(),
            attr_type: def.attr_type.clone(),
            required: def.required,
        }
    }
}

/// One declared content-model slot for interactive display
#[derive(Debug, Clone, Serialize)]
pub struct ChildInfo {
    /// Element name, or "GROUP:name" for a group reference
    pub reference: String,
    /// Occurrence constraint rendered as "min..max"
    pub occurs: String,
}

/// Everything worth showing about one element declaration
#[derive(Debug, Clone, Serialize)]
pub struct ElementInfo {
    /// Element name
    pub name: String,
    /// Child combination discipline
    pub content_model: String,
    /// Declared attributes in declaration order
    pub attributes: Vec<AttributeInfo>,
    /// Names of required attributes
    pub required_attributes: Vec<String>,
    /// Names of optional attributes
    pub optional_attributes: Vec<String>,
    /// Declared content-model slots with occurrence constraints
    pub children: Vec<ChildInfo>,
    /// Concrete allowed child tags, groups expanded
    pub allowed_children: Vec<String>,
    /// Free-text description from the schema
    pub description: String,
}

/// Schema-aware element creation and lookups.
///
/// Strict creation validates with the schema-structure, data-type and
/// document-structure passes; lenient creation returns the element
/// regardless and leaves [`ElementFactory::validate`] to the caller.
#[derive(Debug)]
pub struct ElementFactory<'a> {
    schema: &'a SchemaModel,
    strict: bool,
}

impl<'a> ElementFactory<'a> {
    /// Strict factory
    pub fn new(schema: &'a SchemaModel) -> Self {
        ElementFactory {
            schema,
            strict: true,
        }
    }

    /// Lenient factory
    pub fn lenient(schema: &'a SchemaModel) -> Self {
        ElementFactory {
            schema,
            strict: false,
        }
    }

    /// Create an element with the given attributes
    pub fn create<K, V>(&self, tag: &str, attrs: impl IntoIterator<Item = (K, V)>) -> Result<Element>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut element = Element::new(tag);
        for (name, value) in attrs {
            element.set_attribute(name, value);
        }
        self.finish(element)
    }

    /// Create an element with every required attribute filled with a
    /// type-appropriate placeholder: `0` for integral types, `0.0` for
    /// floating, `false` for boolean, the current UTC instant for
    /// `dateTime`, an empty string otherwise.
    pub fn create_with_required_attrs(&self, tag: &str) -> Result<Element> {
        let Some(def) = self.schema.element(tag) else {
            return Err(Error::Schema(format!(
                "element '{}' is not defined in the schema",
                tag
            )));
        };

        let mut element = Element::new(tag);
        for attr in def.required_attributes() {
            element.set_attribute(attr.name.as_str(), placeholder(&attr.attr_type));
        }
        Ok(element)
    }

    /// Run the creation-time checks without the strict gate
    pub fn validate(&self, element: &Element) -> Vec<ValidationIssue> {
        let mut issues = SchemaStructureValidator::new().validate(element, self.schema);
        issues.extend(DataTypeValidator::new().validate(element, self.schema));
        issues.extend(DocumentStructureValidator::new().validate(element, self.schema));
        issues
    }

    /// Concrete tags the element may contain, groups expanded
    pub fn allowed_children(&self, tag: &str) -> Vec<String> {
        match self.schema.element(tag) {
            Some(def) => Resolver::new(self.schema).allowed_children(&def.children),
            None => Vec::new(),
        }
    }

    /// Names of the element's required attributes
    pub fn required_attributes(&self, tag: &str) -> Vec<String> {
        self.schema
            .element(tag)
            .map(|def| def.required_attributes().map(|a| a.name.clone()).collect())
            .unwrap_or_default()
    }

    /// Names of the element's optional attributes
    pub fn optional_attributes(&self, tag: &str) -> Vec<String> {
        self.schema
            .element(tag)
            .map(|def| def.optional_attributes().map(|a| a.name.clone()).collect())
            .unwrap_or_default()
    }

    /// Every declared attribute with type and requiredness
    pub fn attribute_info(&self, tag: &str) -> Vec<AttributeInfo> {
        self.schema
            .element(tag)
            .map(|def| {
                def.attributes
                    .iter()
                    .map(AttributeInfo::from_definition)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether `child` may be added under `parent`; disallowed additions
    /// come back as findings rather than errors so interactive callers
    /// can show them inline
    pub fn validate_child_addition(&self, parent: &str, child: &str) -> Vec<ValidationIssue> {
        let Some(def) = self.schema.element(parent) else {
            return vec![ValidationIssue::new(
                ErrorCategory::SchemaError,
                format!(
                    "Parent element '{}' is not defined in the schema. \
                     Fix: use a declared element as the parent.",
                    parent
                ),
            )];
        };

        let allowed = Resolver::new(self.schema).allowed_children(&def.children);
        if allowed.iter().any(|c| c == child) {
            return Vec::new();
        }
        vec![ValidationIssue::new(
            ErrorCategory::StructureError,
            format!(
                "Element '{}' is not allowed as a child of '{}'. \
                 Allowed children for '{}': {}. \
                 Fix: add one of the allowed child elements instead.",
                child,
                parent,
                parent,
                helpers::format_candidates(&allowed)
            ),
        )]
    }

    /// Summary of one declaration, or None for unknown tags
    pub fn element_info(&self, tag: &str) -> Option<ElementInfo> {
        let def = self.schema.element(tag)?;
        Some(ElementInfo {
            name: def.name.clone(),
            content_model: def.content_model.to_string(),
            attributes: def
                .attributes
                .iter()
                .map(AttributeInfo::from_definition)
                .collect(),
            required_attributes: self.required_attributes(tag),
            optional_attributes: self.optional_attributes(tag),
            children: def
                .children
                .iter()
                .map(|slot| ChildInfo {
                    reference: slot.child.to_string(),
                    occurs: slot.occurs.to_string(),
                })
                .collect(),
            allowed_children: self.allowed_children(tag),
            description: def.description.clone().unwrap_or_default(),
        })
    }

    fn finish(&self, element: Element) -> Result<Element> {
        if !self.strict {
            return Ok(element);
        }
        let issues = self.validate(&element);
        if issues.is_empty() {
            return Ok(element);
        }
        let rendered: Vec<String> = issues.iter().map(|i| i.to_string()).collect();
        Err(Error::Schema(format!(
            "validation failed for '{}': {}",
            element.tag,
            rendered.join("; ")
        )))
    }
}

fn placeholder(attr_type: &str) -> String {
    match attr_type {
        "int" | "unsignedInt" | "unsignedShort" => "0".to_string(),
        "double" | "float" => "0.0".to_string(),
        "boolean" => "false".to_string(),
        "dateTime" => Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        _ => String::new(),
    }
}
