//! XML reading and writing for scenario documents
//!
//! Parsing is a single streaming pass over quick-xml events with an explicit
//! element stack; no DOM library is involved. Writing produces either compact
//! markup or a two-space indented form with an XML declaration.

use std::path::Path;

use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;

use crate::error::{Error, ParseError, Result};
use crate::limits::Limits;
use crate::tree::Element;

/// Parse an XML string into an element tree using default limits
pub fn read_document(xml: &str) -> Result<Element> {
    read_document_with_limits(xml, &Limits::default())
}

/// Parse an XML string into an element tree, enforcing the given limits
pub fn read_document_with_limits(xml: &str, limits: &Limits) -> Result<Element> {
    limits.check_document_size(xml.len())?;

    let mut reader = Reader::from_reader(xml.as_bytes());
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut element_stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let element = element_from_tag(e, &reader)?;
                limits.check_tree_depth(element_stack.len() + 1)?;
                element_stack.push(element);
            }
            Ok(Event::Empty(ref e)) => {
                let element = element_from_tag(e, &reader)?;
                limits.check_tree_depth(element_stack.len() + 1)?;
                attach(element, &mut element_stack, &mut root, &reader)?;
            }
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().map_err(|err| parse_error(&reader, &err))?;
                let text = text.trim();
                if !text.is_empty() {
                    if let Some(current) = element_stack.last_mut() {
                        current.text = Some(text.to_string());
                    }
                }
            }
            Ok(Event::End(_)) => {
                let element = element_stack.pop().ok_or_else(|| {
                    Error::Parse(
                        ParseError::new("unexpected closing tag")
                            .with_location(format!("byte offset {}", reader.buffer_position())),
                    )
                })?;
                attach(element, &mut element_stack, &mut root, &reader)?;
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(parse_error(&reader, &e)),
            _ => {}
        }
        buf.clear();
    }

    let root = root.ok_or_else(|| Error::Parse(ParseError::new("document has no root element")))?;
    debug!("parsed document with {} elements", root.node_count());
    Ok(root)
}

/// Read and parse a scenario file
pub fn read_file(path: impl AsRef<Path>) -> Result<Element> {
    let content = std::fs::read_to_string(path)?;
    read_document(&content)
}

/// Serialize an element tree to compact XML markup
pub fn write_document(element: &Element) -> String {
    let mut out = String::new();
    write_compact(element, &mut out);
    out
}

/// Serialize an element tree to indented XML with a declaration
pub fn write_document_pretty(element: &Element) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    write_indented(element, 0, &mut out);
    out.push('\n');
    out
}

/// Write an element tree to a file in indented form
pub fn write_file(path: impl AsRef<Path>, element: &Element) -> Result<()> {
    std::fs::write(path, write_document_pretty(element))?;
    Ok(())
}

fn element_from_tag(
    tag: &quick_xml::events::BytesStart<'_>,
    reader: &Reader<&[u8]>,
) -> Result<Element> {
    let name = String::from_utf8_lossy(tag.name().as_ref()).to_string();
    let mut element = Element::new(name);

    for attr in tag.attributes() {
        let attr = attr.map_err(|err| {
            Error::Parse(
                ParseError::new(format!("malformed attribute: {}", err))
                    .with_location(format!("byte offset {}", reader.buffer_position())),
            )
        })?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr
            .unescape_value()
            .map_err(|err| parse_error(reader, &err))?
            .to_string();
        element.attributes.insert(key, value);
    }

    Ok(element)
}

fn attach(
    element: Element,
    element_stack: &mut [Element],
    root: &mut Option<Element>,
    reader: &Reader<&[u8]>,
) -> Result<()> {
    if let Some(parent) = element_stack.last_mut() {
        parent.children.push(element);
    } else if root.is_none() {
        *root = Some(element);
    } else {
        return Err(Error::Parse(
            ParseError::new("document has more than one root element")
                .with_location(format!("byte offset {}", reader.buffer_position())),
        ));
    }
    Ok(())
}

fn parse_error(reader: &Reader<&[u8]>, err: &dyn std::fmt::Display) -> Error {
    Error::Parse(
        ParseError::new(format!("malformed XML: {}", err))
            .with_location(format!("byte offset {}", reader.buffer_position())),
    )
}

fn write_compact(element: &Element, out: &mut String) {
    write_open_tag(element, out);
    if element.children.is_empty() && element.text.is_none() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    if let Some(ref text) = element.text {
        out.push_str(&escape(text));
    }
    for child in &element.children {
        write_compact(child, out);
    }
    out.push_str("</");
    out.push_str(&element.tag);
    out.push('>');
}

fn write_indented(element: &Element, depth: usize, out: &mut String) {
    let pad = "  ".repeat(depth);
    out.push_str(&pad);
    write_open_tag(element, out);

    if element.children.is_empty() {
        match element.text {
            Some(ref text) => {
                out.push('>');
                out.push_str(&escape(text));
                out.push_str("</");
                out.push_str(&element.tag);
                out.push('>');
            }
            None => out.push_str("/>"),
        }
        return;
    }

    out.push('>');
    if let Some(ref text) = element.text {
        out.push('\n');
        out.push_str(&pad);
        out.push_str("  ");
        out.push_str(&escape(text));
    }
    for child in &element.children {
        out.push('\n');
        write_indented(child, depth + 1, out);
    }
    out.push('\n');
    out.push_str(&pad);
    out.push_str("</");
    out.push_str(&element.tag);
    out.push('>');
}

fn write_open_tag(element: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&element.tag);
    for (name, value) in &element.attributes {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&escape(value));
        out.push('"');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_simple_document() {
        let xml = r#"<OpenSCENARIO>
            <FileHeader revMajor="1" revMinor="3" author="test"/>
            <Entities/>
        </OpenSCENARIO>"#;

        let doc = read_document(xml).unwrap();
        assert_eq!(doc.tag, "OpenSCENARIO");
        assert_eq!(doc.children.len(), 2);

        let header = doc.child_by_tag("FileHeader").unwrap();
        assert_eq!(header.attribute("revMajor"), Some("1"));
        assert_eq!(header.attribute("author"), Some("test"));
    }

    #[test]
    fn test_read_text_content() {
        let doc = read_document("<Remark>night scene</Remark>").unwrap();
        assert_eq!(doc.text.as_deref(), Some("night scene"));
    }

    #[test]
    fn test_read_unescapes_entities() {
        let doc = read_document(r#"<Act name="a &amp; b &lt;x&gt;"/>"#).unwrap();
        assert_eq!(doc.attribute("name"), Some("a & b <x>"));
    }

    #[test]
    fn test_read_rejects_mismatched_tags() {
        let result = read_document("<Story><Act></Story></Act>");
        assert!(result.is_err());
    }

    #[test]
    fn test_read_rejects_multiple_roots() {
        let result = read_document("<A/><B/>");
        assert!(matches!(result, Err(Error::Parse(_))));
    }

    #[test]
    fn test_read_rejects_empty_input() {
        assert!(read_document("").is_err());
        assert!(read_document("   \n ").is_err());
    }

    #[test]
    fn test_tree_depth_limit() {
        let limits = Limits {
            max_tree_depth: 3,
            ..Limits::default()
        };
        let xml = "<A><B><C><D/></C></B></A>";
        let result = read_document_with_limits(xml, &limits);
        assert!(matches!(result, Err(Error::LimitExceeded(_))));

        let shallow = read_document_with_limits("<A><B><C/></B></A>", &limits);
        assert!(shallow.is_ok());
    }

    #[test]
    fn test_write_compact() {
        let doc = Element::new("Entities").with_child(
            Element::new("ScenarioObject")
                .with_attribute("name", "ego")
                .with_child(Element::new("CatalogReference")),
        );

        let xml = write_document(&doc);
        assert_eq!(
            xml,
            "<Entities><ScenarioObject name=\"ego\"><CatalogReference/></ScenarioObject></Entities>"
        );
    }

    #[test]
    fn test_write_escapes_special_characters() {
        let doc = Element::new("ParameterDeclaration")
            .with_attribute("value", "a<b & \"c\"")
            .with_text("x > y");

        let xml = write_document(&doc);
        assert!(xml.contains("a&lt;b &amp; &quot;c&quot;"));
        assert!(xml.contains("x &gt; y"));
    }

    #[test]
    fn test_write_pretty_has_declaration_and_indent() {
        let doc = Element::new("OpenSCENARIO")
            .with_child(Element::new("FileHeader").with_attribute("author", "t"))
            .with_child(Element::new("Entities").with_child(Element::new("ScenarioObject")));

        let xml = write_document_pretty(&doc);
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n"));
        assert!(xml.contains("\n  <FileHeader author=\"t\"/>"));
        assert!(xml.contains("\n    <ScenarioObject/>"));
        assert!(xml.ends_with("</OpenSCENARIO>\n"));
    }

    #[test]
    fn test_write_then_read_preserves_structure() {
        let original = Element::new("Story")
            .with_attribute("name", "main")
            .with_child(
                Element::new("Act")
                    .with_attribute("name", "act1")
                    .with_child(Element::new("ManeuverGroup").with_text("note")),
            );

        let parsed = read_document(&write_document(&original)).unwrap();
        assert_eq!(parsed.tag, "Story");
        assert_eq!(parsed.attribute("name"), Some("main"));
        assert_eq!(parsed.children[0].children[0].text.as_deref(), Some("note"));
    }

    #[test]
    fn test_read_file_missing_path() {
        let result = read_file("/nonexistent/scenario.xosc");
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
