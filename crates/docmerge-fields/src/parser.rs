//! WordprocessingML part parser.

#![allow(clippy::unused_self)] // Unit struct methods have &self for API consistency

use std::io::BufRead;

use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesRef, BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::XmlError;
use crate::tree::{NodeId, Tree};

/// Parse a markup part into a [`Tree`].
pub struct WordXmlParser;

impl WordXmlParser {
    /// Create a new parser.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Parse XML text into a tree.
    ///
    /// Keeps the XML declaration, namespace declarations, attribute order and
    /// whitespace so the part can be written back unchanged apart from merges.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not well-formed XML or has no root element.
    pub fn parse(&self, xml: &str) -> Result<Tree, XmlError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(false);

        let mut buf = Vec::new();
        let mut declaration = None;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Decl(e) => {
                    declaration = Some(format!("<?{}?>", String::from_utf8_lossy(&e)));
                }
                Event::Start(e) => {
                    let mut tree = self.root_from(&reader, &e);
                    let root = tree.root();
                    self.parse_children(&mut reader, &mut tree, root)?;
                    tree.declaration = declaration;
                    return Ok(tree);
                }
                Event::Empty(e) => {
                    let mut tree = self.root_from(&reader, &e);
                    tree.declaration = declaration;
                    return Ok(tree);
                }
                Event::Eof => return Err(XmlError::NoRoot),
                // Prolog whitespace, comments and doctype carry nothing we keep
                _ => {}
            }
            buf.clear();
        }
    }

    fn root_from<R: BufRead>(&self, reader: &Reader<R>, e: &BytesStart) -> Tree {
        let mut tree = Tree::new(self.decode_tag(reader, e));
        let root = tree.root();
        for (key, value) in self.decode_attrs(reader, e) {
            tree.set_attr(root, &key, value);
        }
        tree
    }

    fn parse_children<R: BufRead>(
        &self,
        reader: &mut Reader<R>,
        tree: &mut Tree,
        parent: NodeId,
    ) -> Result<(), XmlError> {
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    let child = self.element_from(reader, tree, &e);
                    append(tree, parent, child);
                    self.parse_children(reader, tree, child)?;
                }
                Event::Empty(e) => {
                    let child = self.element_from(reader, tree, &e);
                    append(tree, parent, child);
                }
                Event::Text(e) => {
                    let text = reader.decoder().decode(&e)?.into_owned();
                    append_text(tree, parent, &text);
                }
                Event::GeneralRef(e) => {
                    let text = resolve_reference(&e)?;
                    append_text(tree, parent, &text);
                }
                Event::CData(e) => {
                    let text = String::from_utf8_lossy(&e).into_owned();
                    append_text(tree, parent, &text);
                }
                Event::End(_) => return Ok(()),
                Event::Eof => return Err(XmlError::UnexpectedEof(tree.tag(parent).to_owned())),
                Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
            }
            buf.clear();
        }
    }

    fn element_from<R: BufRead>(
        &self,
        reader: &Reader<R>,
        tree: &mut Tree,
        e: &BytesStart,
    ) -> NodeId {
        let id = tree.create_element(self.decode_tag(reader, e));
        for (key, value) in self.decode_attrs(reader, e) {
            tree.set_attr(id, &key, value);
        }
        id
    }

    fn decode_tag<R: BufRead>(&self, reader: &Reader<R>, e: &BytesStart) -> String {
        let name = e.name();
        reader.decoder().decode(name.as_ref()).map_or_else(
            |_| String::from_utf8_lossy(name.as_ref()).into_owned(),
            std::borrow::Cow::into_owned,
        )
    }

    fn decode_attrs<R: BufRead>(&self, reader: &Reader<R>, e: &BytesStart) -> Vec<(String, String)> {
        e.attributes()
            .flatten()
            .map(|attr| {
                let key = reader.decoder().decode(attr.key.as_ref()).map_or_else(
                    |_| String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
                    std::borrow::Cow::into_owned,
                );
                let value = attr.unescape_value().map_or_else(
                    |_| String::from_utf8_lossy(&attr.value).into_owned(),
                    std::borrow::Cow::into_owned,
                );
                (key, value)
            })
            .collect()
    }
}

impl Default for WordXmlParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// Parse XML text into a tree with [`WordXmlParser`].
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not well-formed XML or has no root element.
    pub fn parse(xml: &str) -> Result<Self, XmlError> {
        WordXmlParser::new().parse(xml)
    }
}

fn append(tree: &mut Tree, parent: NodeId, child: NodeId) {
    // Freshly created nodes are never the root
    let _ = tree.append_child(parent, child);
}

/// Append text to the parent's text or its last child's tail.
fn append_text(tree: &mut Tree, parent: NodeId, text: &str) {
    match tree.children(parent).last().copied() {
        Some(last_child) => tree.push_tail(last_child, text),
        None => tree.push_text(parent, text),
    }
}

/// Text for a character or predefined entity reference.
///
/// Unknown named entities are kept verbatim.
fn resolve_reference(reference: &BytesRef) -> Result<String, XmlError> {
    if let Some(ch) = reference.resolve_char_ref()? {
        return Ok(ch.to_string());
    }
    let name = reference.decode()?;
    Ok(resolve_predefined_entity(&name).map_or_else(|| format!("&{name};"), str::to_owned))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_parse_simple_document() {
        let tree = WordXmlParser::new()
            .parse("<w:body><w:p><w:r><w:t>Hello</w:t></w:r></w:p></w:body>")
            .unwrap();

        let root = tree.root();
        assert_eq!(tree.tag(root), "w:body");
        let p = tree.children(root)[0];
        assert_eq!(tree.tag(p), "w:p");
        let r = tree.children(p)[0];
        let t = tree.children(r)[0];
        assert_eq!(tree.text(t), "Hello");
    }

    #[test]
    fn test_parse_keeps_declaration_and_namespaces() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body/></w:document>"#;
        let tree = WordXmlParser::new().parse(xml).unwrap();

        assert_eq!(
            tree.declaration.as_deref(),
            Some(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#)
        );
        assert_eq!(
            tree.attr(tree.root(), "xmlns:w"),
            Some("http://schemas.openxmlformats.org/wordprocessingml/2006/main")
        );
    }

    #[test]
    fn test_parse_attributes_in_order() {
        let tree = WordXmlParser::new()
            .parse(r#"<w:fldSimple w:instr=" MERGEFIELD name " w:dirty="true"/>"#)
            .unwrap();

        assert_eq!(
            tree.node(tree.root()).attrs,
            vec![
                ("w:instr".to_owned(), " MERGEFIELD name ".to_owned()),
                ("w:dirty".to_owned(), "true".to_owned()),
            ]
        );
    }

    #[test]
    fn test_parse_entities() {
        let tree = WordXmlParser::new()
            .parse("<w:t>a &lt; b &amp; &#x41;&#66;</w:t>")
            .unwrap();
        assert_eq!(tree.text(tree.root()), "a < b & AB");
    }

    #[test]
    fn test_parse_tail_text() {
        let tree = WordXmlParser::new()
            .parse("<w:p>\n  <w:r/>\n</w:p>")
            .unwrap();
        let r = tree.children(tree.root())[0];
        assert_eq!(tree.text(tree.root()), "\n  ");
        assert_eq!(tree.node(r).tail, "\n");
    }

    #[test]
    fn test_parse_without_root() {
        let result = WordXmlParser::new().parse("<?xml version=\"1.0\"?>");
        assert!(matches!(result, Err(XmlError::NoRoot)));
    }

    #[test]
    fn test_parse_mismatched_tags() {
        let result = WordXmlParser::new().parse("<w:p><w:r></w:p>");
        assert!(matches!(result, Err(XmlError::Parse(_))));
    }

    #[test]
    fn test_parse_truncated_document() {
        let result = WordXmlParser::new().parse("<w:body><w:p><w:r><w:t>half");
        assert!(
            matches!(&result, Err(XmlError::UnexpectedEof(tag)) if tag == "w:t"),
            "Expected XmlError::UnexpectedEof, got {result:?}"
        );
    }

    #[test]
    fn test_parse_keeps_unknown_entity() {
        let tree = WordXmlParser::new().parse("<w:t>&nbsp;x</w:t>").unwrap();
        assert_eq!(tree.text(tree.root()), "&nbsp;x");
    }
}
