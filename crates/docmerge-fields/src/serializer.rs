//! WordprocessingML part serializer.

#![allow(clippy::unused_self)] // Unit struct methods have &self for API consistency

use quick_xml::escape::{escape, partial_escape};

use crate::tree::{NodeId, Tree};

/// Serialize a [`Tree`] back to XML text.
pub struct WordXmlSerializer;

impl WordXmlSerializer {
    /// Create a new serializer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Serialize the whole document, including the XML declaration if one was parsed.
    pub fn serialize(&self, tree: &Tree) -> String {
        let mut out = String::with_capacity(4096);
        if let Some(declaration) = &tree.declaration {
            out.push_str(declaration);
            out.push('\n');
        }
        serialize_node(tree, tree.root(), &mut out);
        out
    }

    /// Serialize a single element and its subtree, without its tail.
    pub fn serialize_node(&self, tree: &Tree, id: NodeId) -> String {
        let mut out = String::new();
        serialize_node(tree, id, &mut out);
        out
    }
}

impl Default for WordXmlSerializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// Serialize the document with [`WordXmlSerializer`].
    #[must_use]
    pub fn to_xml(&self) -> String {
        WordXmlSerializer::new().serialize(self)
    }
}

/// Serialize a single node recursively.
fn serialize_node(tree: &Tree, id: NodeId, out: &mut String) {
    let node = tree.node(id);

    out.push('<');
    out.push_str(&node.tag);

    for (key, value) in &node.attrs {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape(value.as_str()));
        out.push('"');
    }

    if node.children().is_empty() && node.text.is_empty() {
        out.push_str("/>");
        return;
    }

    out.push('>');
    out.push_str(&partial_escape(node.text.as_str()));

    for &child in node.children() {
        serialize_node(tree, child, out);
        out.push_str(&partial_escape(tree.tail(child)));
    }

    out.push_str("</");
    out.push_str(&node.tag);
    out.push('>');
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::parser::WordXmlParser;

    fn round_trip(xml: &str) -> String {
        let tree = WordXmlParser::new().parse(xml).unwrap();
        WordXmlSerializer::new().serialize(&tree)
    }

    #[test]
    fn test_serialize_nested_elements() {
        let xml = "<w:p><w:r><w:t>Hello</w:t></w:r></w:p>";
        assert_eq!(round_trip(xml), xml);
    }

    #[test]
    fn test_serialize_self_closing() {
        assert_eq!(
            round_trip(r#"<w:r><w:fldChar w:fldCharType="begin"></w:fldChar></w:r>"#),
            r#"<w:r><w:fldChar w:fldCharType="begin"/></w:r>"#
        );
    }

    #[test]
    fn test_serialize_declaration_and_whitespace() {
        let xml = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<w:body>\n  <w:p/>\n</w:body>";
        assert_eq!(round_trip(xml), xml);
    }

    #[test]
    fn test_escape_special_chars() {
        let mut tree = Tree::new("w:t");
        let root = tree.root();
        tree.set_text(root, "a < b & c > d");
        tree.set_attr(root, "w:val", "\"q\" & 'r'");

        assert_eq!(
            WordXmlSerializer::new().serialize(&tree),
            r#"<w:t w:val="&quot;q&quot; &amp; &apos;r&apos;">a &lt; b &amp; c &gt; d</w:t>"#
        );
    }

    #[test]
    fn test_serialize_node_without_tail() {
        let tree = WordXmlParser::new()
            .parse("<w:p><w:r><w:t>x</w:t></w:r> </w:p>")
            .unwrap();
        let run = tree.children(tree.root())[0];
        assert_eq!(
            WordXmlSerializer::new().serialize_node(&tree, run),
            "<w:r><w:t>x</w:t></w:r>"
        );
    }
}
