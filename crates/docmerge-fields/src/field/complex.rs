//! Fields spread over a `begin` / `separate` / `end` marker sequence.

use crate::content::Content;
use crate::error::FieldError;
use crate::markup::{FieldChar, INSTRUCTION_TEXTS, PARAGRAPHS, TEXTS};
use crate::tree::{NodeId, Tree};

/// Field backed by consecutive sibling nodes, from the one holding the
/// `begin` marker through the one holding the `end` marker.
#[derive(Debug, Clone)]
pub(super) struct ComplexField {
    nodes: Vec<NodeId>,
}

impl ComplexField {
    /// Collect siblings forward from the begin marker's parent until one
    /// contains an `end` marker. Returns `None` if the siblings run out first.
    pub(super) fn build(tree: &Tree, begin_marker: NodeId) -> Option<Self> {
        let mut current = tree.parent(begin_marker)?;
        let mut nodes = vec![current];
        while !FieldChar::End.within(tree, current) {
            current = tree.next_element(current)?;
            nodes.push(current);
        }
        Some(Self { nodes })
    }

    pub(super) fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub(super) fn start_node(&self) -> NodeId {
        self.nodes[0]
    }

    pub(super) fn end_node(&self) -> NodeId {
        self.nodes[self.nodes.len() - 1]
    }

    /// Concatenated `w:instrText` fragments across the whole sequence.
    pub(super) fn instruction(&self, tree: &Tree) -> String {
        self.nodes
            .iter()
            .flat_map(|&node| tree.search(node, &INSTRUCTION_TEXTS))
            .map(|fragment| tree.text_content(fragment))
            .collect()
    }

    /// Node right after the one holding the `separate` marker.
    fn pattern_node(&self, tree: &Tree) -> Option<NodeId> {
        let separator = self
            .nodes
            .iter()
            .position(|&node| FieldChar::Separate.within(tree, node))?;
        self.nodes.get(separator + 1).copied()
    }

    pub(super) fn display_anchor(&self, tree: &Tree) -> Option<NodeId> {
        let pattern = self.pattern_node(tree)?;
        tree.search(pattern, &TEXTS).first().copied()
    }

    pub(super) fn replace<E, C>(&self, tree: &mut Tree, content: &C, env: &E) -> Result<(), FieldError>
    where
        E: ?Sized,
        C: Content<E> + ?Sized,
    {
        for &node in &self.nodes {
            tree.ensure_attached(node)?;
        }
        let pattern = self.pattern_node(tree).ok_or(FieldError::NoDisplayAnchor)?;
        let anchor = tree
            .search(pattern, &TEXTS)
            .first()
            .copied()
            .ok_or(FieldError::NoDisplayAnchor)?;
        let paragraph = tree
            .ancestors(pattern, &PARAGRAPHS)
            .first()
            .copied()
            .ok_or(FieldError::NoParagraph)?;

        content
            .append_to(tree, paragraph, anchor, env)
            .map_err(FieldError::Content)?;

        tree.remove(anchor)?;
        for &node in self.nodes.iter().filter(|&&node| node != pattern) {
            tree.remove(node)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::super::{MergeField, Removal};
    use super::*;
    use crate::TextContent;
    use crate::error::TreeError;

    const SPLIT_INSTRUCTION: &str = concat!(
        "<w:p>",
        r#"<w:r><w:t xml:space="preserve">Hello </w:t></w:r>"#,
        r#"<w:r><w:fldChar w:fldCharType="begin"/></w:r>"#,
        r#"<w:r><w:instrText xml:space="preserve"> MERGEFIELD </w:instrText></w:r>"#,
        r#"<w:r><w:instrText xml:space="preserve">x \* MERGEFORMAT </w:instrText></w:r>"#,
        r#"<w:r><w:fldChar w:fldCharType="separate"/></w:r>"#,
        r#"<w:r><w:rPr><w:i/></w:rPr><w:t>«x»</w:t></w:r>"#,
        r#"<w:r><w:fldChar w:fldCharType="end"/></w:r>"#,
        r#"<w:r><w:t>!</w:t></w:r>"#,
        "</w:p>",
    );

    fn build_first(tree: &Tree) -> Option<MergeField> {
        let begin = tree
            .descendants(tree.root())
            .into_iter()
            .find(|&id| FieldChar::of(tree, id) == Some(FieldChar::Begin))
            .unwrap();
        MergeField::complex(tree, begin)
    }

    #[test]
    fn test_build_spans_begin_to_end() {
        let tree = Tree::parse(SPLIT_INSTRUCTION).unwrap();
        let field = build_first(&tree).unwrap();
        let runs = tree.children(tree.root());

        assert_eq!(field.nodes(), &runs[1..7]);
        assert_eq!(field.start_node(), runs[1]);
        assert_eq!(field.end_node(), runs[6]);
    }

    #[test]
    fn test_instruction_fragments_concatenate() {
        let tree = Tree::parse(SPLIT_INSTRUCTION).unwrap();
        let field = build_first(&tree).unwrap();

        assert_eq!(field.raw_instruction(), " MERGEFIELD x \\* MERGEFORMAT ");
        assert!(field.valid(&tree));
        assert_eq!(field.expression(), Some("x"));
    }

    #[test]
    fn test_unterminated_field_is_not_built() {
        let tree = Tree::parse(concat!(
            "<w:p>",
            r#"<w:r><w:fldChar w:fldCharType="begin"/></w:r>"#,
            r#"<w:r><w:instrText> MERGEFIELD x \* MERGEFORMAT </w:instrText></w:r>"#,
            r#"<w:r><w:fldChar w:fldCharType="separate"/></w:r>"#,
            r#"<w:r><w:t>«x»</w:t></w:r>"#,
            "</w:p>",
        ))
        .unwrap();

        assert!(build_first(&tree).is_none());
    }

    #[test]
    fn test_invalid_without_separator() {
        let tree = Tree::parse(concat!(
            "<w:p>",
            r#"<w:r><w:fldChar w:fldCharType="begin"/></w:r>"#,
            r#"<w:r><w:instrText> MERGEFIELD x \* MERGEFORMAT </w:instrText></w:r>"#,
            r#"<w:r><w:fldChar w:fldCharType="end"/></w:r>"#,
            "</w:p>",
        ))
        .unwrap();
        let field = build_first(&tree).unwrap();

        assert_eq!(field.expression(), Some("x"));
        assert!(!field.valid(&tree));
    }

    #[test]
    fn test_invalid_with_empty_display() {
        let tree = Tree::parse(concat!(
            "<w:p>",
            r#"<w:r><w:fldChar w:fldCharType="begin"/></w:r>"#,
            r#"<w:r><w:instrText> MERGEFIELD x \* MERGEFORMAT </w:instrText></w:r>"#,
            r#"<w:r><w:fldChar w:fldCharType="separate"/></w:r>"#,
            r#"<w:r><w:fldChar w:fldCharType="end"/></w:r>"#,
            "</w:p>",
        ))
        .unwrap();
        let field = build_first(&tree).unwrap();

        assert!(!field.valid(&tree));
    }

    #[test]
    fn test_replace_keeps_only_pattern_node() {
        let mut tree = Tree::parse(SPLIT_INSTRUCTION).unwrap();
        let field = build_first(&tree).unwrap();

        field.replace(&mut tree, &TextContent::new("world"), &()).unwrap();

        assert_eq!(
            tree.to_xml(),
            concat!(
                "<w:p>",
                r#"<w:r><w:t xml:space="preserve">Hello </w:t></w:r>"#,
                "<w:r><w:rPr><w:i/></w:rPr><w:t>world</w:t></w:r>",
                "<w:r><w:t>!</w:t></w:r>",
                "</w:p>",
            )
        );
    }

    #[test]
    fn test_replace_removes_trailing_display_runs() {
        let mut tree = Tree::parse(concat!(
            "<w:p>",
            r#"<w:r><w:fldChar w:fldCharType="begin"/></w:r>"#,
            r#"<w:r><w:instrText> MERGEFIELD x \* MERGEFORMAT </w:instrText></w:r>"#,
            r#"<w:r><w:fldChar w:fldCharType="separate"/></w:r>"#,
            r#"<w:r><w:t>«</w:t></w:r>"#,
            r#"<w:r><w:t>x»</w:t></w:r>"#,
            r#"<w:r><w:fldChar w:fldCharType="end"/></w:r>"#,
            "</w:p>",
        ))
        .unwrap();
        let field = build_first(&tree).unwrap();

        field.replace(&mut tree, &TextContent::new("42"), &()).unwrap();

        assert_eq!(tree.to_xml(), "<w:p><w:r><w:t>42</w:t></w:r></w:p>");
    }

    #[test]
    fn test_replace_after_remove_reports_detached() {
        let mut tree = Tree::parse(SPLIT_INSTRUCTION).unwrap();
        let mut field = build_first(&tree).unwrap();
        field.remove(&mut tree).unwrap();

        let err = field
            .replace(&mut tree, &TextContent::new("world"), &())
            .unwrap_err();
        assert!(matches!(err, FieldError::Tree(TreeError::Detached(_))));
    }

    #[test]
    fn test_remove_deletes_whole_sequence() {
        let mut tree = Tree::parse(SPLIT_INSTRUCTION).unwrap();
        let mut field = build_first(&tree).unwrap();

        assert_eq!(field.remove(&mut tree).unwrap(), Removal::Removed);
        assert_eq!(
            tree.to_xml(),
            r#"<w:p><w:r><w:t xml:space="preserve">Hello </w:t></w:r><w:r><w:t>!</w:t></w:r></w:p>"#
        );
    }

    #[test]
    fn test_remove_deferred_keeps_whole_sequence() {
        let mut tree = Tree::parse(SPLIT_INSTRUCTION).unwrap();
        let mut field = build_first(&tree).unwrap();
        field.set_block_reference_count(2);

        assert_eq!(
            field.remove(&mut tree).unwrap(),
            Removal::Deferred { remaining: 1 }
        );
        assert_eq!(tree.to_xml(), SPLIT_INSTRUCTION);
    }
}
