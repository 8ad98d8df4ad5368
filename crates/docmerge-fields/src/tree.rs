//! Arena-backed markup tree for WordprocessingML parts.
//!
//! Nodes are owned by the [`Tree`] and addressed by [`NodeId`]. Removing a node
//! unlinks it from its parent but keeps its slot, so handles held by callers stay
//! valid and can be checked with [`Tree::is_attached`].

use std::fmt;

use crate::error::TreeError;
use crate::selector::Selector;

/// Handle to a node inside a [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Element node in the markup tree.
#[derive(Debug, Clone, Default)]
pub struct TreeNode {
    /// Qualified tag name (e.g. `w:p`).
    pub tag: String,
    /// Direct text content before the first child.
    pub text: String,
    /// Text after the element, inside its parent (XML tail).
    pub tail: String,
    /// Attributes in document order.
    pub attrs: Vec<(String, String)>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl TreeNode {
    fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Get an attribute value by qualified name.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Parent node, `None` for the root and for unlinked nodes.
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child nodes in document order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Markup document held as an arena of [`TreeNode`]s.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<TreeNode>,
    root: NodeId,
    pub(crate) declaration: Option<String>,
}

impl Tree {
    /// Create a tree holding a single root element.
    #[must_use]
    pub fn new(root_tag: impl Into<String>) -> Self {
        Self {
            nodes: vec![TreeNode::new(root_tag)],
            root: NodeId(0),
            declaration: None,
        }
    }

    /// Root element.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Borrow a node.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this tree.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut TreeNode {
        &mut self.nodes[id.0]
    }

    /// Tag name of a node.
    #[must_use]
    pub fn tag(&self, id: NodeId) -> &str {
        &self.node(id).tag
    }

    /// Attribute value of a node.
    #[must_use]
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.node(id).attr(name)
    }

    /// Set or overwrite an attribute, keeping its original position.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        let value = value.into();
        let attrs = &mut self.node_mut(id).attrs;
        match attrs.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value,
            None => attrs.push((name.to_owned(), value)),
        }
    }

    /// Direct text of a node.
    #[must_use]
    pub fn text(&self, id: NodeId) -> &str {
        &self.node(id).text
    }

    /// Replace the direct text of a node.
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        self.node_mut(id).text = text.into();
    }

    pub(crate) fn push_text(&mut self, id: NodeId, text: &str) {
        self.node_mut(id).text.push_str(text);
    }

    /// Text following the node inside its parent.
    #[must_use]
    pub fn tail(&self, id: NodeId) -> &str {
        &self.node(id).tail
    }

    pub(crate) fn push_tail(&mut self, id: NodeId, text: &str) {
        self.node_mut(id).tail.push_str(text);
    }

    /// Text of the node and all descendants, excluding the node's own tail.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let node = self.node(id);
        out.push_str(&node.text);
        for &child in &node.children {
            self.collect_text(child, out);
            out.push_str(&self.node(child).tail);
        }
    }

    /// Parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Children of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Next element sibling.
    #[must_use]
    pub fn next_element(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let position = siblings.iter().position(|&sibling| sibling == id)?;
        siblings.get(position + 1).copied()
    }

    /// Ancestors matching `selector`, nearest first.
    #[must_use]
    pub fn ancestors(&self, id: NodeId, selector: &Selector) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut current = self.parent(id);
        while let Some(ancestor) = current {
            if selector.matches(self.node(ancestor)) {
                found.push(ancestor);
            }
            current = self.parent(ancestor);
        }
        found
    }

    /// Descendants matching `selector` in document order, excluding `id` itself.
    #[must_use]
    pub fn search(&self, id: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .skip(1)
            .filter(|&descendant| selector.matches(self.node(descendant)))
            .collect()
    }

    /// The node and all its descendants in document order.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            order.push(current);
            stack.extend(self.children(current).iter().rev());
        }
        order
    }

    /// Whether the node is still reachable from the root.
    #[must_use]
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.root {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Create an unattached element.
    pub fn create_element(&mut self, tag: impl Into<String>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(TreeNode::new(tag));
        id
    }

    /// Append `child` as the last child of `parent`, moving it if already linked.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::Root`] when `child` is the root.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        if child == self.root {
            return Err(TreeError::Root);
        }
        self.unlink(child);
        self.node_mut(parent).children.push(child);
        self.node_mut(child).parent = Some(parent);
        Ok(())
    }

    /// Insert `node` immediately before `anchor`, moving it if already linked.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::Detached`] when `anchor` is not in the document.
    pub fn insert_before(&mut self, anchor: NodeId, node: NodeId) -> Result<(), TreeError> {
        if node == self.root {
            return Err(TreeError::Root);
        }
        self.ensure_attached(anchor)?;
        let parent = self.parent(anchor).ok_or(TreeError::Root)?;
        self.unlink(node);
        let position = self.position_in_parent(parent, anchor);
        self.node_mut(parent).children.insert(position, node);
        self.node_mut(node).parent = Some(parent);
        Ok(())
    }

    /// Remove a node and its subtree from the document.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::Detached`] when the node was already removed and
    /// [`TreeError::Root`] for the root.
    pub fn remove(&mut self, id: NodeId) -> Result<(), TreeError> {
        if id == self.root {
            return Err(TreeError::Root);
        }
        self.ensure_attached(id)?;
        self.unlink(id);
        Ok(())
    }

    /// Replace a node with its own children.
    ///
    /// The node's text and tail are kept in place around the spliced children.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::Detached`] when the node was already removed and
    /// [`TreeError::Root`] for the root.
    pub fn replace_with_children(&mut self, id: NodeId) -> Result<(), TreeError> {
        if id == self.root {
            return Err(TreeError::Root);
        }
        self.ensure_attached(id)?;
        let Some(parent) = self.parent(id) else {
            return Err(TreeError::Root);
        };

        let position = self.position_in_parent(parent, id);
        let children = std::mem::take(&mut self.node_mut(id).children);
        let text = std::mem::take(&mut self.node_mut(id).text);
        let tail = std::mem::take(&mut self.node_mut(id).tail);

        self.push_text_before(parent, position, &text);

        for &child in &children {
            self.node_mut(child).parent = Some(parent);
        }
        let last_child = children.last().copied();
        drop(
            self.node_mut(parent)
                .children
                .splice(position..=position, children.iter().copied()),
        );
        self.node_mut(id).parent = None;

        match last_child {
            Some(last) => self.push_tail(last, &tail),
            None => self.push_text_before(parent, position, &tail),
        }
        Ok(())
    }

    /// Fail with [`TreeError::Detached`] unless the node is in the document.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::Detached`] when the node is unreachable from the root.
    pub fn ensure_attached(&self, id: NodeId) -> Result<(), TreeError> {
        if self.is_attached(id) {
            Ok(())
        } else {
            Err(TreeError::Detached(id))
        }
    }

    /// Append text to whatever precedes child slot `position` of `parent`.
    fn push_text_before(&mut self, parent: NodeId, position: usize, text: &str) {
        if text.is_empty() {
            return;
        }
        match position
            .checked_sub(1)
            .and_then(|prev| self.children(parent).get(prev).copied())
        {
            Some(previous) => self.push_tail(previous, text),
            None => self.push_text(parent, text),
        }
    }

    fn position_in_parent(&self, parent: NodeId, child: NodeId) -> usize {
        self.children(parent)
            .iter()
            .position(|&sibling| sibling == child)
            .unwrap_or(0)
    }

    fn unlink(&mut self, id: NodeId) {
        if let Some(parent) = self.node_mut(id).parent.take() {
            self.node_mut(parent).children.retain(|&child| child != id);
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn sample() -> (Tree, NodeId, NodeId, NodeId) {
        let mut tree = Tree::new("w:body");
        let p = tree.create_element("w:p");
        tree.append_child(tree.root(), p).unwrap();
        let r1 = tree.create_element("w:r");
        let r2 = tree.create_element("w:r");
        tree.append_child(p, r1).unwrap();
        tree.append_child(p, r2).unwrap();
        (tree, p, r1, r2)
    }

    #[test]
    fn test_next_element() {
        let (tree, p, r1, r2) = sample();
        assert_eq!(tree.next_element(r1), Some(r2));
        assert_eq!(tree.next_element(r2), None);
        assert_eq!(tree.next_element(p), None);
    }

    #[test]
    fn test_descendants_in_document_order() {
        let (tree, p, r1, r2) = sample();
        assert_eq!(tree.descendants(tree.root()), vec![tree.root(), p, r1, r2]);
    }

    #[test]
    fn test_ancestors_nearest_first() {
        let (tree, p, r1, _) = sample();
        let any_p = Selector::tag("w:p");
        assert_eq!(tree.ancestors(r1, &any_p), vec![p]);
        assert!(tree.ancestors(p, &any_p).is_empty());
    }

    #[test]
    fn test_remove_detaches_subtree() {
        let (mut tree, p, r1, _) = sample();
        tree.remove(p).unwrap();
        assert!(!tree.is_attached(p));
        assert!(!tree.is_attached(r1));
        assert_eq!(tree.remove(r1), Err(TreeError::Detached(r1)));
    }

    #[test]
    fn test_remove_root_fails() {
        let mut tree = Tree::new("w:body");
        assert_eq!(tree.remove(tree.root()), Err(TreeError::Root));
    }

    #[test]
    fn test_replace_with_children_splices_in_place() {
        let mut tree = Tree::new("w:p");
        let before = tree.create_element("w:r");
        let wrapper = tree.create_element("w:fldSimple");
        let inner = tree.create_element("w:r");
        let after = tree.create_element("w:r");
        tree.append_child(tree.root(), before).unwrap();
        tree.append_child(tree.root(), wrapper).unwrap();
        tree.append_child(wrapper, inner).unwrap();
        tree.append_child(tree.root(), after).unwrap();
        tree.node_mut(wrapper).tail = "\n".to_owned();

        tree.replace_with_children(wrapper).unwrap();

        assert_eq!(tree.children(tree.root()), &[before, inner, after]);
        assert_eq!(tree.parent(inner), Some(tree.root()));
        assert_eq!(tree.node(inner).tail, "\n");
        assert!(!tree.is_attached(wrapper));
    }

    #[test]
    fn test_insert_before() {
        let (mut tree, p, r1, r2) = sample();
        let new_run = tree.create_element("w:r");
        tree.insert_before(r2, new_run).unwrap();
        assert_eq!(tree.children(p), &[r1, new_run, r2]);
    }

    #[test]
    fn test_insert_before_detached_anchor() {
        let (mut tree, _, r1, _) = sample();
        tree.remove(r1).unwrap();
        let new_run = tree.create_element("w:r");
        assert_eq!(
            tree.insert_before(r1, new_run),
            Err(TreeError::Detached(r1))
        );
    }

    #[test]
    fn test_text_content() {
        let (mut tree, p, r1, r2) = sample();
        tree.set_text(r1, "Hello");
        tree.node_mut(r1).tail = " ".to_owned();
        tree.set_text(r2, "World");
        assert_eq!(tree.text_content(p), "Hello World");
    }

    #[test]
    fn test_set_attr_keeps_position() {
        let mut tree = Tree::new("w:fldChar");
        let root = tree.root();
        tree.set_attr(root, "w:fldCharType", "begin");
        tree.set_attr(root, "w:dirty", "true");
        tree.set_attr(root, "w:fldCharType", "end");
        assert_eq!(
            tree.node(root).attrs,
            vec![
                ("w:fldCharType".to_owned(), "end".to_owned()),
                ("w:dirty".to_owned(), "true".to_owned()),
            ]
        );
    }
}
