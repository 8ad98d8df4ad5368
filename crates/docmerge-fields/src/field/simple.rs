//! `w:fldSimple` fields.

use crate::content::Content;
use crate::error::FieldError;
use crate::markup::{FIELD_INSTRUCTION, PARAGRAPHS, RUNS, TEXTS};
use crate::tree::{NodeId, Tree};

/// Field backed by a single element whose instruction is an attribute.
#[derive(Debug, Clone)]
pub(super) struct SimpleField {
    node: NodeId,
}

impl SimpleField {
    pub(super) fn new(node: NodeId) -> Self {
        Self { node }
    }

    pub(super) fn node(&self) -> NodeId {
        self.node
    }

    pub(super) fn nodes(&self) -> &[NodeId] {
        std::slice::from_ref(&self.node)
    }

    pub(super) fn instruction(&self, tree: &Tree) -> String {
        tree.attr(self.node, FIELD_INSTRUCTION)
            .unwrap_or_default()
            .to_owned()
    }

    /// First text node of the first run; later runs are discarded on replace.
    pub(super) fn display_anchor(&self, tree: &Tree) -> Option<NodeId> {
        let scope = tree.search(self.node, &RUNS).first().copied().unwrap_or(self.node);
        tree.search(scope, &TEXTS).first().copied()
    }

    pub(super) fn replace<E, C>(&self, tree: &mut Tree, content: &C, env: &E) -> Result<(), FieldError>
    where
        E: ?Sized,
        C: Content<E> + ?Sized,
    {
        tree.ensure_attached(self.node)?;
        let anchor = self
            .display_anchor(tree)
            .ok_or(FieldError::NoDisplayAnchor)?;
        let paragraph = tree
            .ancestors(self.node, &PARAGRAPHS)
            .first()
            .copied()
            .ok_or(FieldError::NoParagraph)?;
        let extra_runs: Vec<NodeId> = tree.search(self.node, &RUNS).into_iter().skip(1).collect();

        content
            .append_to(tree, paragraph, anchor, env)
            .map_err(FieldError::Content)?;

        for run in extra_runs {
            if tree.is_attached(run) {
                tree.remove(run)?;
            }
        }
        tree.remove(anchor)?;
        tree.replace_with_children(self.node)?;
        Ok(())
    }
}
