//! Merge field descriptors.
//!
//! A [`MergeField`] wraps either a simple field (one `w:fldSimple` element
//! carrying its instruction as an attribute) or a complex field (the sibling
//! nodes bracketed by `begin` and `end` field characters). Both shapes expose
//! the same operations.
//!
//! Descriptors hold node handles into the tree they were scanned from and are
//! meant to be consumed once: after `replace` or a completed `remove`, their
//! backing nodes may be gone and further mutations fail with
//! [`TreeError::Detached`](crate::TreeError::Detached).

mod complex;
mod simple;

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use self::complex::ComplexField;
use self::simple::SimpleField;
use crate::content::Content;
use crate::error::FieldError;
use crate::selector::Selector;
use crate::tree::{NodeId, Tree};

/// `MERGEFIELD <name> \* MERGEFORMAT` with a single whitespace-free name token.
static KEY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*MERGEFIELD\s+(\S+)\s+\\\*\s+MERGEFORMAT\s*$")
        .expect("invalid merge field regex")
});

/// Extract the field name from a raw field instruction.
///
/// Returns `None` for any other field code (`PAGE`, `REF`, `DATE`, ...) and for
/// malformed `MERGEFIELD` instructions. Quoted or whitespace-containing names
/// are not supported.
#[must_use]
pub fn parse_expression(instruction: &str) -> Option<&str> {
    KEY_PATTERN
        .captures(instruction)
        .and_then(|caps| caps.get(1))
        .map(|name| name.as_str())
}

/// Markup shape of a merge field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Single `w:fldSimple` element.
    Simple,
    /// `begin`/`separate`/`end` marker sequence.
    Complex,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple => f.pad("simple"),
            Self::Complex => f.pad("complex"),
        }
    }
}

/// Outcome of a removal request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// The nodes were deleted from the tree.
    Removed,
    /// The block is still referenced; the count was decremented and nothing was deleted.
    Deferred {
        /// Reference count after decrementing.
        remaining: u32,
    },
}

/// A validated merge field found by [`scan`](crate::scan).
#[derive(Debug, Clone)]
pub struct MergeField {
    shape: FieldShape,
    raw_instruction: String,
    block_reference_count: u32,
}

#[derive(Debug, Clone)]
enum FieldShape {
    Simple(SimpleField),
    Complex(ComplexField),
}

impl MergeField {
    pub(crate) fn simple(tree: &Tree, node: NodeId) -> Self {
        let field = SimpleField::new(node);
        let raw_instruction = field.instruction(tree);
        Self::new(FieldShape::Simple(field), raw_instruction)
    }

    /// Build a complex field from its `begin` marker; `None` if it is never closed.
    pub(crate) fn complex(tree: &Tree, begin_marker: NodeId) -> Option<Self> {
        let field = ComplexField::build(tree, begin_marker)?;
        let raw_instruction = field.instruction(tree);
        Some(Self::new(FieldShape::Complex(field), raw_instruction))
    }

    fn new(shape: FieldShape, raw_instruction: String) -> Self {
        Self {
            shape,
            raw_instruction,
            block_reference_count: 0,
        }
    }

    /// Markup shape of this field.
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        match self.shape {
            FieldShape::Simple(_) => FieldKind::Simple,
            FieldShape::Complex(_) => FieldKind::Complex,
        }
    }

    /// Instruction text as found in the markup.
    #[must_use]
    pub fn raw_instruction(&self) -> &str {
        &self.raw_instruction
    }

    /// Field name when the instruction is a well-formed `MERGEFIELD`.
    #[must_use]
    pub fn expression(&self) -> Option<&str> {
        parse_expression(&self.raw_instruction)
    }

    /// Whether this is a genuine merge field that can be replaced.
    ///
    /// Requires display text to render into (for complex fields: a separator
    /// followed by a node holding text) and a matching instruction.
    #[must_use]
    pub fn valid(&self, tree: &Tree) -> bool {
        let well_formed = match &self.shape {
            FieldShape::Simple(field) => field.display_anchor(tree).is_some(),
            FieldShape::Complex(field) => field.display_anchor(tree).is_some(),
        };
        well_formed && self.expression().is_some()
    }

    /// Number of outstanding removal votes on the enclosing block.
    #[must_use]
    pub fn block_reference_count(&self) -> u32 {
        self.block_reference_count
    }

    /// Set how many removal votes must arrive before the block is deleted.
    pub fn set_block_reference_count(&mut self, count: u32) {
        self.block_reference_count = count;
    }

    /// Backing nodes in document order.
    #[must_use]
    pub fn nodes(&self) -> &[NodeId] {
        match &self.shape {
            FieldShape::Simple(field) => field.nodes(),
            FieldShape::Complex(field) => field.nodes(),
        }
    }

    /// First backing node.
    #[must_use]
    pub fn start_node(&self) -> NodeId {
        match &self.shape {
            FieldShape::Simple(field) => field.node(),
            FieldShape::Complex(field) => field.start_node(),
        }
    }

    /// Last backing node.
    #[must_use]
    pub fn end_node(&self) -> NodeId {
        match &self.shape {
            FieldShape::Simple(field) => field.node(),
            FieldShape::Complex(field) => field.end_node(),
        }
    }

    /// Ancestors of the field matching `selector`, nearest first.
    #[must_use]
    pub fn ancestors(&self, tree: &Tree, selector: &Selector) -> Vec<NodeId> {
        tree.ancestors(self.start_node(), selector)
    }

    /// Replace the field's cached display text with rendered `content`.
    ///
    /// The field markup is collapsed to plain content: simple fields are
    /// unwrapped, complex fields keep only the run that held the display text.
    ///
    /// # Errors
    ///
    /// Fails without touching the tree when a backing node is detached or the
    /// display text has no enclosing paragraph. Content errors are returned as
    /// [`FieldError::Content`]; the display text is only removed after the
    /// content was rendered.
    pub fn replace<E, C>(&self, tree: &mut Tree, content: &C, env: &E) -> Result<(), FieldError>
    where
        E: ?Sized,
        C: Content<E> + ?Sized,
    {
        tracing::debug!(
            kind = %self.kind(),
            expression = self.expression().unwrap_or_default(),
            "Replacing merge field"
        );
        match &self.shape {
            FieldShape::Simple(field) => field.replace(tree, content, env),
            FieldShape::Complex(field) => field.replace(tree, content, env),
        }
    }

    /// Delete the field's backing nodes, or only decrement the block
    /// reference count while it exceeds 1.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::Tree`] if any backing node is already detached;
    /// nothing is removed in that case.
    pub fn remove(&mut self, tree: &mut Tree) -> Result<Removal, FieldError> {
        let nodes = self.nodes().to_vec();
        self.remove_or_decrement(tree, &nodes)
    }

    /// Apply the same policy as [`remove`](Self::remove) to the nearest
    /// ancestor matching `selector`.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::NoAncestor`] when no ancestor matches and
    /// [`FieldError::Tree`] when the ancestor is already detached.
    pub fn remove_parent(
        &mut self,
        tree: &mut Tree,
        selector: &Selector,
    ) -> Result<Removal, FieldError> {
        let ancestor = self
            .ancestors(tree, selector)
            .first()
            .copied()
            .ok_or_else(|| FieldError::NoAncestor(selector.to_string()))?;
        self.remove_or_decrement(tree, &[ancestor])
    }

    fn remove_or_decrement(
        &mut self,
        tree: &mut Tree,
        nodes: &[NodeId],
    ) -> Result<Removal, FieldError> {
        if self.block_reference_count > 1 {
            self.block_reference_count -= 1;
            tracing::debug!(
                remaining = self.block_reference_count,
                "Block still referenced, removal deferred"
            );
            return Ok(Removal::Deferred {
                remaining: self.block_reference_count,
            });
        }

        for &node in nodes {
            tree.ensure_attached(node)?;
        }
        for &node in nodes {
            tree.remove(node)?;
        }
        Ok(Removal::Removed)
    }
}
