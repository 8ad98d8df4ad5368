//! Rendered content inserted in place of a field's display text.

use crate::error::ContentError;
use crate::markup::{BREAK, TEXT, XML_SPACE};
use crate::tree::{NodeId, Tree};

/// Renders replacement markup for a merge field.
///
/// `append_to` inserts the rendering into `paragraph` at the position of
/// `anchor` and must leave `anchor` in place; the field removes it once
/// rendering succeeds. `env` is passed through from the caller untouched.
pub trait Content<E: ?Sized> {
    /// Insert the rendering of this content at `anchor`.
    ///
    /// # Errors
    ///
    /// Any error is returned to the caller of `replace` unchanged.
    fn append_to(
        &self,
        tree: &mut Tree,
        paragraph: NodeId,
        anchor: NodeId,
        env: &E,
    ) -> Result<(), ContentError>;
}

impl<E, F> Content<E> for F
where
    E: ?Sized,
    F: Fn(&mut Tree, NodeId, NodeId, &E) -> Result<(), ContentError>,
{
    fn append_to(
        &self,
        tree: &mut Tree,
        paragraph: NodeId,
        anchor: NodeId,
        env: &E,
    ) -> Result<(), ContentError> {
        self(tree, paragraph, anchor, env)
    }
}

/// Plain text rendered as `w:t` elements, one per line, joined by `w:br`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextContent {
    text: String,
}

impl TextContent {
    /// Create text content.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// The text being rendered.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl<E: ?Sized> Content<E> for TextContent {
    fn append_to(
        &self,
        tree: &mut Tree,
        _paragraph: NodeId,
        anchor: NodeId,
        _env: &E,
    ) -> Result<(), ContentError> {
        for (index, line) in self.text.lines().enumerate() {
            if index > 0 {
                let br = tree.create_element(BREAK);
                tree.insert_before(anchor, br)?;
            }
            let t = tree.create_element(TEXT);
            if line.starts_with(char::is_whitespace) || line.ends_with(char::is_whitespace) {
                tree.set_attr(t, XML_SPACE, "preserve");
            }
            tree.set_text(t, line);
            tree.insert_before(anchor, t)?;
        }
        Ok(())
    }
}
