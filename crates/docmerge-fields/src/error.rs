//! Error types for merge field processing.

use std::str::Utf8Error;

use crate::tree::NodeId;

/// Error while reading a markup part into a [`Tree`](crate::Tree).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum XmlError {
    /// XML parsing error.
    #[error("XML parse error")]
    Parse(#[from] quick_xml::Error),

    /// UTF-8 decoding error.
    #[error("UTF-8 error")]
    Utf8(#[from] Utf8Error),

    /// XML attribute error.
    #[error("XML attribute error")]
    Attr(#[from] quick_xml::events::attributes::AttrError),

    /// Encoding error during XML parsing.
    #[error("encoding error")]
    Encoding(#[from] quick_xml::encoding::EncodingError),

    /// Input ended while `{0}` was still open.
    #[error("unexpected end of input inside <{0}>")]
    UnexpectedEof(String),

    /// Input has no root element.
    #[error("document has no root element")]
    NoRoot,
}

/// Error from a structural tree mutation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// Node is no longer reachable from the document root.
    #[error("node {0} is detached from the document")]
    Detached(NodeId),

    /// The document root cannot be removed or unwrapped.
    #[error("the root element cannot be removed")]
    Root,
}

/// Unsupported selector expression.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    /// Selector is empty.
    #[error("selector cannot be empty")]
    Empty,

    /// Selector uses syntax outside the supported subset.
    #[error("unsupported selector: {0}")]
    Unsupported(String),
}

/// Error reported by a [`Content`](crate::Content) renderer.
pub type ContentError = Box<dyn std::error::Error + Send + Sync>;

/// Error from a merge field mutation.
#[derive(Debug, thiserror::Error)]
pub enum FieldError {
    /// Structural mutation failed.
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// Field has no text-bearing node to render into.
    #[error("merge field has no display text")]
    NoDisplayAnchor,

    /// Display anchor is not inside a paragraph.
    #[error("merge field display text is not inside a paragraph")]
    NoParagraph,

    /// No ancestor matches the block selector.
    #[error("no ancestor matching {0}")]
    NoAncestor(String),

    /// Content renderer failed.
    #[error("content rendering failed")]
    Content(#[source] ContentError),
}
