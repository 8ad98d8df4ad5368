//! Merge field discovery and replacement for WordprocessingML documents.
//!
//! This crate finds `MERGEFIELD` placeholders in a document part and lets a
//! caller replace each one with rendered content or remove it:
//! - [`Tree`]: arena-backed markup tree with XML parsing and serialization
//! - [`scan`]: single read-only pass producing [`MergeField`] descriptors
//! - [`MergeField`]: replace, remove, or vote to remove an enclosing block
//! - [`Content`]: collaborator that renders replacement markup ([`TextContent`] for plain text)
//!
//! # Example
//!
//! ```ignore
//! use docmerge_fields::{Tree, TextContent, scan};
//!
//! let mut tree = Tree::parse(&document_xml)?;
//! for field in scan(&tree) {
//!     if let Some(name) = field.expression() {
//!         field.replace(&mut tree, &TextContent::new(name.to_uppercase()), &())?;
//!     }
//! }
//! let merged = tree.to_xml();
//! ```

mod content;
mod error;
mod field;
pub mod markup;
mod parser;
mod scanner;
mod selector;
mod serializer;
mod tree;

pub use content::{Content, TextContent};
pub use error::{ContentError, FieldError, SelectorError, TreeError, XmlError};
pub use field::{FieldKind, MergeField, Removal, parse_expression};
pub use parser::WordXmlParser;
pub use scanner::scan;
pub use selector::Selector;
pub use serializer::WordXmlSerializer;
pub use tree::{NodeId, Tree, TreeNode};
