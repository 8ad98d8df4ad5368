//! WordprocessingML vocabulary recognised by the field scanner.

use std::sync::LazyLock;

use crate::selector::Selector;
use crate::tree::{NodeId, Tree};

/// Paragraph element.
pub const PARAGRAPH: &str = "w:p";
/// Run element.
pub const RUN: &str = "w:r";
/// Text-bearing leaf inside a run.
pub const TEXT: &str = "w:t";
/// Line break inside a run.
pub const BREAK: &str = "w:br";
/// Self-contained field element.
pub const FIELD_SIMPLE: &str = "w:fldSimple";
/// Instruction attribute of [`FIELD_SIMPLE`].
pub const FIELD_INSTRUCTION: &str = "w:instr";
/// Complex field character marker.
pub const FIELD_CHAR: &str = "w:fldChar";
/// Marker type attribute of [`FIELD_CHAR`].
pub const FIELD_CHAR_TYPE: &str = "w:fldCharType";
/// Instruction text fragment of a complex field.
pub const INSTRUCTION_TEXT: &str = "w:instrText";
/// Whitespace handling attribute on [`TEXT`].
pub const XML_SPACE: &str = "xml:space";

pub(crate) static PARAGRAPHS: LazyLock<Selector> = LazyLock::new(|| Selector::tag(PARAGRAPH));
pub(crate) static RUNS: LazyLock<Selector> = LazyLock::new(|| Selector::tag(RUN));
pub(crate) static TEXTS: LazyLock<Selector> = LazyLock::new(|| Selector::tag(TEXT));
pub(crate) static INSTRUCTION_TEXTS: LazyLock<Selector> =
    LazyLock::new(|| Selector::tag(INSTRUCTION_TEXT));

/// Complex field marker type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldChar {
    /// Opens the field code.
    Begin,
    /// Splits the field code from its cached display.
    Separate,
    /// Closes the field.
    End,
}

impl FieldChar {
    /// Attribute value used in markup.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Begin => "begin",
            Self::Separate => "separate",
            Self::End => "end",
        }
    }

    /// Marker type of `id`, if it is a field character element.
    #[must_use]
    pub fn of(tree: &Tree, id: NodeId) -> Option<Self> {
        if tree.tag(id) != FIELD_CHAR {
            return None;
        }
        let value = tree.attr(id, FIELD_CHAR_TYPE)?;
        [Self::Begin, Self::Separate, Self::End]
            .into_iter()
            .find(|marker| marker.as_str() == value)
    }

    /// Whether any descendant of `id` is a marker of this type.
    #[must_use]
    pub fn within(self, tree: &Tree, id: NodeId) -> bool {
        tree.descendants(id)
            .into_iter()
            .skip(1)
            .any(|descendant| Self::of(tree, descendant) == Some(self))
    }
}
