//! Structural node predicates.
//!
//! Supports the small XPath-like subset used for block lookups:
//! `w:p`, `.//w:tr` and `.//w:fldChar[@w:fldCharType='end']`.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::SelectorError;
use crate::tree::TreeNode;

static SELECTOR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^(?:\.//)?([A-Za-z_][\w.-]*(?::[A-Za-z_][\w.-]*)?)(?:\[@([A-Za-z_][\w.-]*(?::[A-Za-z_][\w.-]*)?)=(?:'([^']*)'|"([^"]*)")\])?$"#,
    )
    .expect("invalid selector regex")
});

/// Match elements by qualified tag and an optional attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    tag: String,
    attr: Option<(String, String)>,
}

impl Selector {
    /// Select elements with the given qualified tag.
    #[must_use]
    pub fn tag(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attr: None,
        }
    }

    /// Additionally require an attribute to equal `value`.
    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attr = Some((name.into(), value.into()));
        self
    }

    /// Parse a selector expression.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError`] for empty input or syntax outside the supported subset.
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(SelectorError::Empty);
        }
        let caps = SELECTOR_PATTERN
            .captures(input)
            .ok_or_else(|| SelectorError::Unsupported(input.to_owned()))?;

        let selector = Self::tag(&caps[1]);
        Ok(match caps.get(2) {
            Some(name) => {
                let value = caps.get(3).or_else(|| caps.get(4)).map_or("", |m| m.as_str());
                selector.with_attr(name.as_str(), value)
            }
            None => selector,
        })
    }

    /// Qualified tag this selector matches.
    #[must_use]
    pub fn tag_name(&self) -> &str {
        &self.tag
    }

    /// Whether `node` satisfies the selector.
    #[must_use]
    pub fn matches(&self, node: &TreeNode) -> bool {
        node.tag == self.tag
            && self
                .attr
                .as_ref()
                .is_none_or(|(name, value)| node.attr(name) == Some(value.as_str()))
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ".//{}", self.tag)?;
        if let Some((name, value)) = &self.attr {
            write!(f, "[@{name}='{value}']")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::tree::Tree;

    #[test]
    fn test_parse_plain_tag() {
        assert_eq!(Selector::parse("w:p").unwrap(), Selector::tag("w:p"));
    }

    #[test]
    fn test_parse_descendant_prefix() {
        assert_eq!(Selector::parse(".//w:tr").unwrap(), Selector::tag("w:tr"));
    }

    #[test]
    fn test_parse_attribute_predicate() {
        let selector: Selector = ".//w:fldChar[@w:fldCharType='end']".parse().unwrap();
        assert_eq!(
            selector,
            Selector::tag("w:fldChar").with_attr("w:fldCharType", "end")
        );
        assert_eq!(
            selector.to_string(),
            ".//w:fldChar[@w:fldCharType='end']"
        );
    }

    #[test]
    fn test_parse_double_quoted_value() {
        let selector = Selector::parse(r#"w:fldChar[@w:fldCharType="begin"]"#).unwrap();
        assert_eq!(
            selector,
            Selector::tag("w:fldChar").with_attr("w:fldCharType", "begin")
        );
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(Selector::parse("  "), Err(SelectorError::Empty));
    }

    #[test]
    fn test_parse_unsupported() {
        assert!(matches!(
            Selector::parse("//w:p/w:r"),
            Err(SelectorError::Unsupported(_))
        ));
        assert!(matches!(
            Selector::parse("w:p[1]"),
            Err(SelectorError::Unsupported(_))
        ));
    }

    #[test]
    fn test_matches_attribute() {
        let mut tree = Tree::new("w:fldChar");
        let root = tree.root();
        tree.set_attr(root, "w:fldCharType", "separate");

        let separate = Selector::tag("w:fldChar").with_attr("w:fldCharType", "separate");
        let end = Selector::tag("w:fldChar").with_attr("w:fldCharType", "end");
        assert!(separate.matches(tree.node(root)));
        assert!(!end.matches(tree.node(root)));
        assert!(Selector::tag("w:fldChar").matches(tree.node(root)));
    }
}
