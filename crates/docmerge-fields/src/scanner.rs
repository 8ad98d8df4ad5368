//! Document-order discovery of merge fields.

use crate::field::MergeField;
use crate::markup::{FIELD_SIMPLE, FieldChar};
use crate::tree::Tree;

/// Find every valid merge field in `tree`, in document order.
///
/// The walk only reads the tree. Field codes other than `MERGEFIELD`,
/// malformed instructions, fields without display text and complex fields
/// whose `end` marker is never reached are left out of the result.
#[must_use]
pub fn scan(tree: &Tree) -> Vec<MergeField> {
    let mut fields = Vec::new();

    for id in tree.descendants(tree.root()) {
        let candidate = if tree.tag(id) == FIELD_SIMPLE {
            Some(MergeField::simple(tree, id))
        } else if FieldChar::of(tree, id) == Some(FieldChar::Begin) {
            let field = MergeField::complex(tree, id);
            if field.is_none() {
                tracing::warn!(marker = %id, "Skipping unterminated complex field");
            }
            field
        } else {
            None
        };

        let Some(field) = candidate else {
            continue;
        };

        if field.valid(tree) {
            tracing::debug!(
                kind = %field.kind(),
                expression = field.expression().unwrap_or_default(),
                "Found merge field"
            );
            fields.push(field);
        } else {
            tracing::debug!(
                kind = %field.kind(),
                instruction = field.raw_instruction().trim(),
                "Skipping field"
            );
        }
    }

    tracing::info!(count = fields.len(), "Scanned merge fields");
    fields
}
