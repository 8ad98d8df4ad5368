//! CLI command implementations.

pub(crate) mod fields;
pub(crate) mod merge;

pub(crate) use fields::FieldsArgs;
pub(crate) use merge::MergeArgs;
