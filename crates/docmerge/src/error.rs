//! CLI error types.

use docmerge_config::ConfigError;
use docmerge_fields::{FieldError, XmlError};

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("invalid document: {0}")]
    Xml(#[from] XmlError),

    #[error("{0}")]
    Field(#[from] FieldError),

    #[error("invalid data file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Validation(String),
}
