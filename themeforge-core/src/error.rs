//! Engine error taxonomy.
//!
//! Only `MissingTemplate` is terminal for a composition call. Everything that
//! can go wrong inside a single section is recovered where it happens.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ThemeError>;

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("Malformed schema in {source_name}: {message}")]
    MalformedSchema { source_name: String, message: String },

    #[error("No template document supplied")]
    MissingTemplate,

    #[error("Unknown settings preset: {0}")]
    UnknownPreset(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ThemeError {
    pub fn malformed(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedSchema {
            source_name: source_name.into(),
            message: message.into(),
        }
    }
}
