//! Pillar error types

use thiserror::Error;

/// Result type for pillar operations
pub type PillarResult<T> = Result<T, PillarError>;

/// Pillar-related errors
#[derive(Error, Debug)]
pub enum PillarError {
    #[error("Search source '{source_name}' is missing a filter")]
    MissingFilter { source_name: String },

    #[error("Invalid search source '{source_name}': {message}")]
    InvalidSource { source_name: String, message: String },

    #[error("Template error: {0}")]
    Template(#[from] saltldap_core::TemplateError),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
