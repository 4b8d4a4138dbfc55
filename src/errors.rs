use std::result::Result as StdResult;

use thiserror::Error;

/// Error type shared by the form model, the lookup client and configuration.
#[derive(Debug, Error)]
pub enum FormError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Row not found: {0}")]
    RowNotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Lookup failed: {0}")]
    Lookup(String),
}

pub type FormResult<T> = StdResult<T, FormError>;
