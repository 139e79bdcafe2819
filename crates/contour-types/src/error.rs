use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid identifier '{value}': {reason}")]
    InvalidGuid { value: String, reason: String },

    #[error("invalid language code '{0}'")]
    InvalidLanguage(String),
}
