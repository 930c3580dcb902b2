//! All error types for the xliffkit crate.
//!
//! Parse failures are returned immediately and never yield a partial table.
//! Validation findings are *not* errors; they are collected in
//! [`crate::validation::ValidationResult`]. [`Error::Validation`] is only used when
//! a pipeline step refuses to continue because of them.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("XML parse error: {0}")]
    XmlParse(#[from] quick_xml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid data: {0}")]
    DataMismatch(String),

    #[error("invalid resource: {0}")]
    InvalidResource(String),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("validation error: {0}")]
    Validation(String),
}

impl Error {
    /// Creates a new validation error
    pub fn validation_error(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    pub(crate) fn unsupported_version(version: &str) -> Self {
        Error::UnsupportedFormat(format!("XLIFF version `{}`", version))
    }
}
