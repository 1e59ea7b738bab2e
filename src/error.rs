//! Error types
//!
//! Interactive paths (registration, hook dispatch, control assembly) fall back
//! silently instead of returning these. Errors only surface from explicit
//! conversion entry points and configuration loading.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, KedaoError>;

/// Top-level error for conversion and configuration
#[derive(Error, Debug)]
pub enum KedaoError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Markup serialization failed: {0}")]
    Serialization(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Unknown block: {0}")]
    BlockNotFound(String),
}

/// Failure raised by a single extension's importer
///
/// The conversion composer logs these and moves on to the next candidate, so
/// one broken extension cannot take down unrelated content.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtensionError {
    #[error("<{tag}> is missing attribute '{attribute}'")]
    MissingAttribute { tag: String, attribute: String },

    #[error("<{tag}> is missing a <{child}> child")]
    MissingChild { tag: String, child: String },

    #[error("{0}")]
    Custom(String),
}

impl ExtensionError {
    pub fn missing_attribute(tag: impl Into<String>, attribute: impl Into<String>) -> Self {
        ExtensionError::MissingAttribute {
            tag: tag.into(),
            attribute: attribute.into(),
        }
    }

    pub fn missing_child(tag: impl Into<String>, child: impl Into<String>) -> Self {
        ExtensionError::MissingChild {
            tag: tag.into(),
            child: child.into(),
        }
    }
}
