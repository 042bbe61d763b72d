//! Error types for chatview-cache.
//!
//! Cache lookups never fail; a miss triggers derivation and an absent value
//! is reported as `None`. Only the configuration layer can produce errors.

use thiserror::Error;

/// Errors raised while loading or applying runtime configuration.
#[derive(Debug, Error)]
pub enum ChatViewError {
    /// Filesystem access failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A config file could not be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A config value was syntactically valid but not acceptable.
    #[error("Config error: {0}")]
    Config(String),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, ChatViewError>;
