//! Error types for widget-consumer.
//!
//! Every variant is fatal to the consumer loop; nothing here is retried.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    /// A queued object whose body is not a valid request document.
    #[error("malformed request '{key}': {source}")]
    Parse {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot transform request: {0}")]
    Transform(String),

    /// A remote storage call failed. `message` carries the SDK error as-is.
    #[error("{operation} failed for '{target}': {message}")]
    Storage {
        operation: &'static str,
        target: String,
        message: String,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub(crate) fn storage(
        operation: &'static str,
        target: impl Into<String>,
        message: impl std::fmt::Display,
    ) -> Self {
        Self::Storage {
            operation,
            target: target.into(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
