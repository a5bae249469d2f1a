//! Typed configuration.
//!
//! Environment settings load once at startup and fail fast on bad values.
//! The sink choice comes from the command line and is resolved into a
//! [`SinkTarget`] before anything is constructed.

mod cli;

pub use cli::Cli;

use crate::error::{Error, Result};

/// AWS region used when `AWS_REGION` is unset.
pub const DEFAULT_REGION: &str = "us-east-1";

#[derive(Debug, Clone)]
pub struct Config {
    pub aws: AwsSettings,
    pub otel_endpoint: Option<String>,
    pub log_level: String,
}

/// How to reach the storage services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwsSettings {
    pub region: String,
    /// Override endpoint for S3-compatible services (MinIO, LocalStack).
    pub endpoint_url: Option<String>,
    pub force_path_style: bool,
}

impl Default for AwsSettings {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            endpoint_url: None,
            force_path_style: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            aws: AwsSettings {
                region: std::env::var("AWS_REGION").unwrap_or_else(|_| DEFAULT_REGION.to_string()),
                endpoint_url: optional_var("AWS_ENDPOINT_URL"),
                force_path_style: bool_var("AWS_FORCE_PATH_STYLE")?.unwrap_or(false),
            },
            otel_endpoint: optional_var("OTEL_ENDPOINT"),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn bool_var(name: &str) -> Result<Option<bool>> {
    match optional_var(name).as_deref() {
        None => Ok(None),
        Some("1" | "true" | "TRUE" | "yes") => Ok(Some(true)),
        Some("0" | "false" | "FALSE" | "no") => Ok(Some(false)),
        Some(other) => Err(Error::Config(format!(
            "environment variable {name} must be a boolean, got '{other}'"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Sink selection
// ---------------------------------------------------------------------------

/// Where stored widgets go. Exactly one is configured per process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkTarget {
    /// Upsert into the named key-value table.
    Table(String),
    /// Write JSON objects into the named bucket.
    Blob(String),
}

impl SinkTarget {
    /// Resolve the mutually exclusive `--dynamodb-widget-table` /
    /// `--widget-bucket` options.
    pub fn from_options(table: Option<String>, bucket: Option<String>) -> Result<Self> {
        match (table, bucket) {
            (Some(table), None) if !table.is_empty() => Ok(Self::Table(table)),
            (None, Some(bucket)) if !bucket.is_empty() => Ok(Self::Blob(bucket)),
            (Some(_), Some(_)) => Err(Error::Config(
                "dynamodb-widget-table and widget-bucket are mutually exclusive".to_string(),
            )),
            (None, None) => Err(Error::Config(
                "one of dynamodb-widget-table or widget-bucket is required".to_string(),
            )),
            _ => Err(Error::Config("sink name must not be empty".to_string())),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Table(name) | Self::Blob(name) => name,
        }
    }
}

impl std::fmt::Display for SinkTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Table(name) => write!(f, "table:{name}"),
            Self::Blob(name) => write!(f, "bucket:{name}"),
        }
    }
}
