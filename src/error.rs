//! Error types for adasink
//!
//! This module defines the error hierarchy for the entire toolkit.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//!
//! Errors fall into two classes: ordinary failures that the invoking
//! collaborator can catch and handle (configuration, metadata, projection),
//! and unrecoverable sink I/O failures. The latter are flagged by
//! [`Error::is_fatal`]: the buffer contents backing a commit are gone once
//! drained, so a failed artifact write or upload cannot be retried by the
//! target alone. The host process is expected to check `is_fatal` and
//! terminate with a non-zero status.

use thiserror::Error;

/// The main error type for adasink
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required parameter: {key}")]
    MissingParameter { key: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Metadata / Projection Errors
    // ============================================================================
    #[error("Metadata error for entity type '{entity_type}': {message}")]
    Metadata {
        entity_type: String,
        message: String,
    },

    #[error("Projection error for field '{field}': {message}")]
    Projection { field: String, message: String },

    // ============================================================================
    // Sink I/O Errors (unrecoverable)
    // ============================================================================
    #[error("Artifact error for '{path}': {message}")]
    Artifact { path: String, message: String },

    #[error("Upload failed for key '{key}': {message}")]
    Upload { key: String, message: String },

    // ============================================================================
    // Arrow/Parquet Errors
    // ============================================================================
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    // ============================================================================
    // Message Transport Errors
    // ============================================================================
    #[error("Kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing parameter error
    pub fn missing_parameter(key: impl Into<String>) -> Self {
        Self::MissingParameter { key: key.into() }
    }

    /// Create a metadata error
    pub fn metadata(entity_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Metadata {
            entity_type: entity_type.into(),
            message: message.into(),
        }
    }

    /// Create a projection error
    pub fn projection(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Projection {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an artifact error
    pub fn artifact(path: impl std::fmt::Display, message: impl std::fmt::Display) -> Self {
        Self::Artifact {
            path: path.to_string(),
            message: message.to_string(),
        }
    }

    /// Create an upload error
    pub fn upload(key: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Upload {
            key: key.into(),
            message: message.to_string(),
        }
    }

    /// Check if this error is unrecoverable for the emitting target.
    ///
    /// A fatal error means a commit was partially delivered and the buffered
    /// records needed to retry it no longer exist.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Artifact { .. } | Error::Upload { .. })
    }
}

/// Result type alias for adasink
pub type Result<T> = std::result::Result<T, Error>;
