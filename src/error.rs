//! Custom error types for bwsave
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions.

use thiserror::Error;

/// The main error type for bwsave operations
#[derive(Error, Debug)]
pub enum SaveError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Zip packing/unpacking errors
    #[error("Archive error: {0}")]
    Archive(String),

    /// Registry access errors other than a missing key
    #[error("Registry error: {0}")]
    Registry(String),

    /// Validation errors for profile names and manifests
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource not found (path, registry key, registry value)
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Destination already holds content
    #[error("{entity_type} already exists: {identifier}")]
    Collision {
        entity_type: &'static str,
        identifier: String,
    },

    /// Console prompt failures (closed stdin and the like)
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Workspace teardown failed
    #[error("Failed to remove workspace {path}: {reason}")]
    Teardown { path: String, reason: String },

    /// Operation not available on this platform
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl SaveError {
    /// Create a "not found" error for filesystem paths
    pub fn path_not_found(path: impl AsRef<std::path::Path>) -> Self {
        Self::NotFound {
            entity_type: "Path",
            identifier: path.as_ref().display().to_string(),
        }
    }

    /// Create a "not found" error for registry keys
    pub fn key_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Registry key",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for registry values
    pub fn value_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Registry value",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a collision error
    pub fn is_collision(&self) -> bool {
        matches!(self, Self::Collision { .. })
    }
}

impl From<std::io::Error> for SaveError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SaveError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<zip::result::ZipError> for SaveError {
    fn from(err: zip::result::ZipError) -> Self {
        Self::Archive(err.to_string())
    }
}

impl From<walkdir::Error> for SaveError {
    fn from(err: walkdir::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Result type alias for bwsave operations
pub type SaveResult<T> = Result<T, SaveError>;
