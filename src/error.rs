//! Error types for ailess operations.
//!
//! This module defines [`AilessError`], the primary error type used throughout
//! the application, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Requirement lines that cannot be parsed are never errors; they are
//!   recorded as [`DegradedLine`](crate::requirements::DegradedLine)s and logged
//! - A missing include file is fatal to building a requirement set
//! - Registry failures and the absence of a suitable searcher are recovered
//!   by falling back to a default image, so callers only see them when they
//!   ask for the lower-level operations directly
//! - Use `anyhow::Error` (via `AilessError::Other`) for unexpected errors

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for ailess operations.
#[derive(Debug, Error)]
pub enum AilessError {
    /// Configuration file not found at expected location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// Invalid configuration structure or values.
    #[error("Invalid configuration: {message}")]
    ConfigValidationError { message: String },

    /// A requirements file (or a file it includes) does not exist.
    #[error("{}", referenced_file_message(.path, .referenced_from.as_ref()))]
    ReferencedFileNotFound {
        path: PathBuf,
        referenced_from: Option<PathBuf>,
    },

    /// The image tag listing could not be fetched.
    #[error("Registry unavailable for '{repository}': {message}")]
    RegistryUnavailable { repository: String, message: String },

    /// No registered image searcher applies to the profile and requirements.
    #[error("No suitable image searcher for {profile}")]
    NoSuitableSearcher { profile: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn referenced_file_message(path: &std::path::Path, from: Option<&PathBuf>) -> String {
    match from {
        Some(from) => format!(
            "Referenced file not found: {} (included from {})",
            path.display(),
            from.display()
        ),
        None => format!("Requirements file not found: {}", path.display()),
    }
}

/// Result type alias for ailess operations.
pub type Result<T> = std::result::Result<T, AilessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_not_found_displays_path() {
        let err = AilessError::ConfigNotFound {
            path: PathBuf::from("/app/.ailess/config.json"),
        };
        assert!(err.to_string().contains("/app/.ailess/config.json"));
    }

    #[test]
    fn config_parse_error_displays_path_and_message() {
        let err = AilessError::ConfigParseError {
            path: PathBuf::from("/config.json"),
            message: "expected value".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/config.json"));
        assert!(msg.contains("expected value"));
    }

    #[test]
    fn referenced_file_names_the_including_file() {
        let err = AilessError::ReferencedFileNotFound {
            path: PathBuf::from("base.txt"),
            referenced_from: Some(PathBuf::from("requirements.txt")),
        };
        let msg = err.to_string();
        assert!(msg.contains("base.txt"));
        assert!(msg.contains("included from requirements.txt"));
    }

    #[test]
    fn missing_entry_file_has_its_own_message() {
        let err = AilessError::ReferencedFileNotFound {
            path: PathBuf::from("requirements.txt"),
            referenced_from: None,
        };
        assert_eq!(
            err.to_string(),
            "Requirements file not found: requirements.txt"
        );
    }

    #[test]
    fn registry_unavailable_displays_repository() {
        let err = AilessError::RegistryUnavailable {
            repository: "pytorch/pytorch".into(),
            message: "HTTP 503".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("pytorch/pytorch"));
        assert!(msg.contains("HTTP 503"));
    }

    #[test]
    fn no_suitable_searcher_displays_profile() {
        let err = AilessError::NoSuitableSearcher {
            profile: "linux/arm64 without GPU".into(),
        };
        assert!(err.to_string().contains("linux/arm64"));
    }

    #[test]
    fn io_error_converts_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: AilessError = io_err.into();
        assert!(matches!(err, AilessError::Io(_)));
    }

    #[test]
    fn anyhow_error_is_transparent() {
        let err: AilessError = anyhow::anyhow!("boom").into();
        assert_eq!(err.to_string(), "boom");
    }
}
