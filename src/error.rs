//! Error types for cache operations.
//!
//! This module defines [`CacheError`], the error type returned by every
//! library entry point, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Each failure class the caller may want to branch on gets its own variant
//! - [`CacheError::Network`] and [`CacheError::UnexpectedStatus`] are *soft*
//!   failures: the previously committed data file is left intact and stays usable
//! - The CLI layer wraps these in `anyhow` for context-rich messages

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// None of the candidate base directories accepted a write.
    #[error("No writable location found in: {}", format_candidates(.candidates))]
    NoWritableLocation { candidates: Vec<PathBuf> },

    /// The request could not be built (bad URL, bad client setup).
    #[error("Failed to build request for {url}: {message}")]
    RequestConstruction { url: String, message: String },

    /// Transport-level failure talking to the origin.
    #[error("Network error fetching {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The origin answered with something other than 200 or 304.
    #[error("Bad HTTP response {status} fetching {url}, keeping previous copy")]
    UnexpectedStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    /// A create, rename, chmod or chtimes call failed.
    #[error("Filesystem error at {path}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A TTL string could not be parsed.
    #[error("Invalid TTL '{value}' (expected e.g. 30s, 15m, 1h, 7d)")]
    InvalidTtl { value: String },

    /// Options file not found at the given location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse an options file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },
}

impl CacheError {
    /// Wrap an IO error with the path it happened at.
    pub fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Whether a previously cached copy should still be considered usable.
    pub fn is_soft_failure(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::UnexpectedStatus { .. })
    }
}

fn format_candidates(candidates: &[PathBuf]) -> String {
    let parts: Vec<String> = candidates
        .iter()
        .map(|p| p.display().to_string())
        .collect();
    format!("[{}]", parts.join(", "))
}

/// Result type alias for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
