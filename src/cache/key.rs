//! Cache keys and caller identity.
//!
//! A cache entry is named by `<identity>/<sha256-of-url>.<kind>`. The
//! identity namespaces entries so two programs (or two libraries inside
//! one program) caching the same URL never share files.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Fallback identity when the executable name cannot be determined.
const FALLBACK_IDENTITY: &str = env!("CARGO_PKG_NAME");

/// The three files kept per cached URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// The cached body.
    Data,
    /// The stored `ETag` validator.
    Etag,
    /// The stored `Last-Modified` validator.
    Since,
}

impl ArtifactKind {
    /// File suffix for this artifact.
    pub fn suffix(self) -> &'static str {
        match self {
            ArtifactKind::Data => "data",
            ArtifactKind::Etag => "etag",
            ArtifactKind::Since => "since",
        }
    }
}

/// Stable identifier for a URL under a caller identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    identity: String,
    digest: String,
}

impl CacheKey {
    /// Build the key for `url` namespaced under `identity`.
    ///
    /// `identity` is sanitized; `None` or an unusable value falls back to
    /// the executable basename.
    pub fn new(url: &str, identity: Option<&str>) -> Self {
        Self {
            identity: resolve_identity(identity),
            digest: url_digest(url),
        }
    }

    /// The resolved identity string.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Hex digest of the URL.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Path of an artifact relative to a cache base directory.
    pub fn relative_path(&self, kind: ArtifactKind) -> PathBuf {
        Path::new(&self.identity).join(format!("{}.{}", self.digest, kind.suffix()))
    }
}

/// Hex-encoded SHA-256 of a URL.
pub fn url_digest(url: &str) -> String {
    hex::encode(Sha256::digest(url.as_bytes()))
}

/// Basename of the running program.
///
/// Uses `argv[0]` like most command-line tools report themselves, then the
/// resolved executable path, then the crate name.
pub fn program_name() -> String {
    std::env::args_os()
        .next()
        .map(PathBuf::from)
        .or_else(|| std::env::current_exe().ok())
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .and_then(|n| sanitize(&n))
        .unwrap_or_else(|| FALLBACK_IDENTITY.to_string())
}

/// Resolve an optional identity override to the string used on disk.
pub fn resolve_identity(identity: Option<&str>) -> String {
    identity.and_then(sanitize).unwrap_or_else(program_name)
}

/// Crate name from a `module_path!()` string.
///
/// Returns an empty string for an empty path, which [`resolve_identity`]
/// then treats as "no override".
pub fn crate_name_from_module_path(module_path: &str) -> String {
    module_path
        .split("::")
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Reduce an identity to a single safe path component.
fn sanitize(name: &str) -> Option<String> {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect();

    match cleaned.as_str() {
        "" | "." | ".." => None,
        _ => Some(cleaned),
    }
}
