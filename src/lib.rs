//! urlcache - keep a local copy of a remote file up to date.
//!
//! urlcache caches files fetched over HTTP(S) on disk, keyed by URL, and
//! avoids re-downloading them with conditional requests (`ETag` /
//! `Last-Modified`) and an optional TTL.
//!
//! # Modules
//!
//! - [`cache`] - Cache keys, writable location discovery and validator files
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Cache options and options file loading
//! - [`error`] - Error types and result aliases
//! - [`fetch`] - Conditional HTTP requests
//! - [`reconcile`] - The fetch-and-reconcile engine
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! // Revalidate at most once an hour
//! let path = urlcache::to_path_ttl("https://example.com/file.txt", Duration::from_secs(3600))
//!     .unwrap();
//! let data = std::fs::read(path).unwrap();
//! println!("Cached file size: {} bytes", data.len());
//! ```
//!
//! Libraries should namespace their entries with their own name so they
//! don't share files with the host program:
//!
//! ```no_run
//! use urlcache::{CacheOptions, UrlCache};
//!
//! let cache = UrlCache::with_options(
//!     CacheOptions::default().with_identity(urlcache::identity!()),
//! )
//! .unwrap();
//! let path = cache.cached_path("https://example.com/file.txt").unwrap();
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod reconcile;

pub use config::CacheOptions;
pub use error::{CacheError, Result};
pub use reconcile::{Outcome, UrlCache};

use std::path::{Path, PathBuf};
use std::time::Duration;

/// The calling crate's name, for use as a cache identity.
///
/// Expands to the first segment of `module_path!()` at the call site.
#[macro_export]
macro_rules! identity {
    () => {
        $crate::cache::crate_name_from_module_path(::core::module_path!())
    };
}

/// Cache `url` under an auto-derived path, revalidating on every call.
pub fn to_path(url: &str) -> Result<PathBuf> {
    to_path_ttl(url, Duration::ZERO)
}

/// Cache `url` under an auto-derived path, skipping the network while the
/// cached copy is younger than `ttl`.
pub fn to_path_ttl(url: &str, ttl: Duration) -> Result<PathBuf> {
    UrlCache::with_options(CacheOptions::default().with_ttl(ttl))?.cached_path(url)
}

/// Cache `url` at an explicit `path`, revalidating on every call.
pub fn to_custom_path(url: &str, path: &Path) -> Result<Outcome> {
    to_custom_path_ttl(url, path, Duration::ZERO)
}

/// Cache `url` at an explicit `path`, skipping the network while the file
/// is younger than `ttl`.
pub fn to_custom_path_ttl(url: &str, path: &Path, ttl: Duration) -> Result<Outcome> {
    UrlCache::with_options(CacheOptions::default().with_ttl(ttl))?.reconcile_at(url, path)
}
