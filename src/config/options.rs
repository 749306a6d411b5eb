//! Caller-level cache options.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::cache::validation::serde_ttl;
use crate::cache::{default_search_dirs, PathResolver};
use crate::fetch::{DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};

/// Options for a [`UrlCache`](crate::UrlCache).
///
/// Every field has a default, so an options file only needs the keys it
/// changes:
///
/// ```yaml
/// ttl: 1h
/// identity: deny-list
/// sync_mtime: true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheOptions {
    /// Skip the network while the data file is younger than this.
    /// Zero (the default) revalidates on every call.
    #[serde(with = "serde_ttl")]
    pub ttl: Duration,

    /// Use this data file instead of an auto-derived one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Namespace for auto-derived paths. Defaults to the executable name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,

    /// Stamp the data file's mtime with the server's Last-Modified.
    ///
    /// Keeps mtime meaningful to origins that only answer 304 for an exact
    /// `If-Modified-Since` match, but makes the TTL count from the server's
    /// modification time instead of the download time.
    pub sync_mtime: bool,

    /// Request timeout.
    #[serde(with = "serde_ttl")]
    pub timeout: Duration,

    /// `User-Agent` sent with every request.
    pub user_agent: String,

    /// Candidate base directories, replacing the standard search list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_dirs: Option<Vec<PathBuf>>,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            ttl: Duration::ZERO,
            path: None,
            identity: None,
            sync_mtime: false,
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            search_dirs: None,
        }
    }
}

impl CacheOptions {
    /// Set the TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set an explicit data file path.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the identity used to namespace auto-derived paths.
    ///
    /// Pass [`identity!()`](crate::identity) to use the calling crate's name.
    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    /// Enable or disable mtime sync to Last-Modified.
    pub fn with_sync_mtime(mut self, sync: bool) -> Self {
        self.sync_mtime = sync;
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the `User-Agent` header.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Replace the candidate base directories.
    pub fn with_search_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.search_dirs = Some(dirs);
        self
    }

    /// Path resolver over the configured search directories.
    pub fn resolver(&self) -> PathResolver {
        PathResolver::new(
            self.search_dirs
                .clone()
                .unwrap_or_else(default_search_dirs),
        )
    }
}
