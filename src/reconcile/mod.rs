//! The fetch-and-reconcile engine.
//!
//! [`UrlCache`] keeps one local file in sync with one URL:
//!
//! 1. If a TTL is set and the data file is younger than it, stop.
//! 2. Send a conditional GET carrying the stored `ETag` / `Last-Modified`.
//! 3. On 304, stop. On 200, install the body atomically, then the
//!    validators. Anything else is an error and the old file stays put.
//!
//! The body is installed before the validators are written. A crash in
//! between leaves old validators beside a new body, which at worst costs
//! one extra download on the next run; the reverse order could make the
//! server confirm a body that was never installed.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use urlcache::{CacheOptions, UrlCache};
//!
//! let cache = UrlCache::with_options(
//!     CacheOptions::default().with_ttl(Duration::from_secs(3600)),
//! )
//! .unwrap();
//! let path = cache.cached_path("https://example.com/deny-list.txt").unwrap();
//! let list = std::fs::read_to_string(path).unwrap();
//! ```

pub mod commit;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::Dispatch;

use crate::cache::{
    check_freshness, format_duration, parse_http_date, ArtifactKind, CacheKey, PathResolver,
    ValidatorPaths, Validators,
};
use crate::config::CacheOptions;
use crate::error::{CacheError, Result};
use crate::fetch::{FetchResult, HttpFetcher};

pub use commit::commit_body;

/// What a reconcile call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The TTL had not expired; no request was made.
    Fresh,
    /// The origin answered 304; nothing was written.
    NotModified,
    /// The origin sent a new body, which is now installed.
    Updated {
        /// Bytes written to the data file.
        bytes: u64,
    },
}

impl Outcome {
    /// Whether the data file changed.
    pub fn is_updated(&self) -> bool {
        matches!(self, Outcome::Updated { .. })
    }
}

/// Disk-backed cache of remote files.
#[derive(Debug, Clone)]
pub struct UrlCache {
    options: CacheOptions,
    fetcher: HttpFetcher,
    resolver: PathResolver,
    dispatch: Option<Dispatch>,
}

impl UrlCache {
    /// Create a cache with default options.
    pub fn new() -> Result<Self> {
        Self::with_options(CacheOptions::default())
    }

    /// Create a cache with the given options.
    pub fn with_options(options: CacheOptions) -> Result<Self> {
        let fetcher = HttpFetcher::with_settings(options.timeout, &options.user_agent)?;
        let resolver = options.resolver();

        Ok(Self {
            options,
            fetcher,
            resolver,
            dispatch: None,
        })
    }

    /// Route this cache's log events to `dispatch`.
    ///
    /// Without one, events go to the current default subscriber. A host
    /// that installed a global subscriber sees `urlcache` events (target
    /// `urlcache::*`) unless its filter excludes them; a host without one
    /// gets nothing.
    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    /// Get the configured options.
    pub fn options(&self) -> &CacheOptions {
        &self.options
    }

    /// Get the path resolver.
    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Cache key for `url` under the configured identity.
    pub fn key(&self, url: &str) -> CacheKey {
        CacheKey::new(url, self.options.identity.as_deref())
    }

    /// Where the data file for `url` lives, without touching the network.
    ///
    /// This is the explicit `path` option when set, otherwise an
    /// auto-derived path in the first writable search directory.
    pub fn data_path(&self, url: &str) -> Result<PathBuf> {
        match &self.options.path {
            Some(path) => Ok(path.clone()),
            None => self.resolver.resolve_key(&self.key(url), ArtifactKind::Data),
        }
    }

    /// Bring the cached copy of `url` up to date and return its path.
    pub fn cached_path(&self, url: &str) -> Result<PathBuf> {
        self.refresh(url).map(|(path, _)| path)
    }

    /// Like [`cached_path`](Self::cached_path), also reporting what happened.
    pub fn refresh(&self, url: &str) -> Result<(PathBuf, Outcome)> {
        self.traced(|| self.refresh_inner(url))
    }

    /// Like [`cached_path`](Self::cached_path), but falls back to the
    /// previous copy when the refresh fails softly.
    ///
    /// Network errors and unexpected statuses are logged and the existing
    /// data file is returned. Without a previous copy the error is
    /// returned as is.
    pub fn cached_path_or_stale(&self, url: &str) -> Result<PathBuf> {
        self.traced(|| match self.refresh_inner(url) {
            Ok((path, _)) => Ok(path),
            Err(e) if e.is_soft_failure() => {
                let path = self.data_path(url)?;
                if path.is_file() {
                    tracing::warn!("{}; using cached copy at {}", e, path.display());
                    Ok(path)
                } else {
                    Err(e)
                }
            }
            Err(e) => Err(e),
        })
    }

    /// Reconcile `url` onto an explicit data path.
    ///
    /// Validators live in the auto-derived cache location for `url`, so
    /// the data path may be anywhere, including the running executable.
    pub fn reconcile_at(&self, url: &str, data_path: &Path) -> Result<Outcome> {
        self.traced(|| {
            self.reconcile_inner(url, data_path, || {
                self.resolver.resolve_validators(&self.key(url))
            })
        })
    }

    /// Reconcile `url` onto `data_path` with explicit validator files.
    pub fn reconcile_with(
        &self,
        url: &str,
        data_path: &Path,
        validators: &ValidatorPaths,
    ) -> Result<Outcome> {
        self.traced(|| self.reconcile_inner(url, data_path, || Ok(validators.clone())))
    }

    fn refresh_inner(&self, url: &str) -> Result<(PathBuf, Outcome)> {
        let path = self.data_path(url)?;
        let outcome = self.reconcile_inner(url, &path, || match &self.options.path {
            Some(_) => self.resolver.resolve_validators(&self.key(url)),
            None => Ok(ValidatorPaths::beside(&path)),
        })?;
        Ok((path, outcome))
    }

    /// Validator locations are only resolved once a request is needed, so a
    /// TTL hit touches nothing but the data file's metadata.
    fn reconcile_inner(
        &self,
        url: &str,
        data_path: &Path,
        validators: impl FnOnce() -> Result<ValidatorPaths>,
    ) -> Result<Outcome> {
        tracing::debug!("Request for {} using {}", url, data_path.display());

        if let Some(parent) = data_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| CacheError::fs(parent, e))?;
        }

        let ttl = self.options.ttl;
        let freshness = check_freshness(data_path, ttl);
        if !freshness.needs_request() {
            tracing::debug!(
                "TTL {} not expired for {}",
                format_duration(ttl),
                data_path.display()
            );
            return Ok(Outcome::Fresh);
        }
        tracing::debug!("Revalidating {} ({:?})", data_path.display(), freshness);
        let validators = validators()?;

        // Validators without a body would let the origin confirm nothing
        let stored = if data_path.is_file() {
            validators.load()
        } else {
            Validators::default()
        };

        let mut response = match self.fetcher.fetch_if_changed(url, &stored)? {
            FetchResult::NotModified => {
                tracing::debug!("Not modified: {}", url);
                return Ok(Outcome::NotModified);
            }
            FetchResult::Modified(response) => response,
        };

        let mtime = if self.options.sync_mtime {
            response
                .last_modified
                .as_deref()
                .and_then(parse_http_date)
                .map(SystemTime::from)
        } else {
            None
        };

        let bytes = commit_body(url, &mut response, data_path, mtime)?;
        validators.store(response.etag.as_deref(), response.last_modified.as_deref())?;

        tracing::info!("Updated {} from {} ({} bytes)", data_path.display(), url, bytes);
        Ok(Outcome::Updated { bytes })
    }

    fn traced<T>(&self, f: impl FnOnce() -> T) -> T {
        match &self.dispatch {
            Some(dispatch) => tracing::dispatcher::with_default(dispatch, f),
            None => f(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn cache_in(temp: &TempDir) -> UrlCache {
        UrlCache::with_options(
            CacheOptions::default()
                .with_identity("unit")
                .with_search_dirs(vec![temp.path().to_path_buf()]),
        )
        .unwrap()
    }

    #[test]
    fn outcome_is_updated() {
        assert!(Outcome::Updated { bytes: 3 }.is_updated());
        assert!(!Outcome::NotModified.is_updated());
        assert!(!Outcome::Fresh.is_updated());
    }

    #[test]
    fn data_path_prefers_explicit_path() {
        let temp = TempDir::new().unwrap();
        let explicit = temp.path().join("explicit.txt");
        let cache = UrlCache::with_options(
            CacheOptions::default()
                .with_path(&explicit)
                .with_search_dirs(vec![temp.path().to_path_buf()]),
        )
        .unwrap();

        assert_eq!(cache.data_path("https://example.com/a").unwrap(), explicit);
    }

    #[test]
    fn data_path_is_auto_derived() {
        let temp = TempDir::new().unwrap();
        let cache = cache_in(&temp);
        let key = cache.key("https://example.com/a");

        let path = cache.data_path("https://example.com/a").unwrap();

        assert_eq!(
            path,
            temp.path().join("unit").join(format!("{}.data", key.digest()))
        );
    }

    #[test]
    fn auto_derived_entry_keeps_validators_beside_data() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/feed");
            then.status(200)
                .header("ETag", "\"e1\"")
                .header("Last-Modified", "Sat, 01 Jan 2000 00:00:00 GMT")
                .body("feed");
        });

        let temp = TempDir::new().unwrap();
        let cache = cache_in(&temp);
        let path = cache.cached_path(&server.url("/feed")).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "feed");
        assert_eq!(
            fs::read_to_string(path.with_extension("etag")).unwrap(),
            "\"e1\""
        );
        assert_eq!(
            fs::read_to_string(path.with_extension("since")).unwrap(),
            "Sat, 01 Jan 2000 00:00:00 GMT"
        );
    }

    #[test]
    fn ttl_short_circuit_skips_request() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/feed");
            then.status(200).body("feed");
        });

        let temp = TempDir::new().unwrap();
        let cache = UrlCache::with_options(
            CacheOptions::default()
                .with_identity("unit")
                .with_ttl(Duration::from_secs(3600))
                .with_search_dirs(vec![temp.path().to_path_buf()]),
        )
        .unwrap();

        let url = server.url("/feed");
        cache.cached_path(&url).unwrap();
        let path = cache.data_path(&url).unwrap();
        let outcome = cache
            .reconcile_with(&url, &path, &ValidatorPaths::beside(&path))
            .unwrap();

        assert_eq!(outcome, Outcome::Fresh);
        mock.assert_calls(1);
    }

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Counts events delivered to it.
    struct Counter(Arc<AtomicUsize>);

    impl tracing::Subscriber for Counter {
        fn enabled(&self, _: &tracing::Metadata<'_>) -> bool {
            true
        }
        fn new_span(&self, _: &tracing::span::Attributes<'_>) -> tracing::span::Id {
            tracing::span::Id::from_u64(1)
        }
        fn record(&self, _: &tracing::span::Id, _: &tracing::span::Record<'_>) {}
        fn record_follows_from(&self, _: &tracing::span::Id, _: &tracing::span::Id) {}
        fn event(&self, _: &tracing::Event<'_>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
        fn enter(&self, _: &tracing::span::Id) {}
        fn exit(&self, _: &tracing::span::Id) {}
    }

    fn feed_server() -> MockServer {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/feed");
            then.status(200).body("feed");
        });
        server
    }

    #[test]
    fn dispatch_receives_events() {
        let server = feed_server();
        let count = Arc::new(AtomicUsize::new(0));
        let temp = TempDir::new().unwrap();
        let cache = cache_in(&temp).with_dispatch(Dispatch::new(Counter(count.clone())));

        cache.cached_path(&server.url("/feed")).unwrap();

        assert!(count.load(Ordering::SeqCst) > 0);
    }

    #[test]
    fn events_reach_host_default_subscriber() {
        let server = feed_server();
        let count = Arc::new(AtomicUsize::new(0));
        let temp = TempDir::new().unwrap();
        let cache = cache_in(&temp);

        tracing::subscriber::with_default(Counter(count.clone()), || {
            cache.cached_path(&server.url("/feed")).unwrap();
        });

        assert!(count.load(Ordering::SeqCst) > 0);
    }

    #[test]
    fn ttl_hit_leaves_validator_location_untouched() {
        let temp = TempDir::new().unwrap();
        let data = temp.path().join("list.txt");
        fs::write(&data, "fresh").unwrap();
        let cache_dir = temp.path().join("cache");
        let cache = UrlCache::with_options(
            CacheOptions::default()
                .with_identity("unit")
                .with_ttl(Duration::from_secs(3600))
                .with_search_dirs(vec![cache_dir.clone()]),
        )
        .unwrap();

        let outcome = cache.reconcile_at("http://127.0.0.1:1/list.txt", &data).unwrap();

        assert_eq!(outcome, Outcome::Fresh);
        assert!(!cache_dir.exists());
    }
}
