//! Stored HTTP validators (`ETag` / `Last-Modified`).

use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CacheError, Result};

/// Locations of the two validator files of a cache entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorPaths {
    /// File holding the raw `ETag` header value.
    pub etag: PathBuf,
    /// File holding the raw `Last-Modified` header value.
    pub since: PathBuf,
}

/// Validators read back from disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validators {
    /// Opaque entity tag, quotes included.
    pub etag: Option<String>,
    /// Last-Modified text exactly as the server sent it.
    pub last_modified: Option<String>,
}

impl ValidatorPaths {
    /// Create from explicit file locations.
    pub fn new(etag: impl Into<PathBuf>, since: impl Into<PathBuf>) -> Self {
        Self {
            etag: etag.into(),
            since: since.into(),
        }
    }

    /// Sibling validator files next to a data file (`<stem>.etag`, `<stem>.since`).
    pub fn beside(data_path: &Path) -> Self {
        Self {
            etag: data_path.with_extension("etag"),
            since: data_path.with_extension("since"),
        }
    }

    /// Read the stored validators.
    ///
    /// A missing, empty or unreadable file means "no validator". A stored
    /// Last-Modified that isn't a valid HTTP date is ignored as well.
    pub fn load(&self) -> Validators {
        let etag = read_trimmed(&self.etag);
        let last_modified = read_trimmed(&self.since).filter(|lm| {
            let valid = parse_http_date(lm).is_some();
            if !valid {
                tracing::debug!("Ignoring unparsable stored Last-Modified {:?}", lm);
            }
            valid
        });

        Validators {
            etag,
            last_modified,
        }
    }

    /// Persist validators from a 200 response.
    ///
    /// A non-empty ETag replaces the stored one; without one the stale file
    /// is removed so it can't be sent against a body it doesn't describe.
    /// The Last-Modified text is always written, possibly empty.
    pub fn store(&self, etag: Option<&str>, last_modified: Option<&str>) -> Result<()> {
        match etag.filter(|e| !e.is_empty()) {
            Some(etag) => write_atomic(&self.etag, etag)?,
            None => remove_if_exists(&self.etag)?,
        }
        write_atomic(&self.since, last_modified.unwrap_or_default())
    }
}

/// Parse an HTTP-date (`Sun, 06 Nov 1994 08:49:37 GMT`).
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn read_trimmed(path: &Path) -> Option<String> {
    let content = fs::read_to_string(path).ok()?;
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Write via a sibling `.tmp` file and rename over the target.
fn write_atomic(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| CacheError::fs(parent, e))?;
    }

    let temp_path = tmp_sibling(path);
    fs::write(&temp_path, content).map_err(|e| CacheError::fs(&temp_path, e))?;
    fs::rename(&temp_path, path).map_err(|e| CacheError::fs(path, e))?;
    Ok(())
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(CacheError::fs(path, e)),
    }
}

/// `<path>.tmp` in the same directory.
pub(crate) fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}
