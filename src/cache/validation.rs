//! TTL freshness checks and TTL string handling.

use std::path::Path;
use std::time::{Duration, SystemTime};

use crate::error::{CacheError, Result};

/// Result of checking a data file against the configured TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// No TTL configured; always revalidate.
    Disabled,
    /// No data file yet.
    Missing,
    /// Younger than the TTL; skip the network.
    Fresh,
    /// Older than the TTL; revalidate.
    Expired,
}

impl Freshness {
    /// Whether a request must be made.
    pub fn needs_request(self) -> bool {
        !matches!(self, Freshness::Fresh)
    }
}

/// Modification time of `path`, if it exists.
pub fn modified_time(path: &Path) -> Option<SystemTime> {
    path.metadata().and_then(|m| m.modified()).ok()
}

/// Check the data file at `path` against `ttl`.
///
/// A zero TTL disables the short-circuit. An mtime in the future counts as
/// fresh.
pub fn check_freshness(path: &Path, ttl: Duration) -> Freshness {
    if ttl.is_zero() {
        return Freshness::Disabled;
    }

    let Some(mtime) = modified_time(path) else {
        return Freshness::Missing;
    };

    match mtime.elapsed() {
        Ok(age) if age >= ttl => Freshness::Expired,
        _ => Freshness::Fresh,
    }
}

/// Parse a TTL string like "7d", "24h", "30m".
pub fn parse_ttl(ttl: &str) -> Result<Duration> {
    let normalized = ttl.trim().to_lowercase();
    let invalid = || CacheError::InvalidTtl {
        value: ttl.to_string(),
    };

    let (digits, unit) = if let Some(days) = normalized.strip_suffix('d') {
        (days, 86400)
    } else if let Some(hours) = normalized.strip_suffix('h') {
        (hours, 3600)
    } else if let Some(mins) = normalized.strip_suffix('m') {
        (mins, 60)
    } else if let Some(secs) = normalized.strip_suffix('s') {
        (secs, 1)
    } else {
        // Assume seconds if no suffix
        (normalized.as_str(), 1)
    };

    let n: u64 = digits.trim().parse().map_err(|_| invalid())?;
    n.checked_mul(unit)
        .map(Duration::from_secs)
        .ok_or_else(invalid)
}

/// Format a duration for display.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();

    if secs >= 86400 && secs % 86400 == 0 {
        format!("{}d", secs / 86400)
    } else if secs >= 3600 && secs % 3600 == 0 {
        format!("{}h", secs / 3600)
    } else if secs >= 60 && secs % 60 == 0 {
        format!("{}m", secs / 60)
    } else {
        format!("{}s", secs)
    }
}

/// Serde adapter reading TTLs as strings ("1h") or bare seconds.
pub mod serde_ttl {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Secs(u64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(ttl: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_duration(*ttl))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Secs(secs) => Ok(Duration::from_secs(secs)),
            Raw::Text(text) => super::parse_ttl(&text).map_err(serde::de::Error::custom),
        }
    }
}
