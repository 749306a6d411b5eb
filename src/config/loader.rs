//! Options file discovery and loading.
//!
//! Options are looked up in this order, first hit wins:
//! 1. An explicit path (the CLI's `--config`)
//! 2. The `URLCACHE_CONFIG` environment variable
//! 3. The user config file (`~/.config/urlcache/config.yml` on Linux)
//!
//! Without any of these, [`CacheOptions::default`] is used.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::CacheOptions;
use crate::error::{CacheError, Result};

/// Environment variable naming an options file.
pub const CONFIG_ENV: &str = "URLCACHE_CONFIG";

/// User config file location, if the platform has a config directory.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("urlcache").join("config.yml"))
}

/// Find the options file to load, if any.
///
/// An explicit path or `URLCACHE_CONFIG` is returned even when missing, so
/// loading it reports the mistake. The user config is only returned when it
/// exists.
pub fn discover_config(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(path));
    }

    user_config_path().filter(|p| p.is_file())
}

/// Load a single options file.
///
/// # Errors
///
/// Returns `ConfigNotFound` if the file doesn't exist.
/// Returns `ConfigParse` if the YAML is invalid.
pub fn load_options_file(path: &Path) -> Result<CacheOptions> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            CacheError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            CacheError::fs(path, e)
        }
    })?;

    parse_options(&content, path)
}

/// Parse YAML content into CacheOptions.
///
/// An empty document yields the defaults.
pub fn parse_options(content: &str, source_path: &Path) -> Result<CacheOptions> {
    if content.trim().is_empty() {
        return Ok(CacheOptions::default());
    }

    serde_yaml::from_str(content).map_err(|e| CacheError::ConfigParse {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load options with optional path override.
pub fn load_options(explicit: Option<&Path>) -> Result<CacheOptions> {
    match discover_config(explicit) {
        Some(path) => {
            tracing::debug!("Loading options from {}", path.display());
            load_options_file(&path)
        }
        None => Ok(CacheOptions::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn explicit_path_wins() {
        let path = Path::new("/etc/urlcache.yml");
        assert_eq!(discover_config(Some(path)), Some(path.to_path_buf()));
    }

    #[test]
    fn user_config_path_ends_with_config_yml() {
        if let Some(path) = user_config_path() {
            assert!(path.ends_with("urlcache/config.yml"));
        }
    }

    #[test]
    fn load_options_file_parses_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yml");
        fs::write(&path, "ttl: 15m\nsync_mtime: true\nsearch_dirs: [/srv/cache]\n").unwrap();

        let options = load_options_file(&path).unwrap();

        assert_eq!(options.ttl, Duration::from_secs(900));
        assert!(options.sync_mtime);
        assert_eq!(options.search_dirs, Some(vec![PathBuf::from("/srv/cache")]));
    }

    #[test]
    fn load_missing_file_is_config_not_found() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("missing.yml");

        let err = load_options_file(&path).unwrap_err();
        assert!(matches!(err, CacheError::ConfigNotFound { .. }));
    }

    #[test]
    fn invalid_yaml_is_config_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yml");
        fs::write(&path, "ttl: [unclosed").unwrap();

        let err = load_options_file(&path).unwrap_err();
        match err {
            CacheError::ConfigParse { path: p, .. } => assert_eq!(p, path),
            other => panic!("expected ConfigParse, got {other:?}"),
        }
    }

    #[test]
    fn empty_file_yields_defaults() {
        let options = parse_options("  \n", Path::new("config.yml")).unwrap();
        assert_eq!(options, CacheOptions::default());
    }

    #[test]
    fn load_options_with_explicit_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("opts.yml");
        fs::write(&path, "identity: feeds\n").unwrap();

        let options = load_options(Some(&path)).unwrap();
        assert_eq!(options.identity.as_deref(), Some("feeds"));
    }
}
