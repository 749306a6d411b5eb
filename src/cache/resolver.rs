//! Writable cache location discovery.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use crate::error::{CacheError, Result};

use super::key::{ArtifactKind, CacheKey};

/// Standard candidate base directories, in priority order.
///
/// The per-user cache directory comes first, followed by the shared
/// temp directories and finally the memory-backed one.
pub fn default_search_dirs() -> Vec<PathBuf> {
    let mut candidates = Vec::with_capacity(4);
    if let Some(cache) = dirs::cache_dir() {
        candidates.push(cache);
    }
    candidates.extend(["/tmp", "/var/tmp", "/dev/shm"].iter().map(PathBuf::from));
    candidates
}

/// Picks the first writable base directory for a cache entry.
#[derive(Debug, Clone)]
pub struct PathResolver {
    candidates: Vec<PathBuf>,
}

impl PathResolver {
    /// Create a resolver over the given candidate base directories.
    pub fn new(candidates: Vec<PathBuf>) -> Self {
        Self { candidates }
    }

    /// Candidate base directories, in the order they are tried.
    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    /// Resolve the path of one artifact of a cache entry.
    pub fn resolve_key(&self, key: &CacheKey, kind: ArtifactKind) -> Result<PathBuf> {
        self.resolve(&key.relative_path(kind))
    }

    /// Resolve `relative` against the first usable candidate.
    ///
    /// An existing writable file wins for its directory, so a cache that
    /// was written earlier keeps being used even when a higher-priority
    /// directory has become unwritable since. A candidate holding an
    /// existing file that can't be opened for writing is skipped.
    pub fn resolve(&self, relative: &Path) -> Result<PathBuf> {
        for dir in &self.candidates {
            let path = dir.join(relative);

            if path.is_file() {
                if OpenOptions::new().write(true).open(&path).is_ok() {
                    return Ok(path);
                }
                tracing::debug!("Cache file {} exists but is not writable", path.display());
                continue;
            }

            let Some(parent) = path.parent() else {
                continue;
            };

            if fs::create_dir_all(parent).is_ok() && probe_writable(parent) {
                return Ok(path);
            }

            tracing::debug!("Skipping unwritable cache location {}", dir.display());
        }

        Err(CacheError::NoWritableLocation {
            candidates: self.candidates.clone(),
        })
    }
}

impl Default for PathResolver {
    fn default() -> Self {
        Self::new(default_search_dirs())
    }
}

/// Create and drop a temp file in `dir`.
///
/// The probe is unlinked when the handle drops, on both paths.
fn probe_writable(dir: &Path) -> bool {
    tempfile::Builder::new()
        .prefix(".probe")
        .tempfile_in(dir)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// A path that can never become a directory, even for root.
    fn blocked_dir(temp: &TempDir) -> PathBuf {
        let file = temp.path().join("not-a-dir");
        fs::write(&file, "").unwrap();
        file.join("cache")
    }

    #[test]
    fn default_search_dirs_order() {
        let dirs = default_search_dirs();
        let tail: Vec<_> = dirs.iter().rev().take(3).rev().cloned().collect();
        assert_eq!(
            tail,
            vec![
                PathBuf::from("/tmp"),
                PathBuf::from("/var/tmp"),
                PathBuf::from("/dev/shm")
            ]
        );
    }

    #[test]
    fn resolves_into_first_candidate() {
        let temp = TempDir::new().unwrap();
        let first = temp.path().join("first");
        let second = temp.path().join("second");
        let resolver = PathResolver::new(vec![first.clone(), second]);

        let path = resolver.resolve(Path::new("tool/abc.data")).unwrap();

        assert_eq!(path, first.join("tool/abc.data"));
        assert!(first.join("tool").is_dir());
        assert!(!path.exists());
    }

    #[test]
    fn falls_back_when_primary_unusable() {
        let temp = TempDir::new().unwrap();
        let blocked = blocked_dir(&temp);
        let fallback = temp.path().join("fallback");
        let resolver = PathResolver::new(vec![blocked, fallback.clone()]);

        let path = resolver.resolve(Path::new("tool/abc.data")).unwrap();

        assert_eq!(path, fallback.join("tool/abc.data"));
    }

    #[test]
    fn existing_file_in_lower_priority_dir_is_reused() {
        let temp = TempDir::new().unwrap();
        let blocked = blocked_dir(&temp);
        let second = temp.path().join("second");
        let third = temp.path().join("third");
        let existing = third.join("tool/abc.data");
        fs::create_dir_all(existing.parent().unwrap()).unwrap();
        fs::write(&existing, "cached").unwrap();

        // second is usable, so it still wins over the existing file in third
        let resolver = PathResolver::new(vec![blocked.clone(), second.clone(), third.clone()]);
        let path = resolver.resolve(Path::new("tool/abc.data")).unwrap();
        assert_eq!(path, second.join("tool/abc.data"));

        let resolver = PathResolver::new(vec![blocked, third]);
        let path = resolver.resolve(Path::new("tool/abc.data")).unwrap();
        assert_eq!(path, existing);
    }

    #[cfg(unix)]
    #[test]
    fn read_only_existing_file_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let first = temp.path().join("first");
        let second = temp.path().join("second");
        let existing = first.join("tool/abc.data");
        fs::create_dir_all(existing.parent().unwrap()).unwrap();
        fs::write(&existing, "cached").unwrap();
        fs::set_permissions(&existing, fs::Permissions::from_mode(0o444)).unwrap();

        // Permission bits don't stop root
        if OpenOptions::new().write(true).open(&existing).is_ok() {
            return;
        }

        let resolver = PathResolver::new(vec![first, second.clone()]);
        let path = resolver.resolve(Path::new("tool/abc.data")).unwrap();

        assert_eq!(path, second.join("tool/abc.data"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn busy_executable_is_skipped() {
        use std::os::unix::fs::PermissionsExt;
        use std::process::{Command, Stdio};

        let Some(sleep) = ["/bin/sleep", "/usr/bin/sleep"]
            .iter()
            .map(Path::new)
            .find(|p| p.is_file())
        else {
            return;
        };

        let temp = TempDir::new().unwrap();
        let first = temp.path().join("first");
        let second = temp.path().join("second");
        let existing = first.join("tool/abc.data");
        fs::create_dir_all(existing.parent().unwrap()).unwrap();
        fs::copy(sleep, &existing).unwrap();
        fs::set_permissions(&existing, fs::Permissions::from_mode(0o755)).unwrap();

        // ETXTBSY (26) while another test's forked child still holds a write fd
        let mut child = None;
        for _ in 0..50 {
            match Command::new(&existing).arg("30").stdout(Stdio::null()).spawn() {
                Ok(c) => {
                    child = Some(c);
                    break;
                }
                Err(e) if e.raw_os_error() == Some(26) => {
                    std::thread::sleep(std::time::Duration::from_millis(20));
                }
                Err(e) => panic!("spawn failed: {e}"),
            }
        }
        let mut child = child.expect("could not spawn copied executable");

        let resolver = PathResolver::new(vec![first, second.clone()]);
        let result = resolver.resolve(Path::new("tool/abc.data"));
        let _ = child.kill();
        let _ = child.wait();

        assert_eq!(result.unwrap(), second.join("tool/abc.data"));
    }

    #[test]
    fn no_writable_location_reports_candidates() {
        let temp = TempDir::new().unwrap();
        let blocked = blocked_dir(&temp);
        let resolver = PathResolver::new(vec![blocked.clone()]);

        let err = resolver.resolve(Path::new("tool/abc.data")).unwrap_err();

        match err {
            CacheError::NoWritableLocation { candidates } => {
                assert_eq!(candidates, vec![blocked]);
            }
            other => panic!("expected NoWritableLocation, got {other:?}"),
        }
    }

    #[test]
    fn empty_candidate_list_fails() {
        let resolver = PathResolver::new(vec![]);
        assert!(resolver.resolve(Path::new("x/y.data")).is_err());
    }

    #[test]
    fn probe_leaves_no_files_behind() {
        let temp = TempDir::new().unwrap();
        let base = temp.path().join("base");
        let resolver = PathResolver::new(vec![base.clone()]);

        resolver.resolve(Path::new("tool/abc.data")).unwrap();

        let leftovers: Vec<_> = fs::read_dir(base.join("tool")).unwrap().collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn resolve_key_uses_artifact_suffix() {
        let temp = TempDir::new().unwrap();
        let resolver = PathResolver::new(vec![temp.path().to_path_buf()]);
        let key = CacheKey::new("https://example.com/feed", Some("tool"));

        let path = resolver.resolve_key(&key, ArtifactKind::Etag).unwrap();

        assert_eq!(
            path,
            temp.path().join("tool").join(format!("{}.etag", key.digest()))
        );
    }
}
