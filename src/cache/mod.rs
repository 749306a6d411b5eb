//! On-disk cache layout.
//!
//! This module names cache entries, finds a writable place for them and
//! reads/writes the validator files that drive conditional revalidation.
//!
//! Each cached URL owns three sibling files under
//! `<base>/<identity>/<sha256(url)>`:
//!
//! - `.data` - the body of the last successful fetch
//! - `.etag` - the `ETag` header that came with it
//! - `.since` - the `Last-Modified` header that came with it

pub mod key;
pub mod resolver;
pub mod validation;
pub mod validators;

pub use key::{
    crate_name_from_module_path, program_name, resolve_identity, url_digest, ArtifactKind,
    CacheKey,
};
pub use resolver::{default_search_dirs, PathResolver};
pub use validation::{check_freshness, format_duration, parse_ttl, Freshness};
pub use validators::{parse_http_date, ValidatorPaths, Validators};

impl PathResolver {
    /// Resolve the validator files for `key`.
    pub fn resolve_validators(&self, key: &CacheKey) -> crate::error::Result<ValidatorPaths> {
        Ok(ValidatorPaths::new(
            self.resolve_key(key, ArtifactKind::Etag)?,
            self.resolve_key(key, ArtifactKind::Since)?,
        ))
    }
}
