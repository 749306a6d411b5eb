//! Configuration for the cache.
//!
//! - Option definitions and defaults in [`options`]
//! - Options file discovery and loading in [`loader`]
//!
//! # Example
//!
//! ```
//! use urlcache::config::{parse_options, CacheOptions};
//! use std::path::Path;
//! use std::time::Duration;
//!
//! let options = parse_options("ttl: 1h\nidentity: feeds", Path::new("config.yml")).unwrap();
//! assert_eq!(options.ttl, Duration::from_secs(3600));
//! assert_eq!(options, CacheOptions::default()
//!     .with_ttl(Duration::from_secs(3600))
//!     .with_identity("feeds"));
//! ```

pub mod loader;
pub mod options;

pub use loader::{
    discover_config, load_options, load_options_file, parse_options, user_config_path, CONFIG_ENV,
};
pub use options::CacheOptions;
