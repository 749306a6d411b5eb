//! Fetch command implementation.
//!
//! `urlcache fetch <URL>` brings the cached copy up to date and prints its
//! path, so scripts can do `list=$(urlcache fetch https://...)`.

use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;

use crate::cli::args::FetchArgs;
use crate::config::CacheOptions;
use crate::reconcile::{Outcome, UrlCache};

use super::dispatcher::{Command, CommandResult};

/// The fetch command implementation.
pub struct FetchCommand {
    args: FetchArgs,
    options: CacheOptions,
}

/// Machine-readable result of a fetch.
#[derive(Debug, Serialize)]
pub struct FetchReport {
    pub url: String,
    pub path: PathBuf,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FetchReport {
    fn from_outcome(url: &str, path: PathBuf, outcome: Outcome) -> Self {
        let (status, bytes) = match outcome {
            Outcome::Fresh => ("fresh", None),
            Outcome::NotModified => ("not_modified", None),
            Outcome::Updated { bytes } => ("updated", Some(bytes)),
        };
        Self {
            url: url.to_string(),
            path,
            status,
            bytes,
            error: None,
        }
    }

    fn stale(url: &str, path: PathBuf, error: String) -> Self {
        Self {
            url: url.to_string(),
            path,
            status: "stale",
            bytes: None,
            error: Some(error),
        }
    }
}

impl FetchCommand {
    /// Create a new fetch command over options loaded from file.
    pub fn new(args: FetchArgs, options: CacheOptions) -> Self {
        let options = args.apply(options);
        Self { args, options }
    }

    /// The effective options after applying flags.
    pub fn options(&self) -> &CacheOptions {
        &self.options
    }

    fn run(&self) -> Result<FetchReport> {
        let url = &self.args.url;
        let cache = UrlCache::with_options(self.options.clone())?;

        match cache.refresh(url) {
            Ok((path, outcome)) => Ok(FetchReport::from_outcome(url, path, outcome)),
            Err(e) if self.args.stale_ok && e.is_soft_failure() => {
                let path = cache.data_path(url)?;
                if !path.is_file() {
                    return Err(e).with_context(|| format!("No cached copy of {}", url));
                }
                tracing::warn!("{}; using cached copy", e);
                Ok(FetchReport::stale(url, path, e.to_string()))
            }
            Err(e) => Err(e).with_context(|| format!("Failed to fetch {}", url)),
        }
    }
}

impl Command for FetchCommand {
    fn execute(&self, out: &mut dyn Write) -> Result<CommandResult> {
        let report = self.run()?;

        if self.args.json {
            writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
        } else {
            writeln!(out, "{}", report.path.display())?;
        }

        Ok(CommandResult::success())
    }
}
