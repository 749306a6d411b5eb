//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use std::time::Duration;

use crate::cache::parse_ttl;
use crate::config::CacheOptions;

/// urlcache - Keep a local copy of a remote file up to date.
#[derive(Debug, Parser)]
#[command(name = "urlcache")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to options file (overrides URLCACHE_CONFIG and the user config)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Download or revalidate a URL and print the cached file's path
    Fetch(FetchArgs),

    /// Print where a URL would be cached, without fetching it
    Path(PathArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `fetch` command.
#[derive(Debug, Clone, clap::Args)]
pub struct FetchArgs {
    /// URL to fetch
    pub url: String,

    /// Skip the network while the cached copy is younger than this (e.g. 30m, 1h, 7d)
    #[arg(long, value_parser = parse_duration_arg)]
    pub ttl: Option<Duration>,

    /// Cache at this path instead of an auto-derived one
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Namespace for auto-derived paths
    #[arg(long, value_name = "NAME")]
    pub identity: Option<String>,

    /// Set the file's mtime to the server's Last-Modified
    #[arg(long)]
    pub sync_mtime: bool,

    /// Request timeout (e.g. 10s, 2m)
    #[arg(long, value_parser = parse_duration_arg)]
    pub timeout: Option<Duration>,

    /// On network errors or bad responses, fall back to the existing copy
    #[arg(long)]
    pub stale_ok: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl FetchArgs {
    /// Layer these flags over options loaded from a file.
    pub fn apply(&self, mut options: CacheOptions) -> CacheOptions {
        if let Some(ttl) = self.ttl {
            options.ttl = ttl;
        }
        if let Some(output) = &self.output {
            options.path = Some(output.clone());
        }
        if let Some(identity) = &self.identity {
            options.identity = Some(identity.clone());
        }
        if self.sync_mtime {
            options.sync_mtime = true;
        }
        if let Some(timeout) = self.timeout {
            options.timeout = timeout;
        }
        options
    }
}

/// Arguments for the `path` command.
#[derive(Debug, Clone, clap::Args)]
pub struct PathArgs {
    /// URL to look up
    pub url: String,

    /// Namespace for auto-derived paths
    #[arg(long, value_name = "NAME")]
    pub identity: Option<String>,
}

impl PathArgs {
    /// Layer these flags over options loaded from a file.
    pub fn apply(&self, mut options: CacheOptions) -> CacheOptions {
        if let Some(identity) = &self.identity {
            options.identity = Some(identity.clone());
        }
        options
    }
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

fn parse_duration_arg(value: &str) -> Result<Duration, String> {
    parse_ttl(value).map_err(|e| e.to_string())
}
