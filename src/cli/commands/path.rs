//! Path command implementation.
//!
//! `urlcache path <URL>` prints where the data file for a URL lives (or
//! would live) without touching the network.

use anyhow::Result;
use std::io::Write;

use crate::cli::args::PathArgs;
use crate::config::CacheOptions;
use crate::reconcile::UrlCache;

use super::dispatcher::{Command, CommandResult};

/// The path command implementation.
pub struct PathCommand {
    args: PathArgs,
    options: CacheOptions,
}

impl PathCommand {
    /// Create a new path command over options loaded from file.
    pub fn new(args: PathArgs, options: CacheOptions) -> Self {
        let options = args.apply(options);
        Self { args, options }
    }
}

impl Command for PathCommand {
    fn execute(&self, out: &mut dyn Write) -> Result<CommandResult> {
        let cache = UrlCache::with_options(self.options.clone())?;
        let path = cache.data_path(&self.args.url)?;
        writeln!(out, "{}", path.display())?;
        Ok(CommandResult::success())
    }
}
