//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use anyhow::Result;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::cli::args::{Cli, Commands};
use crate::config::{load_options, CacheOptions};

/// Trait for command implementations.
///
/// Each CLI subcommand implements this trait to provide its execution logic.
pub trait Command {
    /// Execute the command, writing user-facing output to `out`.
    fn execute(&self, out: &mut dyn Write) -> Result<CommandResult>;
}

/// Result of command execution.
///
/// Failures are returned as errors, which `main` turns into exit code 1.
#[derive(Debug)]
pub struct CommandResult {
    /// Exit code to use.
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self { exit_code: 0 }
    }
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    config: Option<PathBuf>,
}

impl CommandDispatcher {
    /// Create a new dispatcher with an optional options file override.
    pub fn new(config: Option<PathBuf>) -> Self {
        Self { config }
    }

    /// Get the options file override.
    pub fn config(&self) -> Option<&Path> {
        self.config.as_deref()
    }

    fn options(&self) -> Result<CacheOptions> {
        Ok(load_options(self.config())?)
    }

    /// Dispatch and execute a command.
    pub fn dispatch(&self, cli: &Cli, out: &mut dyn Write) -> Result<CommandResult> {
        match &cli.command {
            Commands::Fetch(args) => {
                let cmd = super::fetch::FetchCommand::new(args.clone(), self.options()?);
                cmd.execute(out)
            }
            Commands::Path(args) => {
                let cmd = super::path::PathCommand::new(args.clone(), self.options()?);
                cmd.execute(out)
            }
            Commands::Completions(args) => {
                let cmd = super::completions::CompletionsCommand::new(args.clone());
                cmd.execute(out)
            }
        }
    }
}
