//! urlcache CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use urlcache::cli::{Cli, CommandDispatcher};

/// Initialize the tracing subscriber for logging.
///
/// Log level is controlled by:
/// 1. `--debug` flag sets level to DEBUG
/// 2. `--quiet` flag sets level to ERROR
/// 3. `RUST_LOG` environment variable (if set)
/// 4. Default is INFO
///
/// Logs go to stderr; stdout carries only command output.
fn init_tracing(debug: bool, quiet: bool) {
    let filter = if debug {
        EnvFilter::new("urlcache=debug")
    } else if quiet {
        EnvFilter::new("urlcache=error")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("urlcache=info"))
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug, cli.quiet);

    tracing::debug!("urlcache starting with args: {:?}", cli);

    let dispatcher = CommandDispatcher::new(cli.config.clone());
    let mut stdout = std::io::stdout().lock();

    match dispatcher.dispatch(&cli, &mut stdout) {
        Ok(result) => ExitCode::from(result.exit_code as u8),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}
