//! RustForge CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments
//! - 3: Generation failure

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::{Cli, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const GENERATION_FAILURE: u8 = 3;
}

/// Workspace crates covered by the default log filter.
const LOG_TARGETS: [&str; 5] = [
    "forge_cli",
    "forge_core",
    "forge_llm",
    "forge_runner",
    "forge_store",
];

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.quiet {
        "warn"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };

    // Initialize logging
    let log_result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(default_filter(level))
        .try_init();

    if log_result.is_err() {
        // Logging already initialized, continue
    }

    let result = match cli.command {
        Commands::Generate(args) => commands::generate::execute(args).await,
        Commands::Compile(args) => commands::compile::execute(args).await,
        Commands::Seed(args) => commands::seed::execute(args).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

/// Build the default filter: `level` for the workspace crates, warn for
/// everything else, on top of any `RUST_LOG` directives.
fn default_filter(level: &str) -> EnvFilter {
    let mut filter = EnvFilter::from_default_env().add_directive("warn".parse().unwrap());
    for target in LOG_TARGETS {
        filter = filter.add_directive(format!("{}={}", target, level).parse().unwrap());
    }
    filter
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    let msg = e.to_string().to_lowercase();

    if msg.contains("generation failed") || msg.contains("attempt budget") {
        ExitCodes::GENERATION_FAILURE
    } else if msg.contains("argument") || msg.contains("option") || msg.contains("not found") {
        ExitCodes::INVALID_ARGS
    } else {
        ExitCodes::GENERAL_ERROR
    }
}
