//! Compile command - Repair existing wire-format sources until they build.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use forge_core::SessionStatus;

use super::generate::{build_orchestrator, persist_session, print_summary};

#[derive(Args)]
pub struct CompileArgs {
    /// Input file with sources in wire format (`[filename: ...]` blocks)
    #[arg(short, long)]
    input: PathBuf,

    /// Description of what the project is supposed to do
    #[arg(short, long, default_value = "existing Rust project")]
    description: String,

    /// Maximum number of compile attempts
    #[arg(long, default_value_t = 3)]
    max_attempts: u32,

    /// Output directory (defaults to ./output/<session-id>)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub async fn execute(args: CompileArgs) -> Result<()> {
    if !args.input.is_file() {
        anyhow::bail!("Input file not found: {:?}", args.input);
    }
    let source = fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {:?}", args.input))?;

    info!("Repairing sources from {:?}", args.input);

    let orchestrator = build_orchestrator();
    orchestrator.ensure_collections().await;

    let session = orchestrator
        .repair(&source, &args.description, args.max_attempts)
        .await;

    let output_path = args
        .output
        .unwrap_or_else(|| PathBuf::from("output").join(&session.id));
    persist_session(&session, &output_path)?;
    print_summary(&session, &output_path);

    if session.status != SessionStatus::Completed {
        anyhow::bail!(
            "generation failed: {}",
            session.message.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}
