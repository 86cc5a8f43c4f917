//! Generate command - Generate a project from a natural-language description.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use forge_core::{FixLoopOrchestrator, GenerationSession, OrchestratorConfig, SessionStatus};
use forge_llm::LlamaClient;
use forge_runner::CargoRunner;
use forge_store::QdrantStore;

#[derive(Args)]
pub struct GenerateArgs {
    /// Natural-language description of the project to generate
    #[arg(short, long)]
    description: String,

    /// Additional requirements appended to the generation prompt
    #[arg(short, long)]
    requirements: Option<String>,

    /// Maximum number of compile attempts
    #[arg(long, default_value_t = 3)]
    max_attempts: u32,

    /// Output directory (defaults to ./output/<session-id>)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub async fn execute(args: GenerateArgs) -> Result<()> {
    info!("Generating project: {}", args.description);

    let orchestrator = build_orchestrator();
    orchestrator.ensure_collections().await;

    let session = orchestrator
        .run(
            &args.description,
            args.requirements.as_deref(),
            args.max_attempts,
        )
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

/// Wire the collaborators from their environment configurations.
pub(crate) fn build_orchestrator() -> FixLoopOrchestrator {
    let client = LlamaClient::from_env();
    let config = OrchestratorConfig {
        embedding_dimension: client.config().embedding_dimension,
        ..OrchestratorConfig::default()
    };
    FixLoopOrchestrator::new(
        Arc::new(client),
        Arc::new(CargoRunner::from_env()),
        Arc::new(QdrantStore::from_env()),
        config,
    )
}

/// Write the generated sources and the session record (`status.json`) to
/// the output directory.
pub(crate) fn persist_session(session: &GenerationSession, output_path: &Path) -> Result<()> {
    session
        .files
        .write_to(output_path)
        .with_context(|| format!("Failed to write project to {:?}", output_path))?;

    let status = serde_json::to_string_pretty(session)?;
    fs::write(output_path.join("status.json"), status)
        .context("Failed to write session record")?;
    Ok(())
}

pub(crate) fn print_summary(session: &GenerationSession, output_path: &Path) {
    let succeeded = session.status == SessionStatus::Completed;
    if succeeded {
        println!(
            "✅ Project generated successfully after {} attempt(s)!",
            session.attempts.len()
        );
    } else {
        println!(
            "❌ Generation failed after {} attempt(s): {}",
            session.attempts.len(),
            session.message.as_deref().unwrap_or("unknown error")
        );
    }
    println!();
    println!("Session:  {}", session.id);
    println!("Location: {:?}", output_path);
    println!("Files:    {}", session.files.len());

    if let Some(run_output) = &session.run_output {
        if !run_output.is_empty() {
            println!();
            println!("Run output:");
            println!("{}", run_output.trim_end());
        }
    }
    if !succeeded {
        if let Some(diagnostic) = session.last_failure_diagnostic() {
            println!();
            println!("Last compiler output:");
            println!("{}", diagnostic.trim_end());
        }
    }
}
