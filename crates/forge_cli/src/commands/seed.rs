//! Seed command - Load example datasets into the vector store.
//!
//! Expects the layout used by the bundled datasets:
//!
//! ```text
//! data/
//! ├── project_examples/*.json   {"query": ..., "example": ...}
//! └── error_examples/*.json     {"error": ..., "solution": ...}
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use glob::glob;
use tracing::{info, warn};

use forge_core::{GenerationClient, VectorStore, ERROR_COLLECTION, PROJECT_COLLECTION};
use forge_llm::LlamaClient;
use forge_store::QdrantStore;

#[derive(Args)]
pub struct SeedArgs {
    /// Directory holding the example datasets
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,
}

pub async fn execute(args: SeedArgs) -> Result<()> {
    if !args.data_dir.is_dir() {
        anyhow::bail!("Data directory not found: {:?}", args.data_dir);
    }

    let client = LlamaClient::from_env();
    let store = QdrantStore::from_env();
    let dimension = client.config().embedding_dimension;

    store
        .create_collection(PROJECT_COLLECTION, dimension)
        .await
        .context("Failed to create project collection")?;
    store
        .create_collection(ERROR_COLLECTION, dimension)
        .await
        .context("Failed to create error collection")?;

    let projects = seed_category(
        &client,
        &store,
        &args.data_dir.join("project_examples"),
        PROJECT_COLLECTION,
        &["query", "description"],
    )
    .await?;
    let errors = seed_category(
        &client,
        &store,
        &args.data_dir.join("error_examples"),
        ERROR_COLLECTION,
        &["error"],
    )
    .await?;

    let project_count = store.count(PROJECT_COLLECTION).await.unwrap_or(0);
    let error_count = store.count(ERROR_COLLECTION).await.unwrap_or(0);

    println!("✅ Seeding complete!");
    println!();
    println!("Loaded this run:   {} project / {} error examples", projects, errors);
    println!("Store totals:      {} project / {} error examples", project_count, error_count);

    Ok(())
}

/// Load every `*.json` file in `dir` into `collection`, embedding the first
/// present trigger field. Malformed files are skipped with a warning.
async fn seed_category(
    client: &LlamaClient,
    store: &QdrantStore,
    dir: &Path,
    collection: &str,
    trigger_keys: &[&str],
) -> Result<usize> {
    let pattern = dir.join("*.json");
    let pattern = pattern.to_string_lossy();
    let mut loaded = 0;

    for entry in glob(&pattern).context("Invalid dataset glob pattern")? {
        let path = entry.context("Failed to read dataset directory")?;
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {:?}", path))?;
        let payload: serde_json::Value = match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(e) => {
                warn!(file = %path.display(), "skipping malformed example: {}", e);
                continue;
            }
        };

        let trigger = trigger_keys
            .iter()
            .find_map(|key| payload.get(key).and_then(|v| v.as_str()));
        let Some(trigger) = trigger else {
            warn!(file = %path.display(), "skipping example without a trigger field");
            continue;
        };

        let mut vectors = client.embed(&[trigger.to_string()]).await?;
        if vectors.is_empty() {
            warn!(file = %path.display(), "skipping example: empty embedding");
            continue;
        }
        let id = uuid::Uuid::new_v4().to_string();
        store
            .upsert(collection, &id, vectors.remove(0), normalize(collection, payload))
            .await
            .with_context(|| format!("Failed to store example from {:?}", path))?;

        info!(file = %path.display(), collection, "loaded example");
        loaded += 1;
    }

    Ok(loaded)
}

/// Align seed payload keys with what retrieval reads back. Project datasets
/// index the trigger under `query`; retrieval expects `description`.
fn normalize(collection: &str, mut payload: serde_json::Value) -> serde_json::Value {
    if collection == PROJECT_COLLECTION {
        if let Some(object) = payload.as_object_mut() {
            if let Some(query) = object.remove("query") {
                object.entry("description").or_insert(query);
            }
        }
    }
    payload
}
