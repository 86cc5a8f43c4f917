//! Collaborator contracts for the fix loop.
//!
//! The orchestrator never talks to an LLM, a compiler toolchain, or a vector
//! database directly. It goes through these traits, so every collaborator can
//! be substituted with a test double or a different backend.

use std::path::Path;

use async_trait::async_trait;

use crate::error::CoreResult;

/// Outcome of a single build or run invocation.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    /// Whether the invocation exited successfully.
    pub success: bool,
    /// Combined stdout/stderr output.
    pub output: String,
}

impl BuildOutcome {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
        }
    }

    pub fn failure(output: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
        }
    }
}

/// Generative model collaborator.
///
/// Implementations are expected to degrade gracefully: a backend that is
/// unreachable should still produce a deterministic fallback completion and
/// hash-derived pseudo-embeddings rather than failing every session.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Complete a prompt with the given system instructions.
    async fn complete(
        &self,
        prompt: &str,
        system: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> CoreResult<String>;

    /// Embed a batch of texts into fixed-length vectors.
    async fn embed(&self, texts: &[String]) -> CoreResult<Vec<Vec<f32>>>;
}

/// Compiler toolchain collaborator.
#[async_trait]
pub trait ProjectCompiler: Send + Sync {
    /// Build the project in `project_dir`.
    async fn build(&self, project_dir: &Path) -> CoreResult<BuildOutcome>;

    /// Run the project in `project_dir`. Only invoked after a successful build.
    async fn run(&self, project_dir: &Path) -> CoreResult<BuildOutcome>;
}

/// Vector store collaborator used for example retrieval.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create a collection if it does not exist yet.
    async fn create_collection(&self, name: &str, dimension: usize) -> CoreResult<()>;

    /// Upsert a single point with an opaque JSON payload.
    async fn upsert(
        &self,
        collection: &str,
        id: &str,
        vector: Vec<f32>,
        payload: serde_json::Value,
    ) -> CoreResult<()>;

    /// Search a collection, returning the ranked payloads.
    async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: usize,
    ) -> CoreResult<Vec<serde_json::Value>>;

    /// Count the points in a collection.
    async fn count(&self, collection: &str) -> CoreResult<u64>;
}
