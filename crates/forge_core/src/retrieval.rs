//! Retrieval augmentation: finding similar past projects and fixes, and
//! recording new successes.
//!
//! Retrieval is an optimization, not a dependency: every collaborator
//! failure here degrades to a warning and an empty result so the fix loop
//! never stalls on the store.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::diagnostics::ErrorContext;
use crate::error::{CoreError, CoreResult};
use crate::files::{FileSet, MANIFEST_PATH, README_PATH};
use crate::traits::{GenerationClient, VectorStore};

/// Collection holding successful project examples.
pub const PROJECT_COLLECTION: &str = "project_examples";

/// Collection holding compile-error fix examples.
pub const ERROR_COLLECTION: &str = "error_examples";

const PROJECT_EXCERPT_LIMIT: usize = 10_000;
const FIX_EXCERPT_LIMIT: usize = 5_000;
const DESCRIPTION_EXCERPT_LIMIT: usize = 500;

/// Which kind of example to retrieve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExampleCategory {
    /// Whole-project examples, queried by description.
    Project,
    /// Error/fix pairs, queried by diagnostic text.
    Error,
}

impl ExampleCategory {
    pub fn collection(&self) -> &'static str {
        match self {
            Self::Project => PROJECT_COLLECTION,
            Self::Error => ERROR_COLLECTION,
        }
    }
}

/// A retrieved example: the text that triggered it and the stored solution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievalExample {
    /// The text this example is indexed under (description or diagnostic).
    pub trigger_text: String,
    /// The stored solution (wire-format project or fix).
    pub solution_text: String,
}

/// Store-backed example retrieval and recording.
pub struct RetrievalAugmenter {
    generator: Arc<dyn GenerationClient>,
    store: Arc<dyn VectorStore>,
}

impl RetrievalAugmenter {
    pub fn new(generator: Arc<dyn GenerationClient>, store: Arc<dyn VectorStore>) -> Self {
        Self { generator, store }
    }

    /// Create both example collections. Failures are non-fatal.
    pub async fn ensure_collections(&self, dimension: usize) {
        for name in [PROJECT_COLLECTION, ERROR_COLLECTION] {
            if let Err(e) = self.store.create_collection(name, dimension).await {
                warn!(collection = name, "failed to create collection: {}", e);
            }
        }
    }

    /// Find up to `limit` examples similar to `query` in the given category.
    ///
    /// Any embedding or search failure yields an empty result.
    pub async fn find_similar(
        &self,
        query: &str,
        category: ExampleCategory,
        limit: usize,
    ) -> Vec<RetrievalExample> {
        match self.find_similar_inner(query, category, limit).await {
            Ok(examples) => {
                debug!(
                    collection = category.collection(),
                    found = examples.len(),
                    "retrieved similar examples"
                );
                examples
            }
            Err(e) => {
                warn!(
                    collection = category.collection(),
                    "retrieval unavailable, continuing without examples: {}", e
                );
                Vec::new()
            }
        }
    }

    async fn find_similar_inner(
        &self,
        query: &str,
        category: ExampleCategory,
        limit: usize,
    ) -> CoreResult<Vec<RetrievalExample>> {
        let vector = self.embed_one(query).await?;
        let payloads = self
            .store
            .search(category.collection(), vector, limit)
            .await?;
        Ok(payloads
            .iter()
            .filter_map(|p| example_from_payload(category, p))
            .collect())
    }

    /// Record a successfully compiled project for future reference.
    /// Failures are logged and swallowed.
    pub async fn record_project(&self, files: &FileSet, wire_text: &str) {
        let description = project_description(files);
        let payload = serde_json::json!({
            "description": description,
            "example": truncate(wire_text, PROJECT_EXCERPT_LIMIT),
        });

        if let Err(e) = self
            .upsert_with_embedding(PROJECT_COLLECTION, &description, payload)
            .await
        {
            warn!("failed to store project example: {}", e);
        }
    }

    /// Record a successful fix: the diagnostic paired with the repaired
    /// project. Failures are logged and swallowed.
    pub async fn record_fix(&self, context: &ErrorContext, fixed: &FileSet) {
        let payload = serde_json::json!({
            "error": context.full_diagnostic,
            "solution": truncate(&fixed.to_wire(), FIX_EXCERPT_LIMIT),
        });

        if let Err(e) = self
            .upsert_with_embedding(ERROR_COLLECTION, &context.full_diagnostic, payload)
            .await
        {
            warn!("failed to store fix example: {}", e);
        }
    }

    async fn upsert_with_embedding(
        &self,
        collection: &str,
        text: &str,
        payload: serde_json::Value,
    ) -> CoreResult<()> {
        let vector = self.embed_one(text).await?;
        let id = uuid::Uuid::new_v4().to_string();
        self.store.upsert(collection, &id, vector, payload).await
    }

    async fn embed_one(&self, text: &str) -> CoreResult<Vec<f32>> {
        let mut vectors = self.generator.embed(&[text.to_string()]).await?;
        if vectors.is_empty() || vectors[0].is_empty() {
            return Err(CoreError::Generation("empty embedding".to_string()));
        }
        Ok(vectors.remove(0))
    }
}

/// Map a stored payload back to an example for its category.
fn example_from_payload(
    category: ExampleCategory,
    payload: &serde_json::Value,
) -> Option<RetrievalExample> {
    let (trigger_key, solution_key) = match category {
        ExampleCategory::Project => ("description", "example"),
        ExampleCategory::Error => ("error", "solution"),
    };
    let trigger_text = payload.get(trigger_key)?.as_str()?.to_string();
    let solution_text = payload.get(solution_key)?.as_str()?.to_string();
    Some(RetrievalExample {
        trigger_text,
        solution_text,
    })
}

/// Derive a short description for a project payload: the readme excerpt when
/// present, otherwise the manifest, otherwise a fixed label.
fn project_description(files: &FileSet) -> String {
    if let Some(readme) = files.get(README_PATH) {
        truncate(readme, DESCRIPTION_EXCERPT_LIMIT)
    } else if let Some(manifest) = files.get(MANIFEST_PATH) {
        truncate(manifest, DESCRIPTION_EXCERPT_LIMIT)
    } else {
        "Rust project".to_string()
    }
}

fn truncate(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FixedEmbedder;

    #[async_trait]
    impl GenerationClient for FixedEmbedder {
        async fn complete(
            &self,
            _prompt: &str,
            _system: &str,
            _max_tokens: u32,
            _temperature: f32,
        ) -> CoreResult<String> {
            Ok(String::new())
        }

        async fn embed(&self, texts: &[String]) -> CoreResult<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![0.5_f32; 4]).collect())
        }
    }

    struct ScriptedStore {
        results: Vec<serde_json::Value>,
        upserts: Mutex<Vec<(String, serde_json::Value)>>,
        fail: bool,
    }

    impl ScriptedStore {
        fn with_results(results: Vec<serde_json::Value>) -> Self {
            Self {
                results,
                upserts: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                results: Vec::new(),
                upserts: Mutex::new(Vec::new()),
                fail: true,
            }
        }
    }

    #[async_trait]
    impl VectorStore for ScriptedStore {
        async fn create_collection(&self, _name: &str, _dimension: usize) -> CoreResult<()> {
            Ok(())
        }

        async fn upsert(
            &self,
            collection: &str,
            _id: &str,
            _vector: Vec<f32>,
            payload: serde_json::Value,
        ) -> CoreResult<()> {
            if self.fail {
                return Err(CoreError::Store("unreachable".to_string()));
            }
            self.upserts
                .lock()
                .unwrap()
                .push((collection.to_string(), payload));
            Ok(())
        }

        async fn search(
            &self,
            _collection: &str,
            _vector: Vec<f32>,
            limit: usize,
        ) -> CoreResult<Vec<serde_json::Value>> {
            if self.fail {
                return Err(CoreError::Store("unreachable".to_string()));
            }
            Ok(self.results.iter().take(limit).cloned().collect())
        }

        async fn count(&self, _collection: &str) -> CoreResult<u64> {
            Ok(self.results.len() as u64)
        }
    }

    fn augmenter(store: ScriptedStore) -> RetrievalAugmenter {
        RetrievalAugmenter::new(Arc::new(FixedEmbedder), Arc::new(store))
    }

    #[tokio::test]
    async fn test_find_similar_maps_error_payloads() {
        let store = ScriptedStore::with_results(vec![serde_json::json!({
            "error": "error[E0308]: mismatched types",
            "solution": "use .to_string()",
        })]);
        let examples = augmenter(store)
            .find_similar("error[E0308]", ExampleCategory::Error, 3)
            .await;

        assert_eq!(examples.len(), 1);
        assert_eq!(examples[0].trigger_text, "error[E0308]: mismatched types");
        assert_eq!(examples[0].solution_text, "use .to_string()");
    }

    #[tokio::test]
    async fn test_find_similar_maps_project_payloads() {
        let store = ScriptedStore::with_results(vec![serde_json::json!({
            "description": "a chess game",
            "example": "[filename: Cargo.toml]\n...",
        })]);
        let examples = augmenter(store)
            .find_similar("chess", ExampleCategory::Project, 1)
            .await;

        assert_eq!(examples.len(), 1);
        assert_eq!(examples[0].trigger_text, "a chess game");
    }

    #[tokio::test]
    async fn test_store_failure_yields_empty_results() {
        let examples = augmenter(ScriptedStore::failing())
            .find_similar("anything", ExampleCategory::Error, 3)
            .await;

        assert!(examples.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_payloads_are_skipped() {
        let store = ScriptedStore::with_results(vec![
            serde_json::json!({"unexpected": "shape"}),
            serde_json::json!({"error": "e", "solution": "s"}),
        ]);
        let examples = augmenter(store)
            .find_similar("e", ExampleCategory::Error, 5)
            .await;

        assert_eq!(examples.len(), 1);
    }

    #[tokio::test]
    async fn test_record_project_prefers_readme_description() {
        let store = Arc::new(ScriptedStore::with_results(Vec::new()));
        let augmenter = RetrievalAugmenter::new(Arc::new(FixedEmbedder), store.clone());

        let mut files = FileSet::new();
        files.insert(README_PATH, "# Chess\nA chess engine.");
        files.insert(MANIFEST_PATH, "[package]\nname = \"chess\"");
        let wire = files.to_wire();
        augmenter.record_project(&files, &wire).await;

        let upserts = store.upserts.lock().unwrap();
        assert_eq!(upserts.len(), 1);
        assert_eq!(upserts[0].0, PROJECT_COLLECTION);
        assert_eq!(
            upserts[0].1.get("description").and_then(|v| v.as_str()),
            Some("# Chess\nA chess engine.")
        );
        assert!(upserts[0]
            .1
            .get("example")
            .and_then(|v| v.as_str())
            .unwrap()
            .contains("[filename: README.md]"));
    }

    #[tokio::test]
    async fn test_record_fix_stores_diagnostic_and_solution() {
        let store = Arc::new(ScriptedStore::with_results(Vec::new()));
        let augmenter = RetrievalAugmenter::new(Arc::new(FixedEmbedder), store.clone());

        let context = crate::diagnostics::ErrorContextExtractor::extract(
            "error[E0308]: mismatched types\n --> src/main.rs:3:5",
        );
        let mut fixed = FileSet::new();
        fixed.insert("src/main.rs", "fn main() {}");
        augmenter.record_fix(&context, &fixed).await;

        let upserts = store.upserts.lock().unwrap();
        assert_eq!(upserts.len(), 1);
        assert_eq!(upserts[0].0, ERROR_COLLECTION);
        assert!(upserts[0]
            .1
            .get("error")
            .and_then(|v| v.as_str())
            .unwrap()
            .contains("error[E0308]"));
        assert!(upserts[0]
            .1
            .get("solution")
            .and_then(|v| v.as_str())
            .unwrap()
            .contains("[filename: src/main.rs]"));
    }
}
