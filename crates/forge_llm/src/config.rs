//! Client configuration.

/// Configuration for the OpenAI-compatible model backend.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Base URL of the API, e.g. `http://localhost:8080/v1`.
    pub base_url: String,
    /// Chat completion model name.
    pub model: String,
    /// Embedding model name.
    pub embedding_model: String,
    /// Optional bearer token.
    pub api_key: Option<String>,
    /// Dimensionality of embeddings (also used for degraded-mode vectors).
    pub embedding_dimension: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/v1".to_string(),
            model: "Qwen2.5-Coder-3B-Instruct".to_string(),
            embedding_model: "text-embedding-ada-002".to_string(),
            api_key: None,
            embedding_dimension: 1536,
        }
    }
}

impl LlmConfig {
    /// Build a configuration from environment variables, falling back to the
    /// local-backend defaults:
    ///
    /// - `FORGE_LLM_URL` — API base URL
    /// - `FORGE_LLM_MODEL` — chat model
    /// - `FORGE_EMBEDDING_MODEL` — embedding model
    /// - `FORGE_API_KEY` — bearer token
    /// - `FORGE_EMBEDDING_DIMENSION` — vector size
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("FORGE_LLM_URL").unwrap_or(defaults.base_url),
            model: std::env::var("FORGE_LLM_MODEL").unwrap_or(defaults.model),
            embedding_model: std::env::var("FORGE_EMBEDDING_MODEL")
                .unwrap_or(defaults.embedding_model),
            api_key: std::env::var("FORGE_API_KEY").ok().filter(|k| !k.is_empty()),
            embedding_dimension: std::env::var("FORGE_EMBEDDING_DIMENSION")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.embedding_dimension),
        }
    }
}
