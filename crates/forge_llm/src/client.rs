//! OpenAI-compatible chat completion and embeddings client.
//!
//! Works against LlamaEdge or any other OpenAI-compatible endpoint. Failed
//! calls are retried with exponential backoff; when retries are exhausted
//! the client degrades to deterministic fallbacks instead of erroring, so
//! the fix loop never stalls on an unreachable backend.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use forge_core::{CoreResult, GenerationClient};

use crate::config::LlmConfig;
use crate::error::{LlmError, LlmResult};
use crate::fallback::{fallback_completion, pseudo_embedding};

const MAX_RETRIES: u32 = 3;

/// Client for an OpenAI-compatible model backend.
pub struct LlamaClient {
    config: LlmConfig,
    client: reqwest::Client,
}

impl LlamaClient {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Create a client from environment variables.
    pub fn from_env() -> Self {
        Self::new(LlmConfig::from_env())
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    async fn complete_inner(
        &self,
        prompt: &str,
        system: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> LlmResult<String> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            max_tokens,
            temperature,
        };

        let mut last_error = None;
        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s
                let delay = std::time::Duration::from_secs(1 << attempt);
                tokio::time::sleep(delay).await;
            }

            let response = match self.post(&url, &request).send().await {
                Ok(resp) => resp,
                Err(e) => {
                    last_error = Some(LlmError::Network(e.to_string()));
                    continue;
                }
            };

            let status = response.status();
            // Retry on server errors (5xx) and rate limits (429)
            if status.is_server_error() || status.as_u16() == 429 {
                let body = response.text().await.unwrap_or_default();
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    body,
                });
            }

            let result: ChatResponse = response
                .json()
                .await
                .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

            return result
                .choices
                .into_iter()
                .next()
                .map(|c| c.message.content)
                .ok_or_else(|| LlmError::InvalidResponse("no choices in response".to_string()));
        }

        Err(last_error.unwrap_or(LlmError::RetriesExhausted))
    }

    async fn embed_inner(&self, texts: &[String]) -> LlmResult<Vec<Vec<f32>>> {
        let url = format!("{}/embeddings", self.config.base_url);
        let request = EmbeddingsRequest {
            model: self.config.embedding_model.clone(),
            input: texts.to_vec(),
        };

        let response = self
            .post(&url, &request)
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let result: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        if result.data.len() != texts.len() {
            return Err(LlmError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                result.data.len()
            )));
        }
        Ok(result.data.into_iter().map(|d| d.embedding).collect())
    }

    fn post<T: Serialize>(&self, url: &str, body: &T) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .json(body);
        if let Some(key) = &self.config.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }
        builder
    }
}

#[async_trait]
impl GenerationClient for LlamaClient {
    async fn complete(
        &self,
        prompt: &str,
        system: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> CoreResult<String> {
        match self.complete_inner(prompt, system, max_tokens, temperature).await {
            Ok(content) => {
                debug!(chars = content.len(), "completion received");
                Ok(content)
            }
            Err(e) => {
                warn!("completion failed, using deterministic fallback: {}", e);
                Ok(fallback_completion(prompt).to_string())
            }
        }
    }

    async fn embed(&self, texts: &[String]) -> CoreResult<Vec<Vec<f32>>> {
        match self.embed_inner(texts).await {
            Ok(vectors) => Ok(vectors),
            Err(e) => {
                warn!("embedding failed, using pseudo-embeddings: {}", e);
                Ok(texts
                    .iter()
                    .map(|t| pseudo_embedding(t, self.config.embedding_dimension))
                    .collect())
            }
        }
    }
}

// OpenAI-compatible API types
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}
