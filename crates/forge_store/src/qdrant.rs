//! Qdrant REST client implementing the [`VectorStore`] contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use forge_core::{CoreError, CoreResult, VectorStore};

use crate::error::{StoreError, StoreResult};

/// Client for a Qdrant instance over its REST API.
pub struct QdrantStore {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl QdrantStore {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key,
            client: reqwest::Client::new(),
        }
    }

    /// Create a client from environment variables:
    ///
    /// - `FORGE_QDRANT_URL` — instance URL (default `http://localhost:6333`)
    /// - `FORGE_QDRANT_API_KEY` — optional cloud API key
    pub fn from_env() -> Self {
        let url = std::env::var("FORGE_QDRANT_URL")
            .unwrap_or_else(|_| "http://localhost:6333".to_string());
        let api_key = std::env::var("FORGE_QDRANT_API_KEY")
            .ok()
            .filter(|k| !k.is_empty());
        Self::new(url, api_key)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        if let Some(key) = &self.api_key {
            builder = builder.header("api-key", key);
        }
        builder
    }

    async fn create_collection_inner(&self, name: &str, dimension: usize) -> StoreResult<()> {
        let body = serde_json::json!({
            "vectors": { "size": dimension, "distance": "Cosine" }
        });
        let response = self
            .request(reqwest::Method::PUT, &format!("/collections/{}", name))
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!(collection = name, "collection ready");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        // An existing collection is not an error.
        if status.as_u16() == 409 || body.contains("already exists") {
            debug!(collection = name, "collection already exists");
            return Ok(());
        }
        Err(StoreError::Api {
            status: status.as_u16(),
            body,
        })
    }

    async fn upsert_inner(
        &self,
        collection: &str,
        id: &str,
        vector: Vec<f32>,
        payload: serde_json::Value,
    ) -> StoreResult<()> {
        let body = UpsertRequest {
            points: vec![Point {
                id: id.to_string(),
                vector,
                payload,
            }],
        };
        let response = self
            .request(
                reqwest::Method::PUT,
                &format!("/collections/{}/points", collection),
            )
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        check_status(response).await.map(|_| ())
    }

    async fn search_inner(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: usize,
    ) -> StoreResult<Vec<serde_json::Value>> {
        let body = SearchRequest {
            vector,
            limit,
            with_payload: true,
        };
        let response = self
            .request(
                reqwest::Method::POST,
                &format!("/collections/{}/points/search", collection),
            )
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let response = check_status(response).await?;
        let result: SearchResponse = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;
        Ok(result.result.into_iter().map(|hit| hit.payload).collect())
    }

    async fn count_inner(&self, collection: &str) -> StoreResult<u64> {
        let response = self
            .request(
                reqwest::Method::POST,
                &format!("/collections/{}/points/count", collection),
            )
            .json(&serde_json::json!({ "exact": true }))
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let response = check_status(response).await?;
        let result: CountResponse = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;
        Ok(result.result.count)
    }
}

async fn check_status(response: reqwest::Response) -> StoreResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Api {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn create_collection(&self, name: &str, dimension: usize) -> CoreResult<()> {
        self.create_collection_inner(name, dimension)
            .await
            .map_err(|e| CoreError::Store(e.to_string()))
    }

    async fn upsert(
        &self,
        collection: &str,
        id: &str,
        vector: Vec<f32>,
        payload: serde_json::Value,
    ) -> CoreResult<()> {
        self.upsert_inner(collection, id, vector, payload)
            .await
            .map_err(|e| CoreError::Store(e.to_string()))
    }

    async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: usize,
    ) -> CoreResult<Vec<serde_json::Value>> {
        self.search_inner(collection, vector, limit)
            .await
            .map_err(|e| CoreError::Store(e.to_string()))
    }

    async fn count(&self, collection: &str) -> CoreResult<u64> {
        self.count_inner(collection)
            .await
            .map_err(|e| CoreError::Store(e.to_string()))
    }
}

// Qdrant REST API types
#[derive(Debug, Serialize)]
struct UpsertRequest {
    points: Vec<Point>,
}

#[derive(Debug, Serialize)]
struct Point {
    id: String,
    vector: Vec<f32>,
    payload: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct SearchRequest {
    vector: Vec<f32>,
    limit: usize,
    with_payload: bool,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    result: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(default)]
    payload: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    result: CountResult,
}

#[derive(Debug, Deserialize)]
struct CountResult {
    count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_env_defaults_to_local_instance() {
        std::env::remove_var("FORGE_QDRANT_URL");
        std::env::remove_var("FORGE_QDRANT_API_KEY");
        let store = QdrantStore::from_env();
        assert_eq!(store.base_url, "http://localhost:6333");
        assert!(store.api_key.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_instance_surfaces_store_error() {
        let store = QdrantStore::new("http://127.0.0.1:9", None);
        let result = store.count("project_examples").await;
        assert!(matches!(result, Err(CoreError::Store(_))));
    }

    #[test]
    fn test_search_response_deserializes_payloads() {
        let json = r#"{"result": [{"id": "x", "score": 0.9, "payload": {"error": "e", "solution": "s"}}]}"#;
        let response: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.result.len(), 1);
        assert_eq!(
            response.result[0].payload.get("solution").and_then(|v| v.as_str()),
            Some("s")
        );
    }
}
