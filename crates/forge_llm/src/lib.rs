//! # forge_llm
//!
//! Generation-model collaborator for RustForge: an OpenAI-compatible chat
//! completion and embeddings client (LlamaEdge, OpenAI, or any compatible
//! endpoint) implementing [`forge_core::GenerationClient`].
//!
//! The client degrades gracefully: exhausted retries yield a deterministic
//! fallback project/fix template, and embedding failures yield hash-derived
//! pseudo-vectors of the configured dimensionality, so the fix loop and
//! retrieval keep working without a live backend.

pub mod client;
pub mod config;
pub mod error;
pub mod fallback;

pub use client::LlamaClient;
pub use config::LlmConfig;
pub use error::{LlmError, LlmResult};
pub use fallback::{fallback_completion, pseudo_embedding, FALLBACK_FIX, FALLBACK_PROJECT};
