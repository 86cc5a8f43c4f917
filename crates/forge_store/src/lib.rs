//! # forge_store
//!
//! Vector store collaborator for RustForge, backed by Qdrant's REST API.
//! Implements [`forge_core::VectorStore`] so the core never depends on the
//! database client directly.

pub mod error;
pub mod qdrant;

pub use error::{StoreError, StoreResult};
pub use qdrant::QdrantStore;
