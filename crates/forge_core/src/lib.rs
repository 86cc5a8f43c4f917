//! # forge_core - Generate/Compile/Repair loop for RustForge
//!
//! This crate holds the core of RustForge: turning a natural-language project
//! description into a compilable Cargo project by prompting a generative
//! model, parsing its free-form output into a file set, building it, and
//! repairing it in a bounded fix loop driven by compiler diagnostics and
//! retrieved past fixes.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────────┐     ┌──────────────────┐
//! │  ResponseParser  │────▶│     FileSet      │────▶│ ProjectCompiler  │
//! └──────────────────┘     └──────────────────┘     └────────┬─────────┘
//!          ▲                                                 │ diagnostics
//!          │ patch                                           ▼
//! ┌────────┴─────────┐     ┌──────────────────┐     ┌──────────────────┐
//! │ GenerationClient │◀────│  PromptBuilder   │◀────│ ErrorContext +   │
//! └──────────────────┘     └──────────────────┘     │ Retrieval        │
//!                                                   └──────────────────┘
//! ```
//!
//! The [`orchestrator::FixLoopOrchestrator`] drives the cycle. External
//! collaborators (model, compiler toolchain, vector store) are injected via
//! the traits in [`traits`], so the core has no network or subprocess code
//! of its own.

pub mod diagnostics;
pub mod error;
pub mod files;
pub mod orchestrator;
pub mod parser;
pub mod prompt;
pub mod retrieval;
pub mod session;
pub mod traits;

pub use diagnostics::{ErrorContext, ErrorContextExtractor};
pub use error::{CoreError, CoreResult};
pub use files::{FileSet, ProjectFile, DEFAULT_ENTRY_POINT, DEFAULT_MANIFEST};
pub use orchestrator::{CancelHandle, FixLoopOrchestrator, OrchestratorConfig};
pub use parser::ResponseParser;
pub use prompt::PromptBuilder;
pub use retrieval::{
    ExampleCategory, RetrievalAugmenter, RetrievalExample, ERROR_COLLECTION, PROJECT_COLLECTION,
};
pub use session::{CompileAttempt, GenerationSession, SessionStatus};
pub use traits::{BuildOutcome, GenerationClient, ProjectCompiler, VectorStore};
