//! Session state for one generation request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::files::FileSet;

/// Lifecycle status of a generation session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Waiting for the initial model response.
    Generating,
    /// A compile attempt is in flight.
    Compiling,
    /// Building a repair prompt and merging the patch.
    Fixing,
    /// The project built successfully.
    Completed,
    /// The attempt budget is exhausted or the session was aborted.
    Failed,
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Record of a single compiler invocation inside the fix loop.
///
/// Immutable once recorded; appended to the session's attempt history in
/// order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileAttempt {
    /// 1-based attempt index.
    pub index: u32,
    /// Whether the build succeeded.
    pub success: bool,
    /// Combined compiler output, verbatim.
    pub diagnostic: String,
    /// When the attempt finished.
    #[serde(rename = "finishedAt")]
    pub finished_at: DateTime<Utc>,
}

/// One generation request from description to terminal status.
///
/// Owned exclusively by the orchestrator invocation handling the request;
/// serializable so callers can persist it (the CLI writes it next to the
/// generated project as `status.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSession {
    /// Unique session ID (UUID).
    pub id: String,
    /// The natural-language project description.
    pub description: String,
    /// Optional extra requirements.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirements: Option<String>,
    /// Current status.
    pub status: SessionStatus,
    /// Ordered compile attempt history.
    pub attempts: Vec<CompileAttempt>,
    /// The current file set (reflects the last merged patch).
    pub files: FileSet,
    /// Build output of the successful attempt, when completed.
    #[serde(rename = "buildOutput", skip_serializing_if = "Option::is_none")]
    pub build_output: Option<String>,
    /// Output of the post-build run step, when attempted.
    #[serde(rename = "runOutput", skip_serializing_if = "Option::is_none")]
    pub run_output: Option<String>,
    /// Human-readable terminal message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "finishedAt", skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl GenerationSession {
    pub fn new(description: impl Into<String>, requirements: Option<&str>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            description: description.into(),
            requirements: requirements.map(|r| r.to_string()),
            status: SessionStatus::Generating,
            attempts: Vec::new(),
            files: FileSet::new(),
            build_output: None,
            run_output: None,
            message: None,
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Append a compile attempt to the history.
    pub fn record_attempt(&mut self, success: bool, diagnostic: impl Into<String>) {
        let index = self.attempts.len() as u32 + 1;
        self.attempts.push(CompileAttempt {
            index,
            success,
            diagnostic: diagnostic.into(),
            finished_at: Utc::now(),
        });
    }

    /// The diagnostic of the most recent attempt, if any.
    pub fn last_diagnostic(&self) -> Option<&str> {
        self.attempts.last().map(|a| a.diagnostic.as_str())
    }

    /// The diagnostic of the most recent failing attempt, if any.
    pub fn last_failure_diagnostic(&self) -> Option<&str> {
        self.attempts
            .iter()
            .rev()
            .find(|a| !a.success)
            .map(|a| a.diagnostic.as_str())
    }

    /// Transition to the Completed terminal state.
    pub fn complete(&mut self, message: impl Into<String>) {
        self.status = SessionStatus::Completed;
        self.message = Some(message.into());
    }

    /// Transition to the Failed terminal state.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = SessionStatus::Failed;
        self.message = Some(message.into());
    }
}
