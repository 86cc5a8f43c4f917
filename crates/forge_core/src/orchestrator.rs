//! The bounded generate/compile/repair loop.
//!
//! One orchestrator invocation owns one [`GenerationSession`] from the
//! initial model call to a terminal status. Collaborators are injected
//! handles; each call to them is wrapped in a per-call timeout so a hung
//! backend cannot stall the session, and a timeout is treated the same as a
//! collaborator failure.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::diagnostics::ErrorContextExtractor;
use crate::error::CoreResult;
use crate::files::FileSet;
use crate::parser::ResponseParser;
use crate::prompt::PromptBuilder;
use crate::retrieval::{ExampleCategory, RetrievalAugmenter, RetrievalExample};
use crate::session::{GenerationSession, SessionStatus};
use crate::traits::{BuildOutcome, GenerationClient, ProjectCompiler, VectorStore};

/// Tunables for one orchestrator instance.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Timeout for a single model completion.
    pub generation_timeout: Duration,
    /// Timeout for a single build invocation.
    pub build_timeout: Duration,
    /// Timeout for the post-build run step.
    pub run_timeout: Duration,
    /// Token budget per completion.
    pub max_tokens: u32,
    /// Sampling temperature for initial generation.
    pub temperature: f32,
    /// Lower temperature for repair prompts.
    pub fix_temperature: f32,
    /// Dimensionality of the example-store vectors.
    pub embedding_dimension: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            generation_timeout: Duration::from_secs(120),
            build_timeout: Duration::from_secs(300),
            run_timeout: Duration::from_secs(60),
            max_tokens: 4000,
            temperature: 0.7,
            fix_temperature: 0.2,
            embedding_dimension: 1536,
        }
    }
}

/// Cooperative cancellation handle for a running session.
///
/// The orchestrator finishes the compile attempt in flight, then checks the
/// flag before scheduling another fix round.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Drives the bounded generate → parse → compile → repair cycle.
pub struct FixLoopOrchestrator {
    generator: Arc<dyn GenerationClient>,
    compiler: Arc<dyn ProjectCompiler>,
    retrieval: RetrievalAugmenter,
    parser: ResponseParser,
    config: OrchestratorConfig,
    cancel: CancelHandle,
}

impl FixLoopOrchestrator {
    pub fn new(
        generator: Arc<dyn GenerationClient>,
        compiler: Arc<dyn ProjectCompiler>,
        store: Arc<dyn VectorStore>,
        config: OrchestratorConfig,
    ) -> Self {
        let retrieval = RetrievalAugmenter::new(generator.clone(), store);
        Self {
            generator,
            compiler,
            retrieval,
            parser: ResponseParser::new(),
            config,
            cancel: CancelHandle::new(),
        }
    }

    /// Handle for cooperative cancellation of this orchestrator's sessions.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Create the example collections in the store. Failures are non-fatal.
    pub async fn ensure_collections(&self) {
        self.retrieval
            .ensure_collections(self.config.embedding_dimension)
            .await;
    }

    /// Run a full session: generate a project from the description, then
    /// compile and repair it within the attempt budget.
    ///
    /// Never fails: unexpected internal faults are converted to a session
    /// with `Failed` status and a descriptive message.
    pub async fn run(
        &self,
        description: &str,
        requirements: Option<&str>,
        max_attempts: u32,
    ) -> GenerationSession {
        let max_attempts = max_attempts.max(1);
        let mut session = GenerationSession::new(description, requirements);
        info!(session_id = %session.id, max_attempts, "starting generation session");

        if let Err(e) = self.generate_and_fix(&mut session, max_attempts).await {
            warn!(session_id = %session.id, "session aborted by internal error: {}", e);
            session.fail(format!("internal error: {}", e));
        }
        session.finished_at = Some(Utc::now());
        info!(
            session_id = %session.id,
            status = ?session.status,
            attempts = session.attempts.len(),
            "session finished"
        );
        session
    }

    /// Run the compile/repair loop over an existing wire-format blob instead
    /// of generating a fresh project.
    pub async fn repair(
        &self,
        source: &str,
        description: &str,
        max_attempts: u32,
    ) -> GenerationSession {
        let max_attempts = max_attempts.max(1);
        let mut session = GenerationSession::new(description, None);
        info!(session_id = %session.id, max_attempts, "starting repair session");

        let mut files = self.parser.parse(source);
        files.ensure_project_skeleton();
        session.files = files;

        let reference = self.project_reference(description).await;
        if let Err(e) = self.fix_loop(&mut session, reference, max_attempts).await {
            warn!(session_id = %session.id, "session aborted by internal error: {}", e);
            session.fail(format!("internal error: {}", e));
        }
        session.finished_at = Some(Utc::now());
        session
    }

    async fn generate_and_fix(
        &self,
        session: &mut GenerationSession,
        max_attempts: u32,
    ) -> CoreResult<()> {
        let reference = self.project_reference(&session.description).await;

        let prompt = PromptBuilder::generation_prompt(
            &session.description,
            session.requirements.as_deref(),
            reference.as_ref(),
        );
        let response = self
            .complete_with_timeout(
                &prompt,
                PromptBuilder::generation_system_prompt(),
                self.config.temperature,
            )
            .await
            .unwrap_or_default();

        let mut files = self.parser.parse(&response);
        files.ensure_project_skeleton();
        session.files = files;
        debug!(session_id = %session.id, files = session.files.len(), "initial file set ready");

        self.fix_loop(session, reference, max_attempts).await
    }

    /// The bounded loop: exactly one compile invocation per iteration, at
    /// most `max_attempts` iterations, stopping at the first success.
    async fn fix_loop(
        &self,
        session: &mut GenerationSession,
        reference: Option<RetrievalExample>,
        max_attempts: u32,
    ) -> CoreResult<()> {
        let workdir = tempfile::tempdir()?;
        session.files.write_to(workdir.path())?;

        for attempt in 1..=max_attempts {
            session.status = SessionStatus::Compiling;
            let outcome = self.build_with_timeout(workdir.path()).await;
            session.record_attempt(outcome.success, outcome.output.clone());
            debug!(
                session_id = %session.id,
                attempt,
                success = outcome.success,
                "compile attempt recorded"
            );

            if outcome.success {
                self.finalize_success(session, workdir.path(), outcome.output)
                    .await;
                return Ok(());
            }

            if attempt == max_attempts {
                break;
            }
            if self.cancel.is_cancelled() {
                session.fail("cancelled before next fix attempt");
                return Ok(());
            }

            session.status = SessionStatus::Fixing;
            let context = ErrorContextExtractor::extract(&outcome.output);
            let examples = self
                .retrieval
                .find_similar(&context.full_diagnostic, ExampleCategory::Error, 3)
                .await;
            let prompt = PromptBuilder::fix_prompt(
                &session.description,
                &context,
                &examples,
                reference.as_ref(),
            );

            match self
                .complete_with_timeout(
                    &prompt,
                    PromptBuilder::fix_system_prompt(),
                    self.config.fix_temperature,
                )
                .await
            {
                Some(response) => {
                    let patch = self.parser.parse(&response);
                    debug!(session_id = %session.id, patched = patch.len(), "merging fix patch");
                    session.files.merge(patch);
                    session.files.write_to(workdir.path())?;
                }
                None => {
                    warn!(
                        session_id = %session.id,
                        "generation unavailable for fix, recompiling unchanged project"
                    );
                }
            }
        }

        session.fail(format!(
            "attempt budget exhausted after {} attempts",
            session.attempts.len()
        ));
        Ok(())
    }

    /// Success path: run the binary as a secondary signal and store the
    /// project (and fix, when one happened) for future retrieval.
    async fn finalize_success(
        &self,
        session: &mut GenerationSession,
        project_dir: &Path,
        build_output: String,
    ) {
        session.build_output = Some(if build_output.is_empty() {
            "Build successful".to_string()
        } else {
            build_output
        });

        // A failing run never demotes a completed session.
        let run = self.run_with_timeout(project_dir).await;
        session.run_output = Some(if run.success {
            run.output
        } else {
            format!("Failed to run project: {}", run.output)
        });

        let wire = session.files.to_wire();
        self.retrieval.record_project(&session.files, &wire).await;
        if let Some(diagnostic) = session.last_failure_diagnostic() {
            let context = ErrorContextExtractor::extract(diagnostic);
            self.retrieval.record_fix(&context, &session.files).await;
        }

        session.complete("project generated successfully");
    }

    async fn project_reference(&self, description: &str) -> Option<RetrievalExample> {
        self.retrieval
            .find_similar(description, ExampleCategory::Project, 1)
            .await
            .into_iter()
            .next()
    }

    /// Completion with a per-call timeout. Timeout and collaborator errors
    /// both degrade to `None`.
    async fn complete_with_timeout(
        &self,
        prompt: &str,
        system: &str,
        temperature: f32,
    ) -> Option<String> {
        let call = self.generator.complete(prompt, system, self.config.max_tokens, temperature);
        match tokio::time::timeout(self.config.generation_timeout, call).await {
            Ok(Ok(response)) => Some(response),
            Ok(Err(e)) => {
                warn!("generation collaborator failed: {}", e);
                None
            }
            Err(_) => {
                warn!(
                    "generation timed out after {}s",
                    self.config.generation_timeout.as_secs()
                );
                None
            }
        }
    }

    /// Build with a per-call timeout. Timeouts and invocation errors become
    /// failed outcomes whose diagnostic describes the fault.
    async fn build_with_timeout(&self, project_dir: &Path) -> BuildOutcome {
        match tokio::time::timeout(self.config.build_timeout, self.compiler.build(project_dir))
            .await
        {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => BuildOutcome::failure(format!("compiler invocation failed: {}", e)),
            Err(_) => BuildOutcome::failure(format!(
                "build timed out after {} seconds",
                self.config.build_timeout.as_secs()
            )),
        }
    }

    async fn run_with_timeout(&self, project_dir: &Path) -> BuildOutcome {
        match tokio::time::timeout(self.config.run_timeout, self.compiler.run(project_dir)).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => BuildOutcome::failure(format!("run invocation failed: {}", e)),
            Err(_) => BuildOutcome::failure(format!(
                "run timed out after {} seconds",
                self.config.run_timeout.as_secs()
            )),
        }
    }
}
