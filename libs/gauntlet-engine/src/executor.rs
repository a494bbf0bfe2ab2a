/// Judge - high-level orchestration
///
/// **Responsibility:**
/// Tie the Workspace Manager, Compiler Invoker and Execution Supervisor
/// together for one request, and bound how many requests run at once.
///
/// **Architecture:**
/// 1. Acquire a workspace (unique source/artifact paths)
/// 2. Write the (optionally instrumented) source and compile it once
/// 3. Run the artifact under the supervisor, once per input
/// 4. Release the workspace on every path, including errors and panics
///
/// Scoring lives in `evaluator`, suite iteration in `runner`.
use crate::compiler::{CompileOutcome, Compiler};
use crate::error::{EngineError, Result};
use crate::instrument::{self, TLE_EXIT_CODE};
use crate::supervisor::{Supervisor, SupervisorStats};
use crate::workspace::{Workspace, WorkspaceManager};
use gauntlet_common::types::{ExecutionRequest, ExecutionResult};
use gauntlet_common::Config;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Semaphore, SemaphorePermit};
use tracing::{info, warn};

/// A compiled (or rejected) submission, owning its workspace.
///
/// Dropping it deletes the source and artifact.
#[derive(Debug)]
pub struct Submission {
    workspace: Workspace,
    outcome: CompileOutcome,
}

impl Submission {
    pub fn outcome(&self) -> &CompileOutcome {
        &self.outcome
    }
}

pub struct Judge {
    workspaces: WorkspaceManager,
    compiler: Compiler,
    supervisor: Supervisor,
    instrument: bool,
    permits: Semaphore,
    capacity: usize,
}

impl Judge {
    pub fn new(
        workspaces: WorkspaceManager,
        compiler: Compiler,
        supervisor: Supervisor,
        instrument: bool,
        max_parallel_jobs: usize,
    ) -> Self {
        let capacity = max_parallel_jobs.max(1);
        Self {
            workspaces,
            compiler,
            supervisor,
            instrument,
            permits: Semaphore::new(capacity),
            capacity,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let workspaces = WorkspaceManager::new(&config.workspace_dir)?;
        let compiler = Compiler::new(
            config.compiler.clone(),
            config.compiler_flags.clone(),
            config.compile_timeout(),
        );
        let supervisor = if config.instrument {
            Supervisor::instrumented(TLE_EXIT_CODE, config.instrument_grace())
        } else {
            Supervisor::new()
        };

        info!(
            compiler = %config.compiler,
            workspace_dir = %config.workspace_dir.display(),
            instrument = config.instrument,
            max_parallel_jobs = config.max_parallel_jobs,
            "Judge configured"
        );

        Ok(Self::new(
            workspaces,
            compiler,
            supervisor,
            config.instrument,
            config.max_parallel_jobs,
        ))
    }

    pub fn supervisor_stats(&self) -> Arc<SupervisorStats> {
        self.supervisor.stats()
    }

    /// Submissions currently holding a slot
    pub fn in_flight(&self) -> usize {
        self.capacity.saturating_sub(self.permits.available_permits())
    }

    /// Wait for a free execution slot
    pub(crate) async fn admit(&self) -> Result<SemaphorePermit<'_>> {
        self.permits.acquire().await.map_err(|_| EngineError::Closed)
    }

    /// Stop admitting new submissions. In-flight work finishes normally.
    pub fn close(&self) {
        self.permits.close();
    }

    /// Compile and run a single request
    #[tracing::instrument(skip_all, fields(source_size = request.source_code().len(), time_limit_ms = request.time_limit_ms()))]
    pub async fn execute(&self, request: &ExecutionRequest) -> Result<ExecutionResult> {
        if request.source_code().trim().is_empty() {
            return Err(EngineError::InvalidInput("Code is required".to_string()));
        }

        let _permit = self.admit().await?;
        let submission = self.compile(request.source_code(), request.time_limit()).await?;
        let result = self.run(&submission, request.input(), request.time_limit()).await;
        self.release(submission);

        let result = result?;
        info!(verdict = result.label(), "Execution finished");
        Ok(result)
    }

    /// Allocate a workspace, write the source and compile it.
    ///
    /// The workspace travels inside the returned `Submission`; on error it is
    /// dropped (and cleaned) before this returns.
    pub(crate) async fn compile(&self, source_code: &str, time_limit: Duration) -> Result<Submission> {
        let workspace = self.workspaces.acquire();

        let source = if self.instrument {
            if !instrument::has_entry_point(source_code) {
                warn!(workspace = %workspace.id(), "No main() found to instrument");
            }
            instrument::instrument(source_code, time_limit)
        } else {
            source_code.to_string()
        };
        workspace.write_source(&source).await?;

        let outcome = self
            .compiler
            .compile(workspace.source_path(), workspace.artifact_path())
            .await?;

        Ok(Submission { workspace, outcome })
    }

    /// Execute a compiled submission against one input. A rejected
    /// submission is reported as `CompileFailure` without spawning anything.
    pub(crate) async fn run(&self, submission: &Submission, input: &str, time_limit: Duration) -> Result<ExecutionResult> {
        match &submission.outcome {
            CompileOutcome::Failed(diagnostics) => Ok(ExecutionResult::CompileFailure {
                diagnostics: diagnostics.clone(),
            }),
            CompileOutcome::Compiled(artifact) => self.supervisor.run(artifact, input, time_limit).await,
        }
    }

    pub(crate) fn release(&self, submission: Submission) {
        if let Err(e) = self.workspaces.release(submission.workspace) {
            warn!(error = %e, "Workspace cleanup incomplete");
        }
    }
}
