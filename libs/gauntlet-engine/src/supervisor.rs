/// Execution Supervisor - runs one compiled artifact under a hard deadline
///
/// **Lifecycle:**
/// `Spawned -> Running -> {Completed, Killed, SpawnFailed}`
///
/// - The child is placed in its own process group so the whole tree can be
///   signalled at once.
/// - Input is written from a separate task and stdin is closed afterwards;
///   stdout/stderr are drained concurrently so a chatty program can never
///   deadlock against a blocked input write.
/// - The deadline starts at spawn time. Natural exit and deadline expiry
///   race through a single `select!`; whichever resolves first is the only
///   transition taken, and a tie goes to the natural exit.
/// - On expiry the process group receives SIGKILL, the leader is reaped and
///   partial output is discarded.
/// - Dropping the `run` future before it settles kills the group as well.
use crate::error::{EngineError, Result};
use gauntlet_common::types::ExecutionResult;
use nix::errno::Errno;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use std::future::Future;
use std::io;
use std::os::unix::process::ExitStatusExt;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{ChildStdin, Command};
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Exit code reported when the OS refuses to start the artifact
pub const SPAWN_FAILED_EXIT_CODE: i32 = -1;

/// How long output pipes may stay open after the child has exited
const OUTPUT_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Terminal transition of a supervised run
#[derive(Debug, PartialEq, Eq)]
pub enum Termination<T> {
    /// The child finished before the deadline
    Completed(T),
    /// The deadline elapsed first
    Killed,
}

/// Race `exit` against `deadline`. Exactly one side wins; when both are ready
/// in the same poll, completion is preferred.
pub async fn race_deadline<F>(exit: F, deadline: Instant) -> Termination<F::Output>
where
    F: Future,
{
    tokio::select! {
        biased;
        output = exit => Termination::Completed(output),
        _ = tokio::time::sleep_until(deadline) => Termination::Killed,
    }
}

/// Send SIGKILL to every process in the group led by `pid`.
/// An empty group is not an error.
pub(crate) fn kill_process_group(pid: u32) {
    match killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => warn!(pgid = pid, error = %e, "Failed to signal process group"),
    }
}

/// Owns a running process group until the supervisor has settled it.
///
/// If the `run` future is dropped midway (a client disconnect cancels the
/// handler), the whole group is killed and the I/O tasks are stopped.
/// `kill_on_drop` alone only reaches the group leader.
struct GroupGuard {
    pgid: Option<u32>,
    tasks: Vec<AbortHandle>,
    settled: bool,
}

impl GroupGuard {
    fn new(pgid: Option<u32>) -> Self {
        Self {
            pgid,
            tasks: Vec::new(),
            settled: false,
        }
    }

    fn track<T>(&mut self, task: &JoinHandle<T>) {
        self.tasks.push(task.abort_handle());
    }

    /// Kill whatever is left of the group; the caller now owns the I/O tasks
    fn settle(&mut self) {
        if let Some(pgid) = self.pgid {
            kill_process_group(pgid);
        }
        self.settled = true;
    }
}

impl Drop for GroupGuard {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        if let Some(pgid) = self.pgid {
            warn!(pgid, "Run cancelled; killing process group");
            kill_process_group(pgid);
        }
        for task in &self.tasks {
            task.abort();
        }
    }
}

#[derive(Debug, Default)]
pub struct SupervisorStats {
    spawned: AtomicU64,
    killed: AtomicU64,
}

impl SupervisorStats {
    /// Processes successfully started
    pub fn spawned(&self) -> u64 {
        self.spawned.load(Ordering::Relaxed)
    }

    /// Processes terminated on deadline
    pub fn killed(&self) -> u64 {
        self.killed.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone)]
pub struct Supervisor {
    /// Exit code the in-process harness uses for an exceeded budget
    tle_exit_code: Option<i32>,
    /// Extra slack on the external deadline while the harness is active
    grace: Duration,
    stats: Arc<SupervisorStats>,
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl Supervisor {
    /// Supervisor that relies only on its external deadline
    pub fn new() -> Self {
        Self {
            tle_exit_code: None,
            grace: Duration::ZERO,
            stats: Arc::new(SupervisorStats::default()),
        }
    }

    /// Supervisor for artifacts built with the timing harness. The external
    /// kill still fires, `grace` after the budget.
    pub fn instrumented(tle_exit_code: i32, grace: Duration) -> Self {
        Self {
            tle_exit_code: Some(tle_exit_code),
            grace,
            stats: Arc::new(SupervisorStats::default()),
        }
    }

    pub fn stats(&self) -> Arc<SupervisorStats> {
        Arc::clone(&self.stats)
    }

    /// Run `artifact` with `input` on stdin, bounded by `time_limit`.
    ///
    /// Returns `Err` only for host-side problems (resource exhaustion when
    /// spawning, failure to reap). Everything the program does is reported
    /// as an `ExecutionResult`.
    pub async fn run(&self, artifact: &Path, input: &str, time_limit: Duration) -> Result<ExecutionResult> {
        let program = artifact.display().to_string();

        let mut command = Command::new(artifact);
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .process_group(0)
            .kill_on_drop(true);

        // Spawned
        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) if is_program_fault(&e) => {
                warn!(program = %program, error = %e, "Spawn failed");
                return Ok(ExecutionResult::RuntimeFailure {
                    stderr: e.to_string(),
                    exit_code: SPAWN_FAILED_EXIT_CODE,
                });
            }
            Err(source) => return Err(EngineError::Spawn { program, source }),
        };
        let deadline = Instant::now() + time_limit + self.grace_period();
        self.stats.spawned.fetch_add(1, Ordering::Relaxed);

        let pid = child.id();
        debug!(pid = ?pid, time_limit_ms = time_limit.as_millis() as u64, "Process spawned");

        let mut guard = GroupGuard::new(pid);
        let feeder = tokio::spawn(feed_input(child.stdin.take(), input.as_bytes().to_vec()));
        let stdout_reader = tokio::spawn(drain(child.stdout.take()));
        let stderr_reader = tokio::spawn(drain(child.stderr.take()));
        guard.track(&feeder);
        guard.track(&stdout_reader);
        guard.track(&stderr_reader);

        // Running
        let termination = race_deadline(child.wait(), deadline).await;

        // Grandchildren must not outlive the run on either path
        guard.settle();

        match termination {
            Termination::Completed(status) => {
                let status = status.map_err(|source| EngineError::Wait {
                    program: program.clone(),
                    source,
                })?;
                feeder.abort();
                let stdout = collect(stdout_reader).await;
                let stderr = collect(stderr_reader).await;

                let result = self.classify(status, stdout, stderr);
                info!(pid = ?pid, status = %status, verdict = result.label(), "Process completed");
                Ok(result)
            }
            Termination::Killed => {
                self.stats.killed.fetch_add(1, Ordering::Relaxed);
                if let Err(e) = child.start_kill() {
                    debug!(pid = ?pid, error = %e, "Leader already gone");
                }
                child.wait().await.map_err(|source| EngineError::Wait { program, source })?;

                feeder.abort();
                stdout_reader.abort();
                stderr_reader.abort();

                info!(pid = ?pid, time_limit_ms = time_limit.as_millis() as u64, "Process killed on deadline");
                Ok(ExecutionResult::TimeExceeded)
            }
        }
    }

    fn grace_period(&self) -> Duration {
        if self.tle_exit_code.is_some() {
            self.grace
        } else {
            Duration::ZERO
        }
    }

    fn classify(&self, status: ExitStatus, stdout: String, mut stderr: String) -> ExecutionResult {
        if status.success() {
            return ExecutionResult::Success { stdout };
        }

        if let Some(code) = status.code() {
            if Some(code) == self.tle_exit_code {
                return ExecutionResult::TimeExceeded;
            }
            return ExecutionResult::RuntimeFailure { stderr, exit_code: code };
        }

        let signo = status.signal().unwrap_or_default();
        stderr.push_str(&format!("\n[{}]", describe_signal(signo)));
        ExecutionResult::RuntimeFailure {
            stderr,
            exit_code: 128 + signo,
        }
    }
}

/// Spawn errors caused by the artifact itself rather than the host
fn is_program_fault(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied
    ) || e.raw_os_error() == Some(Errno::ENOEXEC as i32)
}

fn describe_signal(signo: i32) -> String {
    match Signal::try_from(signo) {
        Ok(Signal::SIGSEGV) => "Terminated by SIGSEGV: segmentation fault".to_string(),
        Ok(Signal::SIGFPE) => "Terminated by SIGFPE: arithmetic exception".to_string(),
        Ok(Signal::SIGABRT) => "Terminated by SIGABRT: aborted".to_string(),
        Ok(Signal::SIGKILL) => "Terminated by SIGKILL: likely out of memory".to_string(),
        Ok(signal) => format!("Terminated by {}", signal.as_str()),
        Err(_) => format!("Terminated by signal {}", signo),
    }
}

async fn feed_input(stdin: Option<ChildStdin>, input: Vec<u8>) {
    let Some(mut stdin) = stdin else {
        return;
    };
    if !input.is_empty() {
        if let Err(e) = stdin.write_all(&input).await {
            // Typically EPIPE: the program exited without reading everything
            debug!(error = %e, "Input write ended early");
            return;
        }
    }
    // Dropping stdin delivers EOF
    drop(stdin);
}

async fn drain<R>(pipe: Option<R>) -> Vec<u8>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        if let Err(e) = pipe.read_to_end(&mut buf).await {
            debug!(error = %e, "Output pipe read failed");
        }
    }
    buf
}

async fn collect(reader: JoinHandle<Vec<u8>>) -> String {
    let abort = reader.abort_handle();
    match tokio::time::timeout(OUTPUT_DRAIN_TIMEOUT, reader).await {
        Ok(Ok(bytes)) => String::from_utf8_lossy(&bytes).into_owned(),
        Ok(Err(e)) => {
            warn!(error = %e, "Output reader task failed");
            String::new()
        }
        Err(_) => {
            // Something outside the process group kept the pipe open
            abort.abort();
            warn!("Output pipe still open after exit; discarding");
            String::new()
        }
    }
}
