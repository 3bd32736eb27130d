//! Spawning and supervising script processes.
//!
//! [`ScriptRunner::start`] spawns one child per call and hands back a
//! [`RunHandle`]. A supervisor task owns the child from then on:
//!
//! 1. Two reader tasks forward stdout and stderr lines into one channel.
//! 2. The supervisor waits for the child to exit (or for cancellation or the
//!    run timeout, both of which kill the child's process group).
//! 3. Once both pipes have drained it sends a single
//!    [`ProcessEvent::Exited`], which is therefore always the last event.
//!
//! Dropping the [`RunHandle`] cancels the run. The HTTP layer relies on
//! this: when a client disconnects, the response body (which owns the
//! handle) is dropped and the child is killed and reaped.

use std::fmt;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use tokio::process::{Child, Command};
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::Instrument;

use super::command::{RunnerCommand, RunnerLimits, ScriptError};
use super::stream::{forward_lines, OutputStream, ProcessEvent};

/// Buffered events per run before readers wait on the consumer.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Launches the configured command and supervises each run.
///
/// Shared across requests behind an `Arc`. Runs never share state with
/// each other; the runner only hands out concurrency slots and the shutdown
/// signal.
pub struct ScriptRunner {
    command: RunnerCommand,
    limits: RunnerLimits,
    slots: Arc<Semaphore>,
    shutdown: CancellationToken,
}

impl ScriptRunner {
    pub fn new(command: RunnerCommand, limits: RunnerLimits) -> Self {
        Self {
            command,
            limits,
            slots: Arc::new(Semaphore::new(limits.max_concurrent_runs)),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn command(&self) -> &RunnerCommand {
        &self.command
    }

    pub fn limits(&self) -> RunnerLimits {
        self.limits
    }

    /// Number of runs that could start right now.
    pub fn available_slots(&self) -> usize {
        self.slots.available_permits()
    }

    /// Cancel every in-flight run.
    ///
    /// Runs started after shutdown are killed immediately.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Spawn the configured command.
    ///
    /// Fails without spawning anything when every slot is taken, and fails
    /// before any event is produced when the process cannot be spawned.
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) -> Result<RunHandle, ScriptError> {
        let permit = Arc::clone(&self.slots)
            .try_acquire_owned()
            .map_err(|_| ScriptError::Busy {
                limit: self.limits.max_concurrent_runs,
            })?;

        let program = &self.command.program;
        let mut cmd = Command::new(program);
        cmd.args(&self.command.args)
            .envs(self.command.env_vars.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = &self.command.working_directory {
            cmd.current_dir(dir);
        }

        // Own process group, so a kill also reaches anything the script forks.
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd.spawn().map_err(|e| {
            tracing::error!(%program, error = %e, "Failed to spawn script process");
            ScriptError::from_spawn(program, e)
        })?;

        let pid = child.id();
        tracing::info!(%program, pid = pid.unwrap_or_default(), "Spawned script process");

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let mut readers = JoinSet::new();
        if let Some(stdout) = child.stdout.take() {
            readers.spawn(forward_lines(stdout, OutputStream::Stdout, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.spawn(forward_lines(stderr, OutputStream::Stderr, tx.clone()));
        }

        let cancel = self.shutdown.child_token();
        let run = Supervised {
            child,
            pid,
            readers,
            tx,
            cancel: cancel.clone(),
            expires_at: self.limits.run_timeout.map(|t| Instant::now() + t),
            _permit: permit,
        };

        let span = tracing::info_span!("script_run", pid = pid.unwrap_or_default());
        tokio::spawn(supervise(run).instrument(span));

        Ok(RunHandle {
            pid,
            events: rx,
            _cancel_on_drop: cancel.drop_guard(),
        })
    }
}

/// Exclusive handle on one run's output.
///
/// Dropping it cancels the run: the process group is killed and reaped.
pub struct RunHandle {
    pid: Option<u32>,
    events: mpsc::Receiver<ProcessEvent>,
    _cancel_on_drop: DropGuard,
}

impl RunHandle {
    /// OS process id of the child.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Next event of the run, or `None` once the run is over.
    pub async fn next_event(&mut self) -> Option<ProcessEvent> {
        self.events.recv().await
    }
}

impl fmt::Debug for RunHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunHandle")
            .field("pid", &self.pid)
            .finish_non_exhaustive()
    }
}

/// Everything the supervisor task owns for the lifetime of a run.
struct Supervised {
    child: Child,
    pid: Option<u32>,
    readers: JoinSet<()>,
    tx: mpsc::Sender<ProcessEvent>,
    cancel: CancellationToken,
    expires_at: Option<Instant>,
    _permit: OwnedSemaphorePermit,
}

async fn supervise(run: Supervised) {
    let Supervised {
        mut child,
        pid,
        mut readers,
        tx,
        cancel,
        mut expires_at,
        _permit,
    } = run;

    let status = tokio::select! {
        status = child.wait() => status,
        () = cancel.cancelled() => {
            tracing::warn!("Run cancelled, killing process");
            if let Err(e) = terminate(&mut child, pid).await {
                tracing::error!(error = %e, "Failed to reap cancelled process");
            }
            return;
        }
        () = deadline(expires_at) => {
            tracing::warn!("Run timed out, killing process");
            expires_at = None;
            terminate(&mut child, pid).await
        }
    };

    // Pipes can outlive the child when it leaves background processes behind.
    loop {
        tokio::select! {
            joined = readers.join_next() => {
                if joined.is_none() {
                    break;
                }
            }
            () = cancel.cancelled() => {
                tracing::warn!("Run cancelled while draining output");
                kill_reaped_group(pid);
                return;
            }
            () = deadline(expires_at) => {
                tracing::warn!("Run timed out while draining output");
                expires_at = None;
                kill_reaped_group(pid);
                readers.abort_all();
            }
        }
    }

    let code = exit_code(status);
    tracing::info!(code, "Script process exited");
    // The consumer may already be gone; nothing left to tell it then.
    let _ = tx.send(ProcessEvent::Exited { code }).await;
}

/// Exit code reported to the client. Signal deaths and wait failures are `-1`.
fn exit_code(status: std::io::Result<ExitStatus>) -> i32 {
    match status {
        Ok(status) => status.code().unwrap_or(-1),
        Err(e) => {
            tracing::error!(error = %e, "Failed to wait for script process");
            -1
        }
    }
}

/// Kill the child with its process group and wait for it.
async fn terminate(child: &mut Child, pid: Option<u32>) -> std::io::Result<ExitStatus> {
    kill_process_group(pid);
    // Covers platforms without process groups; harmless if already dead.
    let _ = child.start_kill();
    child.wait().await
}

/// Kill what is left of the group once its leader has been reaped.
///
/// The group id stays reserved only while a member is alive, so a group that
/// is already empty is left alone instead of signalling a reused id.
fn kill_reaped_group(pid: Option<u32>) {
    if process_group_alive(pid) {
        kill_process_group(pid);
    } else {
        tracing::debug!("Process group already empty");
    }
}

#[cfg(unix)]
fn process_group_id(pid: Option<u32>) -> Option<libc::pid_t> {
    pid.and_then(|p| libc::pid_t::try_from(p).ok())
        .filter(|&pgid| pgid > 0)
}

#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    let Some(pgid) = process_group_id(pid) else {
        return;
    };
    // Safety: kill(2) has no memory preconditions. The group id is the
    // child's pid because it was spawned with `process_group(0)`.
    unsafe {
        libc::kill(-pgid, libc::SIGKILL);
    }
}

#[cfg(unix)]
fn process_group_alive(pid: Option<u32>) -> bool {
    let Some(pgid) = process_group_id(pid) else {
        return false;
    };
    // Safety: signal 0 only checks that the group exists.
    unsafe { libc::kill(-pgid, 0) == 0 }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}

#[cfg(not(unix))]
fn process_group_alive(_pid: Option<u32>) -> bool {
    false
}

/// Resolves at `at`, or never.
async fn deadline(at: Option<Instant>) {
    match at {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
