//! Child-process execution behind the [`ProcessRunner`] trait.
//!
//! The dispatcher only sees the trait, so tests substitute scripted
//! runners and never spawn anything. The production [`SystemRunner`]
//! spawns with a discrete argument list (no shell), drains both pipes on
//! dedicated threads so a chatty tool cannot deadlock on a full pipe
//! buffer, and enforces a hard deadline: a hung tool is killed, not
//! waited on forever. The wait loop polls in short slices so a
//! cancellation flag flipped by a signal handler takes effect mid-run.

use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::warn;
use wait_timeout::ChildExt;

const WAIT_SLICE: Duration = Duration::from_millis(200);

/// Captured output of one finished child process.
#[derive(Debug, Clone)]
pub struct RawOutput {
    /// `None` when the child was killed by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("I/O failure while supervising the process: {0}")]
    Io(#[from] std::io::Error),
    #[error("Timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("Cancelled")]
    Cancelled,
}

/// Runs one external command to completion and captures its output.
pub trait ProcessRunner: Send + Sync {
    fn execute(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> Result<RawOutput, ExecError>;
}

/// Production runner backed by `std::process::Command`.
pub struct SystemRunner {
    cancel: Arc<AtomicBool>,
}

impl SystemRunner {
    pub fn new() -> Self {
        Self {
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shares a cancellation flag, typically flipped by a SIGINT handler.
    pub fn with_cancel_flag(cancel: Arc<AtomicBool>) -> Self {
        Self { cancel }
    }

    fn wait_with_deadline(
        &self,
        child: &mut Child,
        timeout: Duration,
    ) -> Result<ExitStatus, ExecError> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.cancel.load(Ordering::SeqCst) {
                kill_and_reap(child);
                return Err(ExecError::Cancelled);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                kill_and_reap(child);
                return Err(ExecError::Timeout(timeout));
            }
            match child.wait_timeout(remaining.min(WAIT_SLICE)) {
                Ok(Some(status)) => return Ok(status),
                Ok(None) => {}
                Err(source) => {
                    kill_and_reap(child);
                    return Err(ExecError::Io(source));
                }
            }
        }
    }
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessRunner for SystemRunner {
    fn execute(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> Result<RawOutput, ExecError> {
        if self.cancel.load(Ordering::SeqCst) {
            return Err(ExecError::Cancelled);
        }
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ExecError::Spawn {
                program: program.to_string(),
                source,
            })?;

        let stdout_reader = spawn_reader(child.stdout.take());
        let stderr_reader = spawn_reader(child.stderr.take());

        let outcome = self.wait_with_deadline(&mut child, timeout);
        // Killing the child closed its pipes, so the readers finish even
        // on the error paths; both are always joined exactly once.
        let stdout = drain(stdout_reader);
        let stderr = drain(stderr_reader);
        let status = outcome?;

        Ok(RawOutput {
            exit_code: status.code(),
            stdout,
            stderr,
        })
    }
}

type ReaderHandle = Option<thread::JoinHandle<Vec<u8>>>;

fn spawn_reader<R: Read + Send + 'static>(pipe: Option<R>) -> ReaderHandle {
    pipe.map(|pipe| thread::spawn(move || capture(pipe)))
}

/// Reads a pipe to EOF. A failure mid-stream keeps whatever arrived
/// before it.
fn capture<R: Read>(mut pipe: R) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Err(e) = pipe.read_to_end(&mut buf) {
        warn!(error = %e, "Pipe read failed; keeping partial output");
    }
    buf
}

fn drain(handle: ReaderHandle) -> String {
    match handle.and_then(|h| h.join().ok()) {
        Some(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        None => String::new(),
    }
}

fn kill_and_reap(child: &mut Child) {
    // kill can race a natural exit; either way the wait reaps it.
    let _ = child.kill();
    let _ = child.wait();
}
