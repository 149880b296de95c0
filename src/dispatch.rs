//! Dispatcher: one tool invocation end to end.
//!
//! `run` looks the tool up, re-checks the target, executes the process
//! through the injected [`ProcessRunner`], and hands the capture to the
//! tool's adapter. Execution faults and adapter faults all land in a
//! `tool_error` result; the only error returns are request-level ones
//! (unknown tool, vanished target), raised before anything is spawned.

use crate::error::{Result, SweepError};
use crate::exec::{ProcessRunner, RawOutput};
use crate::model::{RawExecution, ScanResult, ScanStatus};
use crate::registry::{ToolRegistry, ToolSpec};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Diagnostics sink for scan lifecycle events. Injected so callers (and
/// tests) observe progress without global logging fixtures.
pub trait ScanObserver {
    fn tool_started(&self, tool_id: &str);
    fn tool_finished(&self, result: &ScanResult);
}

pub struct Dispatcher<'a> {
    registry: &'a ToolRegistry,
    runner: &'a dyn ProcessRunner,
    timeout: Duration,
    observer: Option<&'a dyn ScanObserver>,
}

impl<'a> Dispatcher<'a> {
    pub fn new(registry: &'a ToolRegistry, runner: &'a dyn ProcessRunner) -> Self {
        Self {
            registry,
            runner,
            timeout: DEFAULT_TIMEOUT,
            observer: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_observer(mut self, observer: &'a dyn ScanObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Runs one tool against one target. Exactly one spawn per call, no
    /// retry: external scanners are not assumed idempotent-safe.
    pub fn run(&self, tool_id: &str, target: &Path) -> Result<ScanResult> {
        let spec = self.registry.get(tool_id)?;
        // The caller validated the target, but it can vanish between
        // validation and invocation; re-check before spawning.
        if !target.exists() {
            return Err(SweepError::TargetNotFound(target.to_path_buf()));
        }

        if let Some(observer) = self.observer {
            observer.tool_started(tool_id);
        }
        tracing::debug!(tool = %tool_id, target = %target.display(), "running tool");

        let args = spec.args_for(target);
        let result = match self.runner.execute(&spec.command, &args, self.timeout) {
            Ok(output) => adapt_output(spec, tool_id, output),
            Err(e) => {
                tracing::warn!(tool = %tool_id, error = %e, "tool execution failed");
                ScanResult::tool_error(tool_id, spec.family, e.to_string())
            }
        };

        if result.status() == ScanStatus::ToolError {
            tracing::warn!(
                tool = %tool_id,
                message = result.raw_message().unwrap_or(""),
                "tool ended in error"
            );
        } else {
            tracing::info!(
                tool = %tool_id,
                status = %result.status(),
                findings = result.findings().len(),
                "tool finished"
            );
        }
        if let Some(observer) = self.observer {
            observer.tool_finished(&result);
        }
        Ok(result)
    }
}

fn adapt_output(spec: &ToolSpec, tool_id: &str, output: RawOutput) -> ScanResult {
    let raw = RawExecution::new(tool_id, output.exit_code, output.stdout, output.stderr);
    // The closure borrows only the raw capture, which is discarded if it
    // unwinds, so the panic cannot leave torn state behind.
    match catch_unwind(AssertUnwindSafe(|| spec.adapter().adapt(&raw))) {
        Ok(result) => result,
        Err(_) => {
            tracing::error!(tool = %tool_id, "adapter panicked");
            ScanResult::tool_error(
                tool_id,
                spec.family,
                "adapter failed to process tool output",
            )
        }
    }
}
