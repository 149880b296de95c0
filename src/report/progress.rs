//! Spinner shown while external tools run.

use indicatif::{ProgressBar, ProgressStyle};

/// Minimum number of tools before a progress bar is worth drawing.
const MIN_TOOLS_FOR_PROGRESS: usize = 2;

/// Progress display for a batch of tool runs.
///
/// Only shown when the batch is large enough, stderr is a TTY, and the
/// run is not in CI mode; otherwise every call is a no-op.
pub struct SweepProgress {
    bar: Option<ProgressBar>,
}

impl SweepProgress {
    pub fn new(total_tools: usize, is_tty: bool, is_ci: bool) -> Self {
        let bar = if should_show_progress(total_tools, is_tty, is_ci) {
            Some(create_progress_bar(total_tools))
        } else {
            None
        };
        Self { bar }
    }

    /// Names the tool currently running.
    pub fn start_tool(&self, tool_id: &str) {
        if let Some(bar) = &self.bar {
            bar.set_message(tool_id.to_string());
        }
    }

    pub fn inc(&self) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

fn should_show_progress(total_tools: usize, is_tty: bool, is_ci: bool) -> bool {
    total_tools >= MIN_TOOLS_FOR_PROGRESS && is_tty && !is_ci
}

fn create_progress_bar(total: usize) -> ProgressBar {
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{pos}/{len}] running {msg}")
            .expect("Invalid progress bar template"),
    );
    pb
}
