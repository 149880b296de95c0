pub mod adapter;
pub mod cli;
pub mod dispatch;
pub mod error;
pub mod exec;
pub mod handlers;
pub mod model;
pub mod registry;
pub mod report;

#[cfg(test)]
pub mod test_utils;

pub use adapter::{AdapterKind, ToolAdapter};
pub use cli::{CategoryFilter, Cli, OutputFormat};
pub use dispatch::{DEFAULT_TIMEOUT, Dispatcher, ScanObserver};
pub use error::{Result, SweepError};
pub use exec::{ExecError, ProcessRunner, RawOutput, SystemRunner};
pub use model::{Finding, RawExecution, ScanResult, ScanStatus, Severity, ToolFamily};
pub use registry::{InputKind, ToolCategory, ToolRegistry, ToolSpec};
pub use report::{
    BatchReport, BatchSummary, Reporter, json::JsonReporter, progress::SweepProgress,
    terminal::TerminalReporter,
};
