//! Adapters that turn raw tool output into [`ScanResult`]s.
//!
//! One adapter per supported tool. Adapters are total: whatever the raw
//! execution looks like (garbage stdout, missing exit code, half-written
//! JSON), `adapt` returns a result instead of failing. Output that cannot
//! be understood becomes a `tool_error` result that preserves the raw
//! text for the report.

mod complexity;
mod exit_code;
mod iac;
mod structured;

pub use complexity::RadonAdapter;
pub use exit_code::{MypyAdapter, PylintAdapter};
pub use iac::CheckovAdapter;
pub use structured::{BanditAdapter, SafetyAdapter, TrufflehogAdapter};

use crate::model::{RawExecution, ScanResult, ToolFamily};
use serde::{Deserialize, Serialize};

/// Converts one tool's raw output into the normalized model.
///
/// Implementations must not panic on malformed input; the dispatcher
/// treats a panicking adapter as an internal bug and degrades the run to
/// a tool error, but adapters are expected to handle hostile output
/// themselves.
pub trait ToolAdapter: Send + Sync {
    fn adapt(&self, raw: &RawExecution) -> ScanResult;
}

/// Names a builtin adapter, so registry config files can refer to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterKind {
    Bandit,
    Safety,
    Trufflehog,
    Checkov,
    Pylint,
    Mypy,
    Radon,
}

impl AdapterKind {
    /// Rendering family of results produced by this adapter.
    pub fn family(&self) -> ToolFamily {
        match self {
            AdapterKind::Bandit | AdapterKind::Safety => ToolFamily::Vulnerability,
            AdapterKind::Trufflehog => ToolFamily::Secret,
            AdapterKind::Checkov => ToolFamily::Iac,
            AdapterKind::Pylint | AdapterKind::Mypy => ToolFamily::Diagnostic,
            AdapterKind::Radon => ToolFamily::Complexity,
        }
    }

    pub fn build(&self) -> Box<dyn ToolAdapter> {
        match self {
            AdapterKind::Bandit => Box::new(BanditAdapter),
            AdapterKind::Safety => Box::new(SafetyAdapter),
            AdapterKind::Trufflehog => Box::new(TrufflehogAdapter),
            AdapterKind::Checkov => Box::new(CheckovAdapter),
            AdapterKind::Pylint => Box::new(PylintAdapter),
            AdapterKind::Mypy => Box::new(MypyAdapter),
            AdapterKind::Radon => Box::new(RadonAdapter),
        }
    }
}
