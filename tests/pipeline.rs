//! Pipeline tests over the library API. A scripted runner stands in for
//! the real tools, so these exercise registry lookup, dispatch, adapter
//! normalization, and batch aggregation without spawning anything.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use secsweep::{
    BatchReport, Dispatcher, ExecError, JsonReporter, ProcessRunner, RawOutput, Reporter,
    ScanObserver, ScanResult, ScanStatus, Severity, SweepError, TerminalReporter, ToolRegistry,
};

enum Script {
    Emit {
        exit_code: Option<i32>,
        stdout: &'static str,
        stderr: &'static str,
    },
    TimeOut,
    Cancel,
}

/// Answers `execute` from a per-program script table and records every
/// invocation. Unscripted programs fail to spawn, like a missing binary.
struct ScriptedRunner {
    scripts: HashMap<&'static str, Script>,
    calls: Mutex<Vec<Vec<String>>>,
    kills: AtomicUsize,
}

impl ScriptedRunner {
    fn new() -> Self {
        Self {
            scripts: HashMap::new(),
            calls: Mutex::new(Vec::new()),
            kills: AtomicUsize::new(0),
        }
    }

    fn emit(mut self, program: &'static str, exit_code: i32, stdout: &'static str) -> Self {
        self.scripts.insert(
            program,
            Script::Emit {
                exit_code: Some(exit_code),
                stdout,
                stderr: "",
            },
        );
        self
    }

    fn time_out(mut self, program: &'static str) -> Self {
        self.scripts.insert(program, Script::TimeOut);
        self
    }

    fn cancel(mut self, program: &'static str) -> Self {
        self.scripts.insert(program, Script::Cancel);
        self
    }

    fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

impl ProcessRunner for ScriptedRunner {
    fn execute(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> Result<RawOutput, ExecError> {
        let mut argv = vec![program.to_string()];
        argv.extend(args.iter().cloned());
        self.calls.lock().unwrap().push(argv);

        match self.scripts.get(program) {
            Some(Script::Emit {
                exit_code,
                stdout,
                stderr,
            }) => Ok(RawOutput {
                exit_code: *exit_code,
                stdout: (*stdout).to_string(),
                stderr: (*stderr).to_string(),
            }),
            Some(Script::TimeOut) => {
                self.kills.fetch_add(1, Ordering::SeqCst);
                Err(ExecError::Timeout(timeout))
            }
            Some(Script::Cancel) => Err(ExecError::Cancelled),
            None => Err(ExecError::Spawn {
                program: program.to_string(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            }),
        }
    }
}

fn target() -> &'static Path {
    Path::new(env!("CARGO_MANIFEST_DIR"))
}

const BANDIT_ONE_HIGH: &str = r#"{"results": [{"filename": "app/crypto.py", "line_number": 7, "issue_text": "Use of weak MD5 hash for security.", "issue_severity": "HIGH", "test_id": "B303", "more_info": "https://bandit.readthedocs.io/en/latest/blacklists/blacklist_calls.html"}]}"#;

mod normalization {
    use super::*;

    #[test]
    fn test_bandit_findings_flow_through_the_pipeline() {
        let registry = ToolRegistry::builtin();
        let runner = ScriptedRunner::new().emit("bandit", 1, BANDIT_ONE_HIGH);
        let dispatcher = Dispatcher::new(&registry, &runner);

        let result = dispatcher.run("bandit", target()).unwrap();

        assert_eq!(result.status(), ScanStatus::Findings);
        assert_eq!(result.findings().len(), 1);
        let finding = &result.findings()[0];
        assert_eq!(finding.location, "app/crypto.py");
        assert_eq!(finding.line, Some(7));
        assert_eq!(finding.severity, Severity::High);
        assert_eq!(finding.rule_id.as_deref(), Some("B303"));
        assert_eq!(result.count(Severity::High), 1);
    }

    #[test]
    fn test_argv_template_is_expanded_before_execution() {
        let registry = ToolRegistry::builtin();
        let runner = ScriptedRunner::new().emit("bandit", 0, r#"{"results": []}"#);
        let dispatcher = Dispatcher::new(&registry, &runner);

        dispatcher.run("bandit", target()).unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        let expected = vec![
            "bandit".to_string(),
            "-r".to_string(),
            target().display().to_string(),
            "-f".to_string(),
            "json".to_string(),
        ];
        assert_eq!(calls[0], expected);
    }

    #[test]
    fn test_undecodable_output_becomes_a_tool_error_with_raw_text() {
        let registry = ToolRegistry::builtin();
        let runner =
            ScriptedRunner::new().emit("bandit", 1, "Traceback (most recent call last):\n  oops\n");
        let dispatcher = Dispatcher::new(&registry, &runner);

        let result = dispatcher.run("bandit", target()).unwrap();

        assert_eq!(result.status(), ScanStatus::ToolError);
        assert!(result.raw_message().unwrap().contains("Traceback"));
        assert!(result.findings().is_empty());
    }
}

mod request_errors {
    use super::*;

    #[test]
    fn test_unknown_tool_spawns_nothing() {
        let registry = ToolRegistry::builtin();
        let runner = ScriptedRunner::new();
        let dispatcher = Dispatcher::new(&registry, &runner);

        let err = dispatcher.run("nessus", target()).unwrap_err();

        assert!(matches!(err, SweepError::UnknownTool(_)));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_vanished_target_spawns_nothing() {
        let registry = ToolRegistry::builtin();
        let runner = ScriptedRunner::new().emit("bandit", 0, r#"{"results": []}"#);
        let dispatcher = Dispatcher::new(&registry, &runner);

        let err = dispatcher
            .run("bandit", Path::new("/no/such/checkout"))
            .unwrap_err();

        assert!(matches!(err, SweepError::TargetNotFound(_)));
        assert!(runner.calls().is_empty());
    }
}

mod faults {
    use super::*;

    #[test]
    fn test_timeout_is_a_result_not_an_error() {
        let registry = ToolRegistry::builtin();
        let runner = ScriptedRunner::new().time_out("mypy");
        let dispatcher = Dispatcher::new(&registry, &runner).with_timeout(Duration::from_secs(10));

        let result = dispatcher.run("mypy", target()).unwrap();

        assert_eq!(result.status(), ScanStatus::ToolError);
        assert!(
            result
                .raw_message()
                .unwrap()
                .contains("Timed out after 10s")
        );
        assert_eq!(runner.kills.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_missing_binary_is_a_result_not_an_error() {
        let registry = ToolRegistry::builtin();
        let runner = ScriptedRunner::new();
        let dispatcher = Dispatcher::new(&registry, &runner);

        let result = dispatcher.run("pylint", target()).unwrap();

        assert_eq!(result.status(), ScanStatus::ToolError);
        assert!(
            result
                .raw_message()
                .unwrap()
                .contains("Failed to start 'pylint'")
        );
    }

    #[test]
    fn test_cancellation_preserves_completed_results() {
        let registry = ToolRegistry::builtin();
        let runner = ScriptedRunner::new()
            .emit("bandit", 1, BANDIT_ONE_HIGH)
            .cancel("pylint");
        let dispatcher = Dispatcher::new(&registry, &runner);

        let completed = dispatcher.run("bandit", target()).unwrap();
        let interrupted = dispatcher.run("pylint", target()).unwrap();

        assert_eq!(completed.status(), ScanStatus::Findings);
        assert_eq!(completed.count(Severity::High), 1);
        assert_eq!(interrupted.status(), ScanStatus::ToolError);
        assert_eq!(interrupted.raw_message(), Some("Cancelled"));

        let batch = BatchReport::new(
            "demo",
            "2026-02-11T09:00:00Z",
            vec![completed, interrupted],
        );
        assert_eq!(batch.summary.findings_total, 1);
        assert_eq!(batch.summary.failed_tools, vec!["pylint".to_string()]);
        assert_eq!(batch.summary.exit_code(), 2);

        let rendered = TerminalReporter::new().report_batch(&batch);
        assert!(rendered.contains("[bandit]"));
        assert!(rendered.contains("Cancelled"));
        assert!(rendered.contains("failed: pylint"));
    }
}

mod batches {
    use super::*;

    struct RecordingObserver {
        events: Mutex<Vec<String>>,
    }

    impl ScanObserver for RecordingObserver {
        fn tool_started(&self, tool_id: &str) {
            self.events.lock().unwrap().push(format!("start:{tool_id}"));
        }

        fn tool_finished(&self, result: &ScanResult) {
            self.events
                .lock()
                .unwrap()
                .push(format!("finish:{}:{}", result.tool_id(), result.status()));
        }
    }

    #[test]
    fn test_one_broken_tool_does_not_poison_the_batch() {
        let registry = ToolRegistry::builtin();
        let runner = ScriptedRunner::new()
            .emit("bandit", 1, BANDIT_ONE_HIGH)
            .emit("pylint", 0, "")
            .time_out("mypy");
        let dispatcher = Dispatcher::new(&registry, &runner);

        let results: Vec<ScanResult> = ["bandit", "mypy", "pylint"]
            .into_iter()
            .map(|id| dispatcher.run(id, target()).unwrap())
            .collect();
        let batch = BatchReport::new("demo", "2026-02-11T09:00:00Z", results);

        assert_eq!(batch.summary.tools_run, 3);
        assert_eq!(batch.summary.findings_total, 1);
        assert_eq!(batch.summary.high, 1);
        assert_eq!(batch.summary.failed_tools, vec!["mypy".to_string()]);
        assert!(!batch.summary.passed);
        assert_eq!(batch.summary.exit_code(), 2);
    }

    #[test]
    fn test_observer_sees_start_and_finish_in_order() {
        let registry = ToolRegistry::builtin();
        let runner = ScriptedRunner::new().emit("pylint", 0, "");
        let observer = RecordingObserver {
            events: Mutex::new(Vec::new()),
        };
        let dispatcher = Dispatcher::new(&registry, &runner).with_observer(&observer);

        dispatcher.run("pylint", target()).unwrap();

        let events = observer.events.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                "start:pylint".to_string(),
                "finish:pylint:clean".to_string()
            ]
        );
    }

    #[test]
    fn test_json_batch_report_is_machine_readable() {
        let registry = ToolRegistry::builtin();
        let runner = ScriptedRunner::new().emit("bandit", 1, BANDIT_ONE_HIGH);
        let dispatcher = Dispatcher::new(&registry, &runner);

        let results = vec![dispatcher.run("bandit", target()).unwrap()];
        let batch = BatchReport::new("demo", "2026-02-11T09:00:00Z", results);
        let rendered = JsonReporter::new().report_batch(&batch);
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();

        assert_eq!(value["summary"]["findings_total"], 1);
        assert_eq!(value["results"][0]["tool_id"], "bandit");
        assert_eq!(value["results"][0]["status"], "findings");
        assert_eq!(value["results"][0]["findings"][0]["severity"], "high");
    }
}
