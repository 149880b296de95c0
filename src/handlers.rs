//! Command handlers for the secsweep CLI.
//!
//! Each handler owns one top-level mode and returns the process exit code:
//! 0 when every tool ran clean, 1 when findings were reported, 2 when a
//! tool failed or the request itself was bad (unknown tool, missing
//! target, unreadable config).

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::cli::{CategoryFilter, Cli, OutputFormat};
use crate::dispatch::{Dispatcher, ScanObserver};
use crate::error::{Result, SweepError};
use crate::exec::SystemRunner;
use crate::model::ScanResult;
use crate::registry::{InputKind, ToolCategory, ToolRegistry, ToolSpec};
use crate::report::json::JsonReporter;
use crate::report::progress::SweepProgress;
use crate::report::terminal::TerminalReporter;
use crate::report::{BatchReport, Reporter};

/// Runs the selected tools against the target and prints the batch report.
pub fn run_sweep(cli: &Cli) -> ExitCode {
    let Some(target) = cli.target.as_deref() else {
        eprintln!("Error: no scan target given");
        return ExitCode::from(2);
    };
    if !target.exists() {
        eprintln!("Error: {}", SweepError::TargetNotFound(target.to_path_buf()));
        return ExitCode::from(2);
    }

    let registry = match build_registry(cli) {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(2);
        }
    };
    let tool_ids = match select_tools(cli, &registry) {
        Ok(ids) => ids,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(2);
        }
    };
    info!(target = %target.display(), tools = ?tool_ids, "Starting sweep");

    let cancel = Arc::new(AtomicBool::new(false));
    if let Err(e) = signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&cancel)) {
        warn!(error = %e, "Could not install SIGINT handler");
    }

    let runner = SystemRunner::with_cancel_flag(Arc::clone(&cancel));
    let progress = SweepProgress::new(tool_ids.len(), std::io::stderr().is_terminal(), cli.ci);
    let observer = ProgressObserver {
        progress: &progress,
    };
    let dispatcher = Dispatcher::new(&registry, &runner)
        .with_timeout(Duration::from_secs(cli.timeout))
        .with_observer(&observer);

    // Tools named with --tools were asked for by name, so a target they
    // cannot scan is the caller's error. In a default or category sweep
    // the same mismatch just skips the tool.
    let explicit = !cli.tools.is_empty();
    let started_at = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    let mut results: Vec<ScanResult> = Vec::new();
    let mut request_failed = false;

    for tool_id in &tool_ids {
        if cancel.load(Ordering::SeqCst) {
            warn!("Sweep interrupted; reporting completed tools only");
            break;
        }
        // Selection already resolved every id once.
        let Ok(spec) = registry.get(tool_id) else {
            continue;
        };
        let tool_target = match resolve_target(spec, target, cli.requirements_file.as_deref()) {
            Ok(path) => path,
            Err(e) if explicit => {
                eprintln!("Error: {e}");
                request_failed = true;
                continue;
            }
            Err(e) => {
                warn!(tool = %tool_id, error = %e, "Skipping tool");
                eprintln!("Skipping {tool_id}: {e}");
                continue;
            }
        };
        match dispatcher.run(tool_id, &tool_target) {
            Ok(result) => results.push(result),
            Err(e) => {
                eprintln!("Error: {e}");
                request_failed = true;
            }
        }
    }
    progress.finish();

    let batch = BatchReport::new(target.display().to_string(), started_at, results);
    debug!(
        tools_run = batch.summary.tools_run,
        findings = batch.summary.findings_total,
        failed = batch.summary.failed_tools.len(),
        "Sweep completed"
    );

    let output = match cli.format {
        OutputFormat::Terminal => TerminalReporter::new()
            .with_urls(!cli.ci)
            .report_batch(&batch),
        OutputFormat::Json => JsonReporter::new().report_batch(&batch),
    };
    println!("{output}");

    if request_failed {
        return ExitCode::from(2);
    }
    ExitCode::from(batch.summary.exit_code())
}

/// Prints the registered tool table, honoring `--config` overrides.
pub fn run_list_tools(cli: &Cli) -> ExitCode {
    let registry = match build_registry(cli) {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(2);
        }
    };

    println!("Registered tools ({}):", registry.len());
    for spec in registry.specs() {
        let mut invocation = spec.command.clone();
        for arg in &spec.args_template {
            invocation.push(' ');
            invocation.push_str(arg);
        }
        println!(
            "  {:<12} {:<9} {:<9} {}",
            spec.tool_id,
            spec.category.as_str(),
            spec.input_kind.as_str(),
            invocation
        );
    }
    ExitCode::SUCCESS
}

fn build_registry(cli: &Cli) -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::builtin();
    if let Some(path) = &cli.config {
        registry.extend_from_file(path)?;
        info!(config = %path.display(), "Merged tool config");
    }
    Ok(registry)
}

/// Which tools this invocation runs, in run order. Explicit `--tools` ids
/// keep the order they were given; category and default sweeps run in id
/// order.
fn select_tools(cli: &Cli, registry: &ToolRegistry) -> Result<Vec<String>> {
    if !cli.tools.is_empty() {
        let mut ids: Vec<String> = Vec::with_capacity(cli.tools.len());
        for id in &cli.tools {
            registry.get(id)?;
            if !ids.contains(id) {
                ids.push(id.clone());
            }
        }
        return Ok(ids);
    }
    let ids = match category_filter(cli.category) {
        Some(category) => registry.tools_in_category(category),
        None => registry.tool_ids(),
    };
    Ok(ids.into_iter().map(String::from).collect())
}

fn category_filter(filter: CategoryFilter) -> Option<ToolCategory> {
    match filter {
        CategoryFilter::All => None,
        CategoryFilter::Security => Some(ToolCategory::Security),
        CategoryFilter::Linting => Some(ToolCategory::Linting),
    }
}

/// Resolves the CLI target into the path a given tool actually scans.
///
/// Most tools take the target as-is. `safety` wants a pinned requirements
/// file, so a directory target is narrowed to the requirements file inside
/// it (`requirements.txt` unless `--requirements-file` says otherwise).
/// `trufflehog` walks git history and needs a `.git` database.
fn resolve_target(
    spec: &ToolSpec,
    target: &Path,
    requirements_file: Option<&Path>,
) -> Result<PathBuf> {
    match spec.input_kind {
        InputKind::Path => Ok(target.to_path_buf()),
        InputKind::File => {
            if target.is_file() {
                return Ok(target.to_path_buf());
            }
            let name = requirements_file.unwrap_or(Path::new("requirements.txt"));
            let candidate = target.join(name);
            if candidate.is_file() {
                Ok(candidate)
            } else {
                Err(SweepError::InvalidTarget {
                    path: candidate,
                    reason: "requirements file not found".to_string(),
                })
            }
        }
        InputKind::GitRepo => {
            if target.join(".git").exists() {
                Ok(target.to_path_buf())
            } else {
                Err(SweepError::InvalidTarget {
                    path: target.to_path_buf(),
                    reason: format!(
                        "{} expects {}",
                        spec.tool_id,
                        spec.input_kind.expects()
                    ),
                })
            }
        }
    }
}

struct ProgressObserver<'a> {
    progress: &'a SweepProgress,
}

impl ScanObserver for ProgressObserver<'_> {
    fn tool_started(&self, tool_id: &str) {
        self.progress.start_tool(tool_id);
    }

    fn tool_finished(&self, _result: &ScanResult) {
        self.progress.inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::fs;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("secsweep").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_default_selection_covers_every_registered_tool() {
        let registry = ToolRegistry::builtin();
        let ids = select_tools(&cli(&["."]), &registry).unwrap();
        assert_eq!(ids.len(), registry.len());
        assert!(ids.contains(&"bandit".to_string()));
        assert!(ids.contains(&"radon".to_string()));
    }

    #[test]
    fn test_category_selection_filters_to_linting() {
        let registry = ToolRegistry::builtin();
        let ids = select_tools(&cli(&[".", "-c", "linting"]), &registry).unwrap();
        assert_eq!(
            ids,
            vec![
                "mypy".to_string(),
                "pylint".to_string(),
                "radon".to_string()
            ]
        );
    }

    #[test]
    fn test_explicit_selection_keeps_request_order() {
        let registry = ToolRegistry::builtin();
        let ids = select_tools(&cli(&[".", "-t", "radon,bandit"]), &registry).unwrap();
        assert_eq!(ids, vec!["radon".to_string(), "bandit".to_string()]);
    }

    #[test]
    fn test_explicit_selection_rejects_unknown_ids() {
        let registry = ToolRegistry::builtin();
        let err = select_tools(&cli(&[".", "-t", "bandit,nessus"]), &registry).unwrap_err();
        assert_eq!(err.to_string(), "Unknown tool: nessus");
    }

    #[test]
    fn test_duplicate_explicit_ids_run_once() {
        let registry = ToolRegistry::builtin();
        let ids = select_tools(&cli(&[".", "-t", "mypy,mypy"]), &registry).unwrap();
        assert_eq!(ids, vec!["mypy".to_string()]);
    }

    #[test]
    fn test_category_filter_maps_cli_values() {
        assert_eq!(category_filter(CategoryFilter::All), None);
        assert_eq!(
            category_filter(CategoryFilter::Security),
            Some(ToolCategory::Security)
        );
        assert_eq!(
            category_filter(CategoryFilter::Linting),
            Some(ToolCategory::Linting)
        );
    }

    #[test]
    fn test_path_tools_take_the_target_as_given() {
        let registry = ToolRegistry::builtin();
        let spec = registry.get("bandit").unwrap();
        let dir = tempfile::tempdir().unwrap();
        let resolved = resolve_target(spec, dir.path(), None).unwrap();
        assert_eq!(resolved, dir.path());
    }

    #[test]
    fn test_file_tools_look_up_requirements_inside_a_directory() {
        let registry = ToolRegistry::builtin();
        let spec = registry.get("safety").unwrap();
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("requirements.txt"), "requests==2.19.0\n").unwrap();
        let resolved = resolve_target(spec, dir.path(), None).unwrap();
        assert_eq!(resolved, dir.path().join("requirements.txt"));
    }

    #[test]
    fn test_file_tools_honor_the_requirements_file_flag() {
        let registry = ToolRegistry::builtin();
        let spec = registry.get("safety").unwrap();
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("dev.txt"), "flask==0.12\n").unwrap();
        let resolved = resolve_target(spec, dir.path(), Some(Path::new("dev.txt"))).unwrap();
        assert_eq!(resolved, dir.path().join("dev.txt"));
    }

    #[test]
    fn test_file_tools_accept_a_file_target_directly() {
        let registry = ToolRegistry::builtin();
        let spec = registry.get("safety").unwrap();
        let dir = tempfile::tempdir().unwrap();
        let reqs = dir.path().join("pins.txt");
        fs::write(&reqs, "django==1.8\n").unwrap();
        let resolved = resolve_target(spec, &reqs, None).unwrap();
        assert_eq!(resolved, reqs);
    }

    #[test]
    fn test_missing_requirements_file_is_an_invalid_target() {
        let registry = ToolRegistry::builtin();
        let spec = registry.get("safety").unwrap();
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_target(spec, dir.path(), None).unwrap_err();
        assert!(err.to_string().contains("requirements file not found"));
    }

    #[test]
    fn test_repo_tools_require_a_git_database() {
        let registry = ToolRegistry::builtin();
        let spec = registry.get("trufflehog").unwrap();
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_target(spec, dir.path(), None).unwrap_err();
        assert!(
            err.to_string()
                .contains("trufflehog expects a git repository")
        );

        fs::create_dir(dir.path().join(".git")).unwrap();
        let resolved = resolve_target(spec, dir.path(), None).unwrap();
        assert_eq!(resolved, dir.path());
    }
}
