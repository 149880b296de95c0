use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Terminal,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Security,
    Linting,
}

#[derive(Parser, Debug)]
#[command(
    name = "secsweep",
    version,
    about = "Runs security and lint tools against a codebase and reports their findings",
    long_about = "secsweep runs a fixed set of security scanners and linters (bandit, safety, \
                  trufflehog, checkov, pylint, mypy, radon) against a path and normalizes their \
                  heterogeneous output into one uniform report."
)]
pub struct Cli {
    /// Path to scan (directory, file, or git repository depending on the tool)
    #[arg(required_unless_present = "list_tools")]
    pub target: Option<PathBuf>,

    /// Tools to run, comma separated; defaults to every registered tool
    #[arg(short, long, value_delimiter = ',')]
    pub tools: Vec<String>,

    /// Run only the tools in one category
    #[arg(short, long, value_enum, default_value_t = CategoryFilter::All, conflicts_with = "tools")]
    pub category: CategoryFilter,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Terminal)]
    pub format: OutputFormat,

    /// Per-tool timeout in seconds
    #[arg(long, default_value_t = 300)]
    pub timeout: u64,

    /// Additional tool registry file (YAML)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Requirements file for the dependency scanner, resolved against the target
    #[arg(long, value_name = "FILE")]
    pub requirements_file: Option<PathBuf>,

    /// List registered tools and exit
    #[arg(long)]
    pub list_tools: bool,

    /// CI mode: no progress display
    #[arg(long)]
    pub ci: bool,

    /// Verbose diagnostics on stderr
    #[arg(short, long)]
    pub verbose: bool,
}
