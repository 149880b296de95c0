use clap::Parser;
use secsweep::{Cli, handlers};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.list_tools {
        handlers::run_list_tools(&cli)
    } else {
        handlers::run_sweep(&cli)
    }
}

/// Diagnostics go to stderr so stdout stays clean report output.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "secsweep=debug"
    } else {
        "secsweep=warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
