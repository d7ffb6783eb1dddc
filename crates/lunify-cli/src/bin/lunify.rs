use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use lunify_cli::args::CliArgs;
use lunify_cli::driver;

fn main() -> ExitCode {
    // Unsupported-construct warnings from the rewriter surface by default;
    // RUST_LOG overrides.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();
    match driver::run(&args) {
        Ok(outcome) => {
            // Per-file failures are already reported; only a run that
            // produced nothing at all counts as a failed invocation.
            if outcome.converted == 0 && outcome.failed > 0 {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}
