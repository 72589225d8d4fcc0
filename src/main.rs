use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use iac_dashboard::lifecycle::startup;

/// Infrastructure dashboard and voting API.
#[derive(Parser)]
#[command(name = "iac-dashboard", version, about)]
struct Args {
    /// TOML configuration file. Defaults and environment overrides apply without one.
    #[arg(short, long, env = "IAC_DASHBOARD_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match startup::run(args.config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Logging may not be initialized yet when configuration fails.
            eprintln!("iac-dashboard: {e}");
            tracing::error!(error = %e, "Startup failed");
            ExitCode::FAILURE
        }
    }
}
