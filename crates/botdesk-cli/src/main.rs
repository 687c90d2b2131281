//! BotDesk CLI entry point.

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use botdesk_cli::cli::Cli;
use botdesk_cli::{commands, load_env_files};
use botdesk_persistence::paths;

#[tokio::main]
async fn main() {
    // Before parsing, so env-backed flags see the overrides.
    load_env_files(&paths::state_dir());

    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level().to_string()));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = commands::execute(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
