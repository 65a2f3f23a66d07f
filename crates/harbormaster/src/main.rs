mod cli;
mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    // Parse CLI args
    let cli = Cli::parse();

    // Load config
    let config = config::load_config(cli.config.as_deref())?;

    // Dispatch to command
    match cli.command {
        Commands::Serve { host, port } => {
            commands::serve::execute(host, port, &config).await?;
        }
    }

    Ok(())
}

// Structured JSON logs; RUST_LOG narrows the filter, info is the floor.
fn init_logging() {
    use tracing_subscriber::filter::LevelFilter;
    use tracing_subscriber::{fmt, EnvFilter};

    fmt()
        .json()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();
}
