//! berth - operator console for a container host
//!
//! Attaches an interactive shell to a container, streams its resource
//! usage, and browses or edits the files of a project.

use berth_client::ClientConfig;
use berth_utils::{init_logging_with_config, LogConfig, Result};

mod cli;
mod commands;
mod terminal;

use cli::{Args, Command};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse_args();

    // The shell owns the terminal, so its logs go to a file
    let log_config = if args.is_interactive() {
        LogConfig::shell()
    } else {
        LogConfig::cli()
    };
    init_logging_with_config(log_config)?;
    tracing::info!("berth starting");
    tracing::debug!("CLI args: {:?}", args);

    match run_app(args).await {
        Ok(()) => {
            tracing::info!("berth exiting normally");
            Ok(())
        }
        Err(e) => {
            tracing::error!("berth error: {}", e);
            eprintln!("Error: {}", e);
            Err(e)
        }
    }
}

async fn run_app(args: Args) -> Result<()> {
    let config = load_config(&args)?;

    match args.command {
        Command::Shell { container } => commands::shell(&config, &container).await,
        Command::Stats { container, count } => commands::stats(&config, &container, count).await,
        Command::Files { project, action } => commands::files(&config, project, action).await,
    }
}

/// Explicit `--config` must load; the default location falls back quietly
fn load_config(args: &Args) -> Result<ClientConfig> {
    let mut config = match &args.config {
        Some(path) => ClientConfig::load_from(path)?,
        None => ClientConfig::load(),
    };
    if let Some(url) = &args.url {
        config.server.url = url.clone();
    }
    // Fail before any connect
    config.server_url()?;
    Ok(config)
}
