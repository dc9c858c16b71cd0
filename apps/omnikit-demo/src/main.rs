mod api;
mod config;
mod logging;
mod store;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use omnikit_errs::RequestContext;
use omnikit_errs::axum_ext::ContextTemplate;
use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;
use crate::store::UserStore;

/// Omnikit demo - user service showing the error classification pipeline
#[derive(Parser)]
#[command(name = "omnikit-demo")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port override for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print effective configuration (JSON) and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Validate configuration and exit
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = cli.config.as_deref()
        && !path.is_file()
    {
        anyhow::bail!("config file does not exist: {}", path.display());
    }

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.apply_port_override(port);
    }

    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    logging::init(&config.logging, cli.verbose);

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(config).await,
        Commands::Check => {
            config.bind_addr()?;
            ContextTemplate::new(RequestContext::new(), &config.errs)
                .context("invalid errs.request_id_header")?;
            tracing::info!("configuration is valid");
            Ok(())
        }
    }
}

async fn run(config: AppConfig) -> Result<()> {
    let addr = config.bind_addr()?;
    let root = CancellationToken::new();
    let template = ContextTemplate::new(
        RequestContext::from_config(&config.errs).with_cancellation(root.clone()),
        &config.errs,
    )
    .context("invalid errs.request_id_header")?;

    let state = api::AppState::new(UserStore::new(config.store.capacity));
    let app = api::router(state, template);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "omnikit-demo listening");

    let signal = root.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "failed to listen for ctrl-c");
            }
            tracing::info!("shutdown requested");
            signal.cancel();
        })
        .await
        .context("server error")?;

    tracing::info!(cancelled = root.is_cancelled(), "server stopped");
    Ok(())
}
