//! redd-serve - Serve the Redditor web form

use anyhow::Context;
use clap::Parser;
use libredditor::config::load_env_file;
use libredditor::logging::LoggingConfig;
use libredditor::{Config, Credentials, Pipeline};
use redd_serve::{app, AppState, ServerSettings};
use tokio::net::TcpListener;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "redd-serve")]
#[command(version)]
#[command(about = "Serve a web form that fetches and enriches the newest posts of a subreddit", long_about = None)]
struct Cli {
    /// Address to bind to (overrides server.bind_address)
    #[arg(long)]
    bind: Option<String>,

    /// Port to listen on (overrides server.port)
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let env_file = load_env_file()?;
    let config = Config::load().context("loading configuration")?;

    let _guard = LoggingConfig::from_config(&config.logging, cli.verbose)?.init();
    if let Some(path) = env_file {
        debug!("Loaded environment from {}", path.display());
    }

    let mut settings = ServerSettings::from_config(&config.server);
    if let Some(bind) = cli.bind {
        settings.bind_address = bind;
    }
    if let Some(port) = cli.port {
        settings.port = port;
    }

    let credentials = Credentials::from_env().context("reading Reddit credentials")?;
    let pipeline = Pipeline::from_config(&config, &credentials)?;
    info!("Enrichment provider: {}", pipeline.enricher_name());

    let router = app(AppState::new(pipeline, credentials), &settings.static_dir);

    let addr = settings.socket_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    info!("Server stopped");
    Ok(())
}

/// Resolve on Ctrl-C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Received shutdown signal, stopping gracefully...");
}
