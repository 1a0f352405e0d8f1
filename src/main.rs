use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use safetynet::{AppConfig, AppState, CacheStore, build_router};
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "safetynet")]
#[command(about = "Emergency-response record service")]
struct Cli {
    /// Address to bind (overrides APP_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides APP_PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Backing data file (overrides SAFETYNET_DATA_PATH)
    #[arg(long)]
    data: Option<PathBuf>,

    /// Seed file used when the data file is missing or unusable (overrides SAFETYNET_SEED_PATH)
    #[arg(long)]
    seed: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env().context("failed to load application configuration")?;
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(data) = cli.data {
        config.store.data_path = data;
    }
    if let Some(seed) = cli.seed {
        config.store = config.store.seed_file(seed);
    }

    let store = CacheStore::open(&config.store).with_context(|| {
        format!(
            "failed to initialize record store at {}",
            config.store.data_path.display()
        )
    })?;
    let health = store.health().context("failed to read store health")?;
    if !health.is_consistent() {
        warn!(
            error = health.last_error.as_deref().unwrap_or("unknown"),
            "record store is serving from memory; backing file is not up to date"
        );
    }

    let app = build_router(AppState::new(Arc::new(store)));

    let addr = config.address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(address = %addr, "safetynet started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("safetynet=debug,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "unable to install Ctrl+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "unable to install SIGTERM handler");
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
}
