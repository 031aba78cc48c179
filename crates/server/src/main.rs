use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reelsync_core::{
    create_authenticator, load_config, validate_config, Authenticator, CatalogStore,
    IntervalTicker, MetadataProvider, SanitizedConfig, SqliteCatalogStore, SyncJob,
    SyncScheduler, TmdbProvider,
};
use reelsync_server::{api::create_router, state::AppState};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::var("REELSYNC_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    info!("reelsync {} loading configuration from {:?}", VERSION, config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;

    // Hash of the redacted config, to tell deployments apart in logs
    let config_json = serde_json::to_string(&SanitizedConfig::from(&config))
        .context("Failed to serialize config")?;
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!(
        "Configuration loaded (hash {}): auth={}, database={:?}",
        &config_hash[..16],
        config.auth.method.as_str(),
        config.database.path
    );

    let authenticator: Arc<dyn Authenticator> = Arc::from(
        create_authenticator(&config.auth).context("Failed to create authenticator")?,
    );

    let store: Arc<dyn CatalogStore> = Arc::new(
        SqliteCatalogStore::new(&config.database.path)
            .context("Failed to open catalog database")?,
    );
    info!("Catalog store initialized");

    let provider: Arc<dyn MetadataProvider> = Arc::new(
        TmdbProvider::new(config.provider.tmdb.clone())
            .context("Failed to create TMDB provider")?,
    );

    let sync_job = Arc::new(SyncJob::new(
        config.sync.clone(),
        provider,
        Arc::clone(&store),
    ));

    let scheduler = if config.scheduler.enabled {
        let scheduler = Arc::new(SyncScheduler::new(
            Arc::clone(&sync_job),
            config.sync.max_pages,
        ));
        scheduler
            .start(IntervalTicker::from_config(&config.scheduler))
            .await;
        info!(
            "Sync scheduler started: every {}s, run_on_startup={}",
            config.scheduler.interval_secs, config.scheduler.run_on_startup
        );
        Some(scheduler)
    } else {
        info!("Sync scheduler disabled in config");
        None
    };

    let state = Arc::new(AppState::new(
        config.clone(),
        authenticator,
        store,
        sync_job,
        scheduler.clone(),
    ));
    let app = create_router(state);

    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    if let Some(scheduler) = scheduler {
        scheduler.stop().await;
    }
    info!("Server stopped");

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
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
    info!("Shutdown signal received");
}
