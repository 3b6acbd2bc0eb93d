use mimalloc::MiMalloc;
use roster::config::Config;
use roster::db::{SEED_USERS, UserStore};
use roster::server::router::{RosterState, roster_router};
use std::net::SocketAddr;
use tokio::{net::TcpListener, signal};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = Config::from_env();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        database_url = %cfg.database_url,
        loglevel = %cfg.loglevel,
        listen_addr = %cfg.listen_addr,
        listen_port = cfg.listen_port,
        db_connect_max_retries = cfg.db_connect_max_retries,
        db_connect_base_delay_ms = cfg.db_connect_base_delay_ms,
        "Configuration loaded"
    );

    // Backend unavailability after all retries is fatal: better to exit
    // non-zero than serve requests with no database behind them.
    let store = match UserStore::connect(&cfg).await {
        Ok(store) => store,
        Err(e) => {
            error!(error = %e, "Database unavailable after all connection attempts");
            return Err(e.into());
        }
    };

    let probe = store.probe().await;
    if probe.connected {
        info!(
            detail = probe.detail.as_deref().unwrap_or(""),
            "Database connection verified"
        );
    } else {
        warn!(
            error = probe.error.as_deref().unwrap_or("unknown"),
            "Database probe failed after connect"
        );
    }

    // Both are best-effort and idempotent; neither aborts startup.
    store.ensure_schema().await;
    store.seed(SEED_USERS).await;

    let state = RosterState::new(store.clone());
    let app = roster_router(state);

    let addr = SocketAddr::from((cfg.listen_addr, cfg.listen_port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    info!("Server has shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { /* ... */ },
        _ = terminate => { /* ... */ },
    }
}
