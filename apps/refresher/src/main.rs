//! # Tally Refresher
//!
//! Runs a refresh pass every `interval_secs` until Ctrl-C / SIGTERM.
//!
//! ## Usage
//! ```bash
//! refresher                       # loop with refresher.toml / env settings
//! refresher --once                # one pass, then exit
//! refresher --config ./dev.toml   # explicit config file
//! ```

use std::path::PathBuf;

use tally_core::Reconciler;
use tally_db::{Database, DbConfig};
use tally_refresher::{run_once, RefresherConfig};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let mut config_path: Option<PathBuf> = None;
    let mut once = false;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => config_path = args.next().map(PathBuf::from),
            "--once" => once = true,
            "--help" | "-h" => {
                println!("Usage: refresher [--once] [--config <PATH>]");
                return Ok(());
            }
            other => warn!(arg = %other, "Ignoring unknown argument"),
        }
    }

    let config = RefresherConfig::load(config_path)?;
    info!(
        database = %config.database_path.display(),
        interval_secs = config.interval_secs,
        auto_close = config.auto_close,
        "Starting refresher"
    );

    let db = Database::new(
        DbConfig::new(&config.database_path).max_connections(config.max_connections),
    )
    .await?;
    let reconciler = Reconciler::new(db.clone());

    if once {
        run_once(&db, &reconciler, config.auto_close).await?;
        db.close().await;
        return Ok(());
    }

    let mut ticker = tokio::time::interval(config.interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => {
                if let Err(e) = run_once(&db, &reconciler, config.auto_close).await {
                    error!(error = %e, "Refresh pass failed");
                }
            }
        }
    }

    db.close().await;
    info!("Refresher stopped");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tally=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
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
