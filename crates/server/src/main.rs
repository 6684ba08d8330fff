// crates/server/src/main.rs
//! Aurora server binary.
//!
//! Starts the Axum HTTP server and a periodic retention sweep. Jobs live
//! in memory only; the sweep bounds growth by evicting old terminal jobs
//! and force-failing jobs that overrun the running-time budget.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use aurora_jobs::{sweep, JobTracker, RetentionPolicy};
use aurora_server::{create_app, AppState};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Default port for the server.
const DEFAULT_PORT: u16 = 47810;

#[derive(Debug, Parser)]
#[command(name = "aurora", version, about = "Aurora exploration job tracker")]
struct Args {
    /// Port to listen on. Falls back to AURORA_PORT / PORT, then the default.
    #[arg(long)]
    port: Option<u16>,

    /// Seconds between retention sweeps.
    #[arg(long, default_value_t = 30)]
    sweep_interval_secs: u64,

    /// Terminal jobs older than this many seconds are evicted.
    #[arg(long, default_value_t = 3600)]
    max_terminal_age_secs: i64,

    /// Jobs still running after this many seconds are force-failed.
    #[arg(long, default_value_t = 600)]
    max_running_secs: i64,
}

/// Get the server port from the CLI flag, environment, or default.
fn resolve_port(flag: Option<u16>) -> u16 {
    flag.or_else(|| {
        std::env::var("AURORA_PORT")
            .ok()
            .or_else(|| std::env::var("PORT").ok())
            .and_then(|p| p.parse().ok())
    })
    .unwrap_or(DEFAULT_PORT)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .compact()
        .init();

    let tracker = Arc::new(JobTracker::new());
    let state = AppState::new(Arc::clone(&tracker));
    let app = create_app(state);

    // Retention sweep: evicts old terminal jobs, times out stuck ones.
    let policy = RetentionPolicy {
        max_terminal_age: chrono::Duration::seconds(args.max_terminal_age_secs),
        max_running: chrono::Duration::seconds(args.max_running_secs),
    };
    let store = tracker.store();
    let sweep_interval = std::time::Duration::from_secs(args.sweep_interval_secs.max(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            sweep(&store, &policy, chrono::Utc::now());
        }
    });

    let port = resolve_port(args.port);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, version = env!("CARGO_PKG_VERSION"), "aurora server listening");

    axum::serve(listener, app).await?;
    Ok(())
}
