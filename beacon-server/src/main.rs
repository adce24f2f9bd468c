//! # Beacon Server
//!
//! Real-time incident dispatch and notification server.
//!
//! ## Overview
//!
//! - **Broadcast fan-out**: every ingested domain event reaches all
//!   connected dashboard viewers over `/ws`
//! - **Targeted delivery**: worker-produced acknowledgements reach exactly
//!   the reporting user's connection over `/notify`
//! - **Priority queue**: urgent incident jobs are processed ahead of queued
//!   resource requests
//!
//! ## Architecture
//!
//! The server is built on Axum; the queue and relay are in-process
//! primitives from `beacon-core`, shared by the socket handlers, the relay
//! pumps, and the worker pool.

use std::sync::Arc;

use anyhow::Context;
use beacon_server::{config::Config, pumps, routes, state::AppState, worker};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "beacon-server")]
#[command(about = "Real-time incident dispatch and notification server")]
struct Cli {
    /// Server port (overrides config)
    #[arg(short, long, env = "SERVER_PORT")]
    port: Option<u16>,

    /// Server host (overrides config)
    #[arg(long, env = "SERVER_HOST")]
    host: Option<String>,

    /// Number of notification workers (overrides config)
    #[arg(long, env = "WORKER_COUNT")]
    workers: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = Config::from_env().context("failed to load configuration")?;
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(workers) = cli.workers {
        config.worker_count = workers;
    }
    let config = Arc::new(config);

    info!(
        workers = config.worker_count,
        heartbeat_interval = ?config.heartbeat_interval,
        relay_capacity = config.relay_capacity,
        "pipeline configuration in effect"
    );

    let state = AppState::new(Arc::clone(&config));

    let mut tasks = pumps::spawn(&state);
    for worker_id in 0..config.worker_count {
        tasks.push(tokio::spawn(worker::run(
            worker_id,
            Arc::clone(&state.queue),
            Arc::clone(&state.relay),
            Arc::clone(&config),
            state.shutdown.clone(),
        )));
    }

    let router = routes::create_router(state.clone());
    let listener = tokio::net::TcpListener::bind(format!("{}:{}", config.host, config.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", config.host, config.port))?;

    info!(
        "Starting Beacon dispatch server on {}:{}",
        config.host, config.port
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(state.clone()))
        .await?;

    for task in tasks {
        let _ = task.await;
    }
    info!("shutdown complete");

    Ok(())
}

/// Resolve on ctrl-c: close the queue so workers drain and exit, and cancel
/// the token so pumps stop before open connections are drained. No send is
/// attempted after this fires.
async fn shutdown_signal(state: AppState) {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received; draining");
    state.queue.close();
    state.shutdown.cancel();
}
