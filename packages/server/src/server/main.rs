use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use server_core::kernel::jobs;
use server_core::kernel::AppState;
use server_core::server::app::build_app;
use server_core::Config;
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,server_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("failed to load configuration")?;
    tracing::info!(port = config.port, "configuration loaded");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.storage_url)
        .await
        .context("failed to connect to storage database")?;

    let queue_pool = if config.queue_backend == config.storage_url {
        pool.clone()
    } else {
        PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.queue_backend)
            .await
            .context("failed to connect to queue database")?
    };

    sqlx::migrate!("./migrations")
        .run(&queue_pool)
        .await
        .context("failed to run migrations")?;

    let state = AppState::from_config(pool, queue_pool, &config)?;
    let job_queue = state.jobs.clone();
    let worker_concurrency = config.worker_concurrency;

    let shutdown = CancellationToken::new();
    let worker_shutdown = shutdown.clone();
    let worker_state = state.clone();
    let worker_handle = tokio::spawn(async move {
        jobs::run_workers(
            worker_state.clone(),
            job_queue,
            worker_concurrency,
            worker_state.job_max_attempts,
            Duration::from_secs(worker_state.job_wallclock_seconds),
            worker_shutdown,
            Duration::from_secs(30),
        )
        .await;
    });

    let app = build_app(state);
    let addr: SocketAddr = ([0, 0, 0, 0], config.port).into();
    let listener = tokio::net::TcpListener::bind(addr).await.context("failed to bind listener")?;
    tracing::info!(%addr, "server listening");

    let server = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>());
    tokio::select! {
        result = server => result.context("server error")?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
        }
    }

    shutdown.cancel();
    let _ = worker_handle.await;
    Ok(())
}
