//! Scribe daemon — asynchronous audio-transcription job system.
//!
//! Entry point that wires all crates together: backend construction,
//! worker pool, retention scheduler, and signal-driven shutdown.

use std::sync::Arc;

use tokio::sync::watch;
use tracing_subscriber::{fmt, EnvFilter};

use scribe_core::config::AppConfig;
use scribe_core::error::AppError;
use scribe_queue::QueueBackend;
use scribe_worker::{CommandTranscriber, CronScheduler, Transcriber};

#[tokio::main]
async fn main() {
    let env = std::env::var("SCRIBE_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Daemon error: {e}");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Main daemon run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Scribe v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Spool directory ──────────────────────────────────
    tokio::fs::create_dir_all(&config.storage.spool_dir)
        .await
        .map_err(|e| {
            AppError::internal(format!(
                "Failed to create spool dir '{}': {e}",
                config.storage.spool_dir
            ))
        })?;

    // ── Step 2: Queue backend ────────────────────────────────────
    tracing::info!(backend = %config.queue.backend, "Initializing queue backend...");
    let backend = QueueBackend::new(&config.queue, &config.realtime).await?;
    tracing::info!("Queue backend initialized");

    // ── Step 3: Shutdown channel ─────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Step 4: Worker pool ──────────────────────────────────────
    let worker_handles = if config.worker.enabled {
        tracing::info!(
            workers = config.worker.workers,
            engine = %config.worker.engine_command,
            "Starting worker pool..."
        );

        let transcriber: Arc<dyn Transcriber> =
            Arc::new(CommandTranscriber::new(&config.worker.engine_command));

        let handles = scribe_worker::runner::spawn_workers(
            Arc::clone(backend.store()),
            Arc::clone(backend.queue()),
            transcriber,
            &config.worker,
            shutdown_rx.clone(),
        );

        tracing::info!("Worker pool started");
        handles
    } else {
        tracing::info!("Worker pool disabled");
        Vec::new()
    };

    // ── Step 5: Retention scheduler ──────────────────────────────
    let scheduler = if config.retention.enabled {
        let mut scheduler =
            CronScheduler::new(Arc::clone(backend.store()), config.retention.clone()).await?;
        scheduler.register_default_tasks().await?;
        scheduler.start().await?;
        Some(scheduler)
    } else {
        tracing::info!("Retention sweep disabled");
        None
    };

    tracing::info!("Scribe daemon running");

    // ── Step 6: Graceful shutdown ────────────────────────────────
    shutdown_signal().await;
    tracing::info!("Shutdown signal received, starting graceful shutdown...");
    let _ = shutdown_tx.send(true);

    if let Some(mut scheduler) = scheduler {
        scheduler.shutdown().await?;
    }

    for handle in worker_handles {
        let _ = tokio::time::timeout(std::time::Duration::from_secs(30), handle).await;
    }

    tracing::info!("Scribe daemon shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
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
                tracing::error!("Failed to install SIGTERM handler: {e}");
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
