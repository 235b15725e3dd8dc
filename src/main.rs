//! Nexus worker - consumes queued analysis jobs
//!
//! Runs only in distributed mode. In inline mode the process that accepts
//! jobs also runs them, so no separate worker is needed.

use tokio::signal;

use nexus::{AppContext, BUILTIN_PLUGINS, Config, init_tracing};
use nexus_core::config::ExecutionMode;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = dotenvy::dotenv() {
        // Only warn if it's not a "file not found" error
        if !e.not_found() {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    let config = Config::load().map_err(|e| {
        std::io::Error::other(format!(
            "Failed to load configuration. Check DATABASE_URL and NEXUS__* env vars: {}",
            e
        ))
    })?;

    // Initialize tracing (after config is loaded so we can use logging config)
    init_tracing(&config.logging)?;

    if config.execution.mode != ExecutionMode::Distributed {
        return Err(std::io::Error::other(format!(
            "nexus-worker requires execution.mode = distributed (configured: {})",
            config.execution.mode
        ))
        .into());
    }

    tracing::info!(
        queue = %config.queue.url,
        max_concurrent_jobs = config.execution.max_concurrent_jobs,
        "Starting Nexus worker..."
    );

    let context = AppContext::init(config, BUILTIN_PLUGINS).await.map_err(|e| {
        std::io::Error::other(format!("Failed to create application: {}", e))
    })?;
    context.start_workers().await?;

    shutdown_signal().await;
    context.shutdown().await;

    tracing::info!("Worker shutdown complete");
    Ok(())
}

/// Resolve once Ctrl+C or SIGTERM is received
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        },
    }
}
