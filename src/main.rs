use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use cod_relay::cli::Args;
use cod_relay::config::API_KEY_ENV;
use cod_relay::{logging, router, AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::from_env_and_args(&args).context("Failed to load configuration")?;
    logging::init(config.verbose, args.log_format);

    if config.api_key.is_none() {
        tracing::warn!(
            "{} is not set; every relay request will fail until it is configured",
            API_KEY_ENV
        );
    }

    let bind = config.bind;
    let shutdown = CancellationToken::new();
    let state = AppState::new(config)
        .context("Failed to build upstream client")?
        .with_shutdown(shutdown.clone());

    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    tracing::info!(%bind, upstream = %state.config().api_endpoint, "relay listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .context("Server error")?;

    tracing::info!("relay stopped");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM, cancelling in-flight stream relays first.
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
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
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("shutdown requested");
    shutdown.cancel();
}
