//! PaperClass Server
//!
//! Serves `POST /predict` for the DeBERTa + LoRA abstract classifier.

use anyhow::Result;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusHandle;
use paperclass_server::{create_router, load_model, AppState, Cli, Readiness, ServerConfig};
use tokio::signal;
use tokio::sync::oneshot;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = ServerConfig::load(&cli)?;

    init_tracing(cli.verbose, config.log_json);

    info!("Starting PaperClass inference service");
    info!("Base model: {}", config.model.base_model);
    info!("Adapter: {}", config.model.resolved_adapter_path().display());
    info!("Device: {}", config.model.device);

    let metrics_handle = init_metrics()?;

    let readiness = Readiness::new();
    let state = AppState::new(readiness.clone(), Some(metrics_handle));
    let app = create_router(state);

    let addr = config.listen_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);

    // Load in the background so health checks answer while weights download
    let (failed_tx, failed_rx) = oneshot::channel::<String>();
    let exit_on_load_failure = config.exit_on_load_failure;
    tokio::spawn(async move {
        if let Err(e) = load_model(readiness, config.model).await {
            if exit_on_load_failure {
                let _ = failed_tx.send(e.to_string());
            } else {
                warn!("Continuing without a model; /predict will answer 503");
            }
        }
    });

    let (exit_tx, exit_rx) = oneshot::channel::<String>();
    let shutdown = async move {
        tokio::select! {
            _ = shutdown_signal() => warn!("Shutdown signal received, stopping server..."),
            Ok(reason) = failed_rx => {
                error!("Model failed to load, shutting down");
                let _ = exit_tx.send(reason);
            }
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    if let Ok(reason) = exit_rx.await {
        anyhow::bail!("model failed to load: {}", reason);
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Listen for shutdown signals (SIGTERM, SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
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
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool, json: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("paperclass_server=debug,paperclass_model=debug,tower_http=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("paperclass_server=info,paperclass_model=info,tower_http=info")
        })
    };

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Initialize metrics exporter and return handle for rendering
fn init_metrics() -> Result<PrometheusHandle> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    metrics::describe_counter!(
        "paperclass_requests_total",
        "Total number of classification requests received"
    );
    metrics::describe_counter!(
        "paperclass_predictions_total",
        "Successful classifications by predicted label"
    );
    metrics::describe_counter!(
        "paperclass_request_errors_total",
        "Failed requests by outcome (rejected or error)"
    );
    metrics::describe_histogram!(
        "paperclass_inference_latency_us",
        metrics::Unit::Microseconds,
        "Tokenization plus forward pass latency in microseconds"
    );
    metrics::describe_gauge!("paperclass_model_ready", "1 when the model is loaded");

    info!("Metrics exporter initialized");
    Ok(handle)
}
