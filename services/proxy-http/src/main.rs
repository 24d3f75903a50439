use anyhow::{Context, Result};
use http_shaping_proxy::config::ProxyConfig;
use http_shaping_proxy::server::ProxyServer;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ProxyConfig::from_env().context("Failed to load configuration")?;
    init_tracing(&config.log_level);

    let shaping = &config.shaping;
    info!(
        name = %shaping.name,
        upstream = %config.upstream_url,
        interval_secs = shaping.loop_interval_seconds,
        in_limit = %shaping.in_traffic_limit,
        out_limit = %shaping.out_traffic_limit,
        enforce = shaping.enforce_limits,
        "http-shaping-proxy starting"
    );

    config
        .validate()
        .inspect_err(|e| error!(error = %e, "Invalid proxy configuration"))?;

    ProxyServer::new(config)
        .context("Failed to create proxy server")?
        .run_until(shutdown_signal())
        .await
        .inspect_err(|e| error!(error = %e, "Proxy server failed"))?;

    info!("http-shaping-proxy stopped");
    Ok(())
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_line_number(true)
        .compact()
        .init();
}

/// Resolves on Ctrl+C or SIGTERM. If a handler cannot be installed the
/// process keeps serving and only the other signal stops it.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Ctrl+C handler unavailable");
            std::future::pending::<()>().await;
        }
        "SIGINT"
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
        "SIGTERM"
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<&str>();

    let received = tokio::select! {
        name = ctrl_c => name,
        name = terminate => name,
    };

    info!(signal = received, "Shutdown signal received");
}
