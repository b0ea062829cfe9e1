use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use forward_proxy::lifecycle::{signals, startup};
use forward_proxy::observability::{logging, metrics};
use forward_proxy::{ProxyServer, Shutdown};

/// Caching forward HTTP proxy with CONNECT tunneling.
#[derive(Parser)]
#[command(name = "forward-proxy", version)]
struct Cli {
    /// Port to listen on (default 8080).
    port: Option<String>,

    /// Optional TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = startup::load(cli.config.as_deref());
    let level = loaded
        .as_ref()
        .map(|c| c.observability.log_level)
        .unwrap_or_default();
    if let Err(e) = logging::init(level) {
        eprintln!("failed to initialize logging: {}", e);
    }

    let mut config = match loaded {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load configuration");
            return ExitCode::from(1);
        }
    };
    startup::apply_port_arg(&mut config, cli.port.as_deref());

    tracing::info!(
        bind_address = %config.listener.bind_address(),
        cache_enabled = config.cache.enabled,
        "forward-proxy v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let server = ProxyServer::new(config);
    let listener = match server.bind().await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start proxy server");
            return ExitCode::from(1);
        }
    };

    let shutdown = Shutdown::new();
    let server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));
    tracing::info!("Press Ctrl+C to shutdown");

    match signals::wait_for_shutdown_signal().await {
        Ok(signal) => tracing::info!(signal, "Shutdown signal received"),
        Err(e) => tracing::error!(error = %e, "Failed to listen for shutdown signal"),
    }

    let notified = shutdown.trigger();
    tracing::debug!(notified, "Shutdown broadcast");
    if let Err(e) = server_task.await {
        tracing::error!(error = %e, "Server task failed");
    }

    tracing::info!("Shutdown complete");
    ExitCode::SUCCESS
}
