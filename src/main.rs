//! Tianditu tile reverse proxy
//!
//! Sits between browser map clients and the Tianditu tile servers
//! (`t0`..`t7`), injecting the access token and normalizing tile headers.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ───────────────▶ net::listener ──▶ http::server ──▶ routing::Router
//!                                                              │
//!                                  local endpoint ◀────────────┤
//!                                  (health::handlers)          │ upstream route
//!                                                              ▼
//!                                                     routing::TargetResolver
//!                                                     (+ load_balancer for aliases)
//!                                                              │
//!     Client Response                                          ▼
//!     ◀─────────────── http::response ◀──────────────── http::forward ◀──── t{N}.tianditu.gov.cn
//! ```

use std::path::PathBuf;

use clap::Parser;

use tile_proxy::config::loader;
use tile_proxy::lifecycle::{signals, Shutdown};
use tile_proxy::observability::{logging, metrics};
use tile_proxy::{net, HttpServer, ProxyConfig};

#[derive(Parser, Debug)]
#[command(name = "tile-proxy", version, about = "Tianditu tile reverse proxy")]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listening port (overrides the config file and PORT)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => loader::load_config(path)?,
        None => ProxyConfig::default(),
    };
    loader::apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
    if let Some(port) = args.port {
        loader::set_port(&mut config, port);
    }
    let config = loader::finalize(config)?;

    logging::init_logging(&config.observability);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "tile-proxy starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.domain,
        hosts = config.upstream.host_count,
        alias_host_policy = config.upstream.alias_host_policy.as_str(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.upstream.uses_dev_token() {
        tracing::warn!(
            "Using the development access token; set {} for production",
            loader::ENV_TOKEN
        );
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = net::bind(&config.listener).await?;

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config)?;
    let receiver = shutdown.subscribe();
    signals::spawn_signal_handler(shutdown);

    server.run(listener, receiver).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
