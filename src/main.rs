//! TCP stream load balancer.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────┐
//!                    │                 TCP BALANCER                  │
//!                    │                                               │
//!   Client session   │  ┌─────────┐   ┌─────────┐   ┌────────────┐  │
//!   ─────────────────┼─▶│  proxy  │──▶│  proxy  │──▶│  balancer  │  │
//!                    │  │ server  │   │ session │   │ selector   │  │
//!                    │  └─────────┘   └────┬────┘   └─────┬──────┘  │
//!                    │                     │              │         │
//!                    │                     ▼              ▼         │
//!   Relayed bytes    │              ┌────────────┐ ┌────────────┐   │      Backend
//!   ◀────────────────┼──────────────│   relay    │ │  registry  │◀──┼────▶ pool
//!                    │              │   pumps    │ │ health/infl│   │
//!                    │              └────────────┘ └────────────┘   │
//!                    └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tcp_balancer::balancer::{Registry, Selector};
use tcp_balancer::config::loader::load_config;
use tcp_balancer::proxy::Server;

#[derive(Parser)]
#[command(name = "tcp-balancer")]
#[command(about = "Fault-tolerant TCP load balancer", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "balancer.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tcp_balancer=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("tcp-balancer v0.1.0 starting");

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        policy = %config.policy,
        quarantine_secs = config.quarantine_secs,
        backends = config.backends.len(),
        "Configuration loaded"
    );
    for backend in &config.backends {
        tracing::info!(host = %backend.host, port = backend.port, "Backend configured");
    }

    let registry = Arc::new(Registry::new(&config.backends, config.quarantine()));
    let selector = Arc::new(Selector::new(Arc::clone(&registry), config.policy));

    let server = Server::bind(&config.listener, registry, selector).await?;
    server.run().await;

    Ok(())
}
