//! Locale gateway
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────┐
//!                     │                  LOCALE GATEWAY                  │
//!   Client Request    │  ┌──────────┐   ┌──────────┐   ┌──────────────┐  │
//!   ──────────────────┼─▶│middleware│──▶│ routing  │──▶│    locale    │  │
//!                     │  │ req id,  │   │exclusions│   │   decision   │  │
//!                     │  │ trace,   │   └────┬─────┘   └──────┬───────┘  │
//!                     │  │ limits   │        │ bypass         │          │
//!                     │  └──────────┘        ▼                ▼          │
//!                     │              ┌──────────────────────────────┐    │
//!   Client Response   │              │ pass / rewrite ─▶ upstream   │────┼──▶ Site
//!   ◀─────────────────┼──────────────│ redirect ─▶ 307 Location     │    │   Renderer
//!                     │              └──────────────────────────────┘    │
//!                     └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use locale_gateway::config::{load_config, validate_config, ConfigError, GatewayConfig};
use locale_gateway::lifecycle::startup;
use locale_gateway::observability::logging;

#[derive(Parser)]
#[command(name = "locale-gateway")]
#[command(about = "Locale-routing gateway in front of the site renderer", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Validate the configuration and exit.
    #[arg(long)]
    check: bool,
}

fn load(cli: &Cli) -> Result<GatewayConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(bind) = &cli.bind {
        config.listener.bind_address = bind.clone();
        validate_config(&config).map_err(ConfigError::Validation)?;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load(&cli)?;

    if cli.check {
        println!("configuration OK");
        return Ok(());
    }

    logging::init_logging(&config.observability)?;

    tracing::info!("locale-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.url,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    startup::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
