//! `growthosd` - daemon binary for the GrowthOS funnel simulator.
//!
//! Loads the layered configuration, sets up logging, builds the scenario
//! engine and serves observers over `WebSocket` until Ctrl+C.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tokio::sync::broadcast;
use tracing::info;

use growthos_config::Config;
use growthos_engine::{CommandGateway, FunnelContext, ScenarioCatalog};
use growthos_gateway::WsServer;
use growthos_telemetry::{LogConfig, LogFormat, setup_logging};

/// GrowthOS daemon - real-time funnel simulation server.
#[derive(Parser)]
#[command(name = "growthosd")]
#[command(
    author,
    version,
    about = "GrowthOS daemon - real-time funnel simulation server"
)]
struct Args {
    /// Config file (defaults to `~/.growthos/config.toml` when present).
    #[arg(short, long, env = "GROWTHOS_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listen address.
    #[arg(long)]
    bind: Option<String>,

    /// Override the scenario catalog file.
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Override the log format (pretty, compact, json, full).
    #[arg(long)]
    log_format: Option<LogFormat>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn apply(&self, config: &mut Config) -> Result<()> {
        if let Some(bind) = &self.bind {
            config.server.bind.clone_from(bind);
        }
        if let Some(catalog) = &self.catalog {
            config.simulation.catalog_path = Some(catalog.clone());
        }
        if let Some(format) = self.log_format {
            config.logging.format = format.to_string();
        }
        if self.verbose {
            config.logging.level = "debug".to_owned();
        }
        growthos_config::validate(config).context("invalid command-line override")
    }
}

fn load_catalog(config: &Config) -> Result<ScenarioCatalog> {
    match &config.simulation.catalog_path {
        Some(path) => ScenarioCatalog::load(path)
            .with_context(|| format!("loading scenario catalog {}", path.display())),
        None => ScenarioCatalog::builtin().context("loading built-in scenario catalog"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = growthos_config::load(args.config.as_deref())?;
    args.apply(&mut config)?;

    let log_config = LogConfig::from_section(&config.logging)?;
    if let Err(e) = setup_logging(&log_config) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let catalog = load_catalog(&config)?;
    info!(modes = catalog.modes().count(), "Scenario catalog loaded");

    let gateway = CommandGateway::new(FunnelContext::from_config(&config, catalog));
    let server = WsServer::bind(&config.server, gateway)
        .await
        .with_context(|| format!("binding {}", config.server.bind))?;
    let addr = server.local_addr()?;

    println!(
        "{}",
        format!("growthosd listening on ws://{addr}{}", config.server.ws_path)
            .cyan()
            .bold()
    );

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let mut server_handle = tokio::spawn(server.run(shutdown_rx));

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            println!("\n{}", "Shutting down daemon...".yellow());
            let _ = shutdown_tx.send(());
            server_handle.await??;
        },
        result = &mut server_handle => result??,
    }

    println!("{}", "Daemon stopped".green().bold());
    Ok(())
}
