//! Actor node entry point
//!
//! Starts one actor system from configuration, creates a journaled counter at
//! `/counter` and, when remoting is configured, serves the command endpoint
//! until Ctrl+C.

mod counter;

use actor_config::RuntimeConfig;
use actor_runtime::{ActorSystem, EventSourcedBehavior, RemoteServer, Supervisor};
use anyhow::{Context as _, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::counter::Counter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured system name
    #[arg(long)]
    name: Option<String>,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Emit JSON log lines
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = RuntimeConfig::load(args.config.as_deref())?;
    if let Some(name) = args.name {
        config.system.name = name;
        config.validate()?;
    }

    if args.print_config {
        println!("{}", config.to_toml()?);
        return Ok(());
    }

    init_tracing(&config.logging.level, args.json_logs);

    info!("Starting actor node");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let system = ActorSystem::from_config(&config).context("Failed to create actor system")?;

    let counter = system
        .make(
            "counter",
            Supervisor::exponential(3, Duration::from_millis(10), 2.0, Duration::from_secs(1)),
            EventSourcedBehavior::new(Counter::new("counter")),
            0,
        )
        .await
        .context("Failed to create counter actor")?;
    info!(actor_path = %counter.path(), "Counter ready");

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
        }
        info!("Shutdown signal received");
    };

    match RemoteServer::new(system.clone()) {
        Ok(server) => server.serve(shutdown_signal).await?,
        Err(_) => {
            info!("Remoting disabled; running local-only until Ctrl+C");
            shutdown_signal.await;
        }
    }

    let discarded = system.shutdown();
    let stats = system.metrics().snapshot();
    info!(
        discarded,
        messages_processed = stats.messages_processed,
        remote_calls = stats.remote_calls,
        "Actor node stopped"
    );
    Ok(())
}

fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("actor_runtime={level},actor_node={level},warn").into());

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
