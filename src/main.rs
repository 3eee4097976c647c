use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use gaswatch::config::MonitorConfig;
use gaswatch::source::connect_tcp;
use gaswatch::{monitor, server};

#[derive(Parser, Debug)]
#[command(name = "gaswatch")]
#[command(about = "Gas-sensor monitoring daemon with a JSON polling API")]
struct Args {
    /// Device address (host:port of the TCP serial bridge)
    #[arg(short, long)]
    device: String,

    /// Address for the JSON API to listen on
    #[arg(short, long, default_value = "0.0.0.0:5000")]
    listen: String,

    /// Optional config file (layered with GASWATCH_* environment variables)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let config = MonitorConfig::load(args.config.as_deref())
        .context("failed to load configuration")?;

    let device = connect_tcp(&args.device, config.settle_delay, config.read_timeout)
        .await
        .with_context(|| format!("failed to connect to device at {}", args.device))?;

    let (handle, mut task) = monitor::spawn(device, config);
    let server = server::serve(&args.listen, handle.clone());

    tokio::select! {
        result = &mut task => {
            // The acquisition task only exits on shutdown or an
            // unrecoverable device failure; surface the latter.
            match result.context("acquisition task panicked")? {
                Ok(()) => info!("acquisition stopped"),
                Err(e) => {
                    error!(error = %e, "device stream failed");
                    return Err(e.into());
                }
            }
        }
        result = server => {
            result.context("query endpoint failed")?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("interrupt received, shutting down");
            handle.shutdown();
            // Let the acquisition task finish its current cycle before the
            // process exits.
            match task.await.context("acquisition task panicked")? {
                Ok(()) => info!("acquisition stopped"),
                Err(e) => error!(error = %e, "device stream failed during shutdown"),
            }
        }
    }

    Ok(())
}
