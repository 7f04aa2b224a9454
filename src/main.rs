use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod dashboard;
mod dispatcher;
mod network;
mod prober;
mod status;

use config::AppConfig;
use dashboard::Remote;
use dispatcher::VolumeDispatcher;
use network::{BoardClient, HttpBoardClient, SharedBase};
use prober::Prober;
use status::{status_channel, StatusEvent};

#[derive(Parser)]
#[command(name = "board-remote", about = "Remote volume control for a networked board")]
struct Cli {
    /// TOML config file (defaults to the built-in config)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Board base URL, e.g. http://192.168.1.12
    #[arg(long)]
    base: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Open the control panel (default)
    Ui,
    /// Send one GET /ping and print the reply
    Ping,
    /// Set the volume once and print the reply
    Volume {
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        level: u8,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    info!("Starting board-remote");

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load_default()?,
    };

    let base = SharedBase::new(cli.base.unwrap_or(config.board.base_url.clone()));
    let client: Arc<dyn BoardClient> = Arc::new(HttpBoardClient::new());
    let (sink, mut events) = status_channel();
    let runtime = Handle::current();

    let prober = Prober::new(client.clone(), base.clone(), sink.clone());
    let dispatcher = VolumeDispatcher::new(
        client,
        base.clone(),
        sink,
        config.dispatcher.debounce(),
        runtime.clone(),
    );

    match cli.command.unwrap_or(Command::Ui) {
        Command::Ui => {
            let remote = Remote {
                base,
                prober,
                dispatcher,
                events,
                runtime,
            };
            // Blocks on the UI thread until the window closes
            match dashboard::run_dashboard(remote) {
                Ok(_) => info!("Dashboard closed cleanly"),
                Err(e) => eprintln!("Dashboard error: {:#?}", e),
            }
        }
        Command::Ping => {
            let resp = prober.probe().await?;
            println!("{}", resp.status_line());
        }
        Command::Volume { level } => {
            dispatcher.request_level(level);
            println!("{}", wait_for_volume(&mut events).await?);
        }
    }

    Ok(())
}

/// Waits for the dispatcher's outcome and returns its status line.
async fn wait_for_volume(events: &mut UnboundedReceiver<StatusEvent>) -> Result<String> {
    while let Some(event) = events.recv().await {
        match event {
            StatusEvent::VolumeUpdating(_) => info!("{}", event.text()),
            StatusEvent::VolumeSucceeded(_) => return Ok(event.text()),
            StatusEvent::VolumeFailed(msg) => bail!(msg),
            _ => {}
        }
    }
    bail!("status channel closed before the volume request finished")
}
