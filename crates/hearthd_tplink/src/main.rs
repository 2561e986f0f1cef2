use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use clap::Subcommand;
use hearthd_tplink::DeviceCoordinator;
use hearthd_tplink::SetupContext;
use hearthd_tplink::config::Config;
use hearthd_tplink::device::SnapshotDeviceClient;
use hearthd_tplink::plan::render_plan;
use hearthd_tplink::setup_entities;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Debug, Parser)]
#[command(name = "hearthd-tplink", about = "TP-Link entity planner")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the entities a device snapshot would produce
    Plan {
        /// JSON device snapshot
        snapshot: PathBuf,

        /// TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Plan { snapshot, config } => plan(snapshot, config).await,
    }
}

async fn plan(snapshot: PathBuf, config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = match &config_path {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(config.logging.targets())
        .init();

    if let Some(path) = &config_path {
        tracing::info!("Loaded config from: {}", path.display());
    }

    let client = SnapshotDeviceClient::from_file(&snapshot)?;
    let coordinator = DeviceCoordinator::connect(client)
        .await
        .with_context(|| format!("Failed to connect to device from {}", snapshot.display()))?;

    let ctx = SetupContext::new(Arc::new(coordinator))
        .with_extras(config.tplink.description_extras());
    let entities = setup_entities(&ctx).context("Failed to set up entities")?;

    print!("{}", render_plan(&entities));
    Ok(())
}
