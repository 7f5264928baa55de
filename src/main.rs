use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fleet_ota::api::ApiServer;
use fleet_ota::{Artifact, Config, Fleet};

/// Fleet - OTA firmware gateway for IoT node fleets
#[derive(Parser)]
#[command(name = "fleet", version, about)]
struct Cli {
    /// Config file (defaults to ~/.config/fleet-ota/config.toml)
    #[arg(short, long, env = "FLEET_CONFIG")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API over a freshly seeded fleet
    Serve {
        /// Port to listen on (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print the seeded fleet as JSON
    Show,
    /// Validate an artifact name and print its hardware tag and version
    Parse {
        /// Artifact name, e.g. moxa_34.swu
        artifact: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,fleet_ota=info",
        1 => "info,fleet_ota=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    tracing::debug!(?config, "loaded configuration");

    match cli.command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => {
            if let Some(port) = port {
                config.api_server.port = port;
            }
            let fleet = Fleet::seeded(config.devices.clone())?;
            tracing::info!(
                port = config.api_server.port,
                nodes = fleet.list_nodes().len(),
                "starting fleet gateway"
            );
            ApiServer::new(fleet, &config).run().await?;
            Ok(())
        }
        Command::Show => {
            let fleet = Fleet::seeded(config.devices)?;
            println!("{}", serde_json::to_string_pretty(&fleet.list_nodes())?);
            Ok(())
        }
        Command::Parse { artifact } => {
            let parsed = Artifact::parse(&artifact)?;
            println!("hardware tag: {}", parsed.hardware_tag);
            println!("version:      {}", parsed.version);
            Ok(())
        }
    }
}
