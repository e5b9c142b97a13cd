use std::net::TcpListener;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::info;

use faceserve::api::server;
use faceserve::config::Config;
use faceserve::model::artifact::{EnsureOutcome, HttpSource};
use faceserve::model::manager::ModelManager;

#[derive(Parser, Debug)]
#[command(version, about = "Serves birthday face predictions from a pretrained ONNX model")]
struct Cli {
    /// TOML file overriding the built-in deployment settings
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch and load the model, then serve HTTP
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Only make sure the model artifact is on disk
    Fetch,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));
    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Command::Fetch => {
            let manager = ModelManager::new(Arc::new(HttpSource::new()), config.model.clone());
            match manager.fetch().await.context("fetching model artifact")? {
                EnsureOutcome::Present => info!("Nothing to do"),
                EnsureOutcome::Downloaded { bytes } => info!("Fetched {bytes} bytes"),
            }
            Ok(())
        }
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }

            let state = faceserve::initialize(&config)
                .await
                .context("model startup failed, refusing to serve")?;

            let address = config.bind_address();
            let listener =
                TcpListener::bind(&address).with_context(|| format!("binding {address}"))?;
            info!("Listening on http://{address}");

            server::run(listener, state, config.app.static_dir.clone())?.await?;
            Ok(())
        }
    }
}
