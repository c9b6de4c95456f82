//! gemini-relay daemon - streaming chat proxy for the Gemini API

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use gemini_relay::config::Config;
use gemini_relay::error::Result;
use gemini_relay::provider::GeminiClient;
use gemini_relay::proxy::RelayServer;

/// gemini-relay - streaming chat proxy for the Gemini API
#[derive(Parser)]
#[command(name = "gemini-relay")]
#[command(about = "A streaming chat proxy for the Gemini API")]
#[command(version)]
pub struct Cli {
    /// Path to config file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the relay server (default command)
    #[command(name = "serve")]
    Serve,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    init_logging();

    let cli = Cli::parse();

    match cli.command {
        None | Some(Command::Serve) => serve(cli.config).await,
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,gemini_relay=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn serve(config_path: Option<PathBuf>) -> Result<()> {
    tracing::info!("Starting gemini-relay");

    let config = Config::load(config_path.as_deref())?;
    tracing::debug!("Config loaded: {:?}", config);

    if std::env::var(&config.provider.api_key_env).is_err() {
        tracing::warn!(
            "API key env var '{}' is not set; chat requests will fail until it is",
            config.provider.api_key_env
        );
    }

    let client = GeminiClient::new(&config.provider)?;
    let server = RelayServer::new(config, Arc::new(client));

    server.serve().await?;

    tracing::info!("gemini-relay stopped");
    Ok(())
}
