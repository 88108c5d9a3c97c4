mod config;
mod error;

use std::path::PathBuf;

use bridge::{Category, Dispatcher, Registry, ToolEntry};
use clap::{Parser, Subcommand};
use crm::{CrmClient, DEFAULT_TIMEOUT};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use config::Config;
use error::Result;

#[derive(Parser)]
#[command(name = "crm-bridge")]
#[command(about = "MCP server exposing the CRM API as tools", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./crm-bridge.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve tools over stdio (default)
    Serve,
    /// Print the tool catalog as JSON
    Tools {
        /// Only list tools in this category (e.g. contacts, smart-links)
        #[arg(long)]
        category: Option<Category>,
    },
}

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Logs go to stderr; stdout carries the protocol.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve) | None => cmd_serve(cli.config).await,
        Some(Commands::Tools { category }) => cmd_tools(category),
    }
}

async fn cmd_serve(config_path: Option<PathBuf>) -> Result<()> {
    let config = Config::load(config_path.as_deref())?;
    info!(
        base_url = config.credentials.base_url(),
        identity = config.credentials.identity(),
        "configuration loaded"
    );

    let client = CrmClient::connect(&config.credentials, DEFAULT_TIMEOUT)?;
    let dispatcher = Dispatcher::new(client);
    info!(tools = dispatcher.registry().len(), "tool registry built");

    mcp::serve_stdio(dispatcher).await?;
    Ok(())
}

fn cmd_tools(category: Option<Category>) -> Result<()> {
    let registry = Registry::new();
    let tools: Vec<_> = match category {
        Some(category) => registry.in_category(category).map(ToolEntry::descriptor).collect(),
        None => registry.descriptors(),
    };
    println!("{}", serde_json::to_string_pretty(&tools)?);
    Ok(())
}
