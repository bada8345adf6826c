use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{AuthCommand, ItemCommand, ListCommand, StatsCommand};
use feira::config::Config;

#[derive(Parser)]
#[command(name = "feira")]
#[command(version)]
#[command(about = "Shared shopping lists from the terminal", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in, sign up, and manage the cached session
    Auth(AuthCommand),

    /// Manage shopping lists and sharing
    List(ListCommand),

    /// Manage the items of a list
    Item(ItemCommand),

    /// Show spend statistics for a list
    Stats(StatsCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "feira=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = Config::load(cli.config)?;

    match cli.command {
        Some(Commands::Auth(cmd)) => cmd.run(&config).await?,
        Some(Commands::List(cmd)) => cmd.run(&config).await?,
        Some(Commands::Item(cmd)) => cmd.run(&config).await?,
        Some(Commands::Stats(cmd)) => cmd.run(&config).await?,
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}
