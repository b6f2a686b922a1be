//! ABC Retailers CLI - Storage provisioning and inspection.
//!
//! # Usage
//!
//! ```bash
//! # Create the tables, container, queue and file share
//! abc-cli provision
//!
//! # Show up to 10 pending order messages
//! abc-cli queue receive --count 10
//!
//! # List stored payment proofs
//! abc-cli proofs list
//! ```
//!
//! The storage account comes from the same environment as the back office
//! (`AZURE_STORAGE_CONNECTION_STRING`, `ADMIN_STORAGE_BACKEND`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "abc-cli")]
#[command(author, version, about = "ABC Retailers back office tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create any missing tables, blob container, queue and file share
    Provision,
    /// Inspect the order processing queue
    Queue {
        #[command(subcommand)]
        action: QueueAction,
    },
    /// Inspect stored payment proofs
    Proofs {
        #[command(subcommand)]
        action: ProofsAction,
    },
}

#[derive(Subcommand)]
enum QueueAction {
    /// Receive order messages and print them as JSON lines
    ///
    /// Messages are not deleted; they become visible again after the
    /// visibility timeout.
    Receive {
        /// Number of messages to receive (1-32)
        #[arg(short, long, default_value_t = 10)]
        count: u8,
    },
}

#[derive(Subcommand)]
enum ProofsAction {
    /// List the payment proof file names
    List,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let storage = commands::connect()?;
    match cli.command {
        Commands::Provision => commands::provision::run(storage.as_ref()).await?,
        Commands::Queue { action } => match action {
            QueueAction::Receive { count } => {
                commands::queue::receive(storage.as_ref(), count).await?;
            }
        },
        Commands::Proofs { action } => match action {
            ProofsAction::List => commands::proofs::list(storage.as_ref()).await?,
        },
    }
    Ok(())
}
