//! Aura CLI: the main entry point.
//!
//! Commands:
//! - `serve`   Start the HTTP API
//! - `chat`    Route one message and print the decision
//! - `agent`   Invoke one agent directly
//! - `ingest`  Teach the Brain a document
//! - `doctor`  Diagnose configuration and backends

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "aura",
    about = "Aura AI multi-agent marketing backend",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Route one message through the Router
    Chat {
        #[arg(short, long)]
        message: String,

        #[arg(short, long, default_value = "default")]
        user: String,
    },

    /// Invoke one agent directly (content, analytics, ugc, static_ad, email, message, brain)
    Agent {
        name: String,

        #[arg(short, long)]
        message: String,

        #[arg(short, long, default_value = "default")]
        user: String,
    },

    /// Ingest a document into the Brain (pdf, doc, docx, txt, md)
    Ingest {
        file: PathBuf,

        #[arg(short, long, default_value = "default")]
        user: String,
    },

    /// Diagnose configuration and backends
    Doctor,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Chat { message, user } => commands::chat::run(&message, &user).await?,
        Commands::Agent {
            name,
            message,
            user,
        } => commands::agent::run(&name, &message, &user).await?,
        Commands::Ingest { file, user } => commands::ingest::run(&file, &user).await?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
