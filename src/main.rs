mod backend;
mod clipboard;
mod commands;
mod config;
mod dispatcher;
mod events;
mod logging;
mod segment;
mod store;
mod tui;
mod ui;
mod visibility;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;

#[derive(Parser)]
#[command(name = "codechat")]
#[command(version)]
#[command(about = "Chat with a question-answering backend and inspect its sources", long_about = None)]
struct Cli {
    /// Backend base URL (overrides config and CODECHAT_ENDPOINT)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Path to the config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question and print the answer
    Ask {
        question: String,
        /// Also print the cited source documents
        #[arg(long)]
        sources: bool,
    },
    /// Show the effective configuration
    Config {
        /// Write it to the config file
        #[arg(long)]
        write: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::default_path()?,
    };
    let mut config = Config::load(Some(config_path.as_path()))?;
    config.apply_endpoint_override(cli.endpoint);

    match cli.command {
        None => {
            logging::init_file(&config.log)?;
            tui::run(config).await
        }
        Some(Commands::Ask { question, sources }) => {
            logging::init_stderr(&config.log)?;
            commands::ask(&config, &question, sources).await
        }
        Some(Commands::Config { write }) => commands::show_config(&config, &config_path, write),
    }
}
