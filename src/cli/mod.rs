pub mod client;
pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

pub use client::ApiClient;

#[derive(Parser)]
#[command(name = "pagesctl")]
#[command(about = "pagesctl - Command-line interface for the pages API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(
        long,
        global = true,
        env = "PAGES_API_URL",
        default_value = "http://localhost:3000",
        help = "Base URL of the pages API"
    )]
    pub server: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Development token management")]
    Token {
        #[command(subcommand)]
        cmd: commands::token::TokenCommands,
    },

    #[command(about = "Page operations")]
    Page {
        #[command(subcommand)]
        cmd: commands::page::PageCommands,
    },

    #[command(about = "Server status")]
    Server {
        #[command(subcommand)]
        cmd: commands::server::ServerCommands,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Token { cmd } => commands::token::handle(cmd, output_format),
        Commands::Page { cmd } => {
            let client = ApiClient::new(&cli.server)?;
            commands::page::handle(cmd, &client, output_format).await
        }
        Commands::Server { cmd } => {
            let client = ApiClient::new(&cli.server)?;
            commands::server::handle(cmd, &client, output_format).await
        }
    }
}
