use clap::Subcommand;

use crate::cli::{utils, ApiClient, OutputFormat};

#[derive(Subcommand)]
pub enum ServerCommands {
    #[command(about = "Check server health status from API /health endpoint")]
    Health,

    #[command(about = "Show server information from API root endpoint")]
    Info,
}

pub async fn handle(cmd: ServerCommands, client: &ApiClient, output_format: OutputFormat) -> anyhow::Result<()> {
    let (path, label) = match cmd {
        ServerCommands::Health => ("/health", "Server healthy"),
        ServerCommands::Info => ("/", "Server reachable"),
    };

    let reply = client.get(path).await?;
    if reply.status.is_success() {
        return utils::output_success(&output_format, label, reply.body.get("data").cloned());
    }

    let message = reply.message().unwrap_or("Server unavailable").to_string();
    utils::output_error(&output_format, &message, None)?;
    anyhow::bail!("server responded with {}", reply.status)
}
