use clap::Subcommand;
use reqwest::StatusCode;
use serde_json::json;

use crate::cli::{utils, ApiClient, OutputFormat};

#[derive(Subcommand)]
pub enum PageCommands {
    #[command(about = "Create a page owned by the token's user")]
    Create {
        #[arg(long, help = "Page title")]
        title: String,
        #[arg(long, help = "Page content")]
        content: String,
        #[arg(long, env = "PAGES_TOKEN", hide_env_values = true, help = "Session token")]
        token: Option<String>,
    },
}

pub async fn handle(cmd: PageCommands, client: &ApiClient, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        PageCommands::Create { title, content, token } => {
            let body = json!({ "title": title, "content": content });
            let reply = client.post_json("/api/pages", &body, token.as_deref()).await?;

            if reply.status == StatusCode::CREATED {
                let message = reply.message().unwrap_or("Page created").to_string();
                return utils::output_success(&output_format, &message, reply.body.get("data").cloned());
            }

            let message = reply.message().unwrap_or("Request failed").to_string();
            let detail = reply.body.get("detail").and_then(|d| d.as_str());
            utils::output_error(&output_format, &message, detail)?;
            anyhow::bail!("server responded with {}", reply.status)
        }
    }
}
