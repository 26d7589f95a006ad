use chrono::{TimeZone, Utc};
use clap::Subcommand;
use serde_json::json;

use crate::auth::{generate_jwt, Claims, UserId};
use crate::cli::{utils, OutputFormat};
use crate::config;

#[derive(Subcommand)]
pub enum TokenCommands {
    #[command(about = "Issue a signed session token for a user (uses JWT_SECRET)")]
    Issue {
        #[arg(help = "User id to embed as the token subject")]
        user_id: String,
        #[arg(long, help = "Lifetime in hours (defaults to SECURITY_JWT_EXPIRY_HOURS)")]
        hours: Option<u64>,
    },
}

pub fn handle(cmd: TokenCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        TokenCommands::Issue { user_id, hours } => {
            let user_id = UserId::parse(&user_id)
                .ok_or_else(|| anyhow::anyhow!("user id must be non-empty printable text"))?;
            let security = &config::config().security;
            let claims = Claims::new(user_id.as_str(), hours.unwrap_or(security.jwt_expiry_hours))?;
            let token = generate_jwt(&claims, &security.jwt_secret)?;

            match output_format {
                OutputFormat::Json => {
                    let expires_at = Utc.timestamp_opt(claims.exp, 0).single();
                    utils::output_success(
                        &output_format,
                        "Token issued",
                        Some(json!({
                            "token": token,
                            "user_id": user_id,
                            "expires_at": expires_at,
                        })),
                    )
                }
                // Bare token so it can be captured with $(pagesctl token issue ...)
                OutputFormat::Text => {
                    println!("{}", token);
                    Ok(())
                }
            }
        }
    }
}
