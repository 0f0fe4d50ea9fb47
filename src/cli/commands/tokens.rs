//! Access token command handlers

use crate::config::Config;
use crate::services::RegistrationBackend;

use super::{open_service, parse_user_id};

pub async fn cmd_issue_token(config: &Config, user_id: &str) -> anyhow::Result<()> {
    let user_id = parse_user_id(user_id)?;
    let service = open_service(config).await?;

    let token = service.issue_access_token(user_id).await?;
    println!("{token}");
    Ok(())
}

pub async fn cmd_verify_token(config: &Config, token: &str) -> anyhow::Result<()> {
    let service = open_service(config).await?;

    match service.verify_access_token(token).await? {
        Some(user_id) => println!("✓ Valid token for user {user_id}"),
        None => println!("✗ Unknown or expired token"),
    }
    Ok(())
}

pub async fn cmd_purge_tokens(config: &Config, user_id: &str) -> anyhow::Result<()> {
    let user_id = parse_user_id(user_id)?;
    let service = open_service(config).await?;

    let purged = service.tokens().purge_expired(user_id).await?;
    println!(
        "Purged {} expired token(s) older than {} days",
        purged, config.tokens.retention_days
    );
    Ok(())
}
