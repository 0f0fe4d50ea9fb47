mod init;
mod tokens;
mod users;

pub use init::cmd_init;
pub use tokens::{cmd_issue_token, cmd_purge_tokens, cmd_verify_token};
pub use users::{cmd_activate, cmd_add_user, cmd_login, cmd_show_user};

use crate::config::Config;
use crate::db::Store;
use crate::domain::UserId;
use crate::services::SeaOrmRegistrationService;
use anyhow::Context;

pub(crate) async fn open_store(config: &Config) -> anyhow::Result<Store> {
    Store::with_pool_options(
        &config.general.database_path,
        config.general.max_connections,
        config.general.min_connections,
    )
    .await
    .context("Failed to open user store")
}

pub(crate) async fn open_service(config: &Config) -> anyhow::Result<SeaOrmRegistrationService> {
    let store = open_store(config).await?;
    SeaOrmRegistrationService::new(store, config)
}

pub(crate) fn parse_user_id(raw: &str) -> anyhow::Result<UserId> {
    raw.parse()
        .with_context(|| format!("Invalid user ID: {raw}"))
}
