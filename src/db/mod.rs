use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::domain::{User, UserId};

pub mod migrator;
pub mod repositories;

pub use repositories::user::NewUser;

/// Handle to the user store. Cheap to clone; every clone shares the pool.
#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite://").trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn token_repo(&self) -> repositories::access_token::AccessTokenRepository {
        repositories::access_token::AccessTokenRepository::new(self.conn.clone())
    }

    // ========================================================================
    // Users
    // ========================================================================

    pub async fn insert_user(&self, user: NewUser) -> crate::error::Result<UserId> {
        self.user_repo().insert(user).await
    }

    pub async fn user_exists(&self, id: UserId) -> crate::error::Result<bool> {
        self.user_repo().exists(id).await
    }

    pub async fn get_user(&self, id: UserId) -> crate::error::Result<Option<User>> {
        self.user_repo().get(id).await
    }

    pub async fn find_user_id_by_username(
        &self,
        username: &str,
    ) -> crate::error::Result<Option<UserId>> {
        self.user_repo().find_id_by_username(username).await
    }

    pub async fn find_user_credentials(
        &self,
        username: &str,
    ) -> crate::error::Result<Option<(UserId, Option<String>)>> {
        self.user_repo().find_credentials(username).await
    }

    pub async fn activate_by_linked_token(
        &self,
        token: &str,
        at: DateTime<Utc>,
    ) -> crate::error::Result<u64> {
        self.user_repo().activate_by_linked_token(token, at).await
    }

    // ========================================================================
    // Access tokens
    // ========================================================================

    pub async fn find_token_owner(&self, token: &str) -> crate::error::Result<Option<UserId>> {
        self.token_repo().find_owner(token).await
    }

    pub async fn push_access_token(
        &self,
        user_id: UserId,
        token: &str,
        issued_at: DateTime<Utc>,
    ) -> crate::error::Result<()> {
        self.token_repo().push(user_id, token, issued_at).await
    }

    pub async fn pull_access_tokens_before(
        &self,
        user_id: UserId,
        cutoff: DateTime<Utc>,
    ) -> crate::error::Result<u64> {
        self.token_repo().pull_issued_before(user_id, cutoff).await
    }

    pub async fn access_token_count(&self, user_id: UserId) -> crate::error::Result<u64> {
        self.token_repo().count_for_user(user_id).await
    }
}
