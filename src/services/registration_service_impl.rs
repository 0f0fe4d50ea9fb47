//! `SeaORM` implementation of the `RegistrationBackend` trait.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::task;
use tracing::{debug, error, info, warn};

use crate::config::{Config, UsernameConfig};
use crate::db::{NewUser, Store};
use crate::domain::{LinkedAccount, User, UserId};
use crate::error::{RegistrationError, Result};
use crate::services::hash::{Argon2Hasher, HashProvider};
use crate::services::registration_service::{AddUserInput, RegistrationBackend};
use crate::services::token_generator::generate_temp_username;
use crate::services::token_store::TokenStore;
use crate::services::unique::generate_unique;
use crate::services::validation::validate_add_user;

pub struct SeaOrmRegistrationService {
    store: Store,
    tokens: TokenStore,
    hasher: Arc<dyn HashProvider>,
    usernames: UsernameConfig,
}

impl SeaOrmRegistrationService {
    pub fn new(store: Store, config: &Config) -> anyhow::Result<Self> {
        let hasher = Argon2Hasher::new(&config.security)?;
        let tokens = TokenStore::new(store.clone(), &config.tokens);
        Ok(Self::with_parts(
            store,
            tokens,
            Arc::new(hasher),
            config.usernames.clone(),
        ))
    }

    #[must_use]
    pub fn with_parts(
        store: Store,
        tokens: TokenStore,
        hasher: Arc<dyn HashProvider>,
        usernames: UsernameConfig,
    ) -> Self {
        Self {
            store,
            tokens,
            hasher,
            usernames,
        }
    }

    #[must_use]
    pub const fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// A temporary username no existing user holds at the time of the check.
    pub async fn make_temp_username(&self) -> Result<String> {
        let store = &self.store;
        let prefix = self.usernames.temp_prefix.as_str();
        let max = self.usernames.temp_max;

        generate_unique(
            "username",
            self.usernames.max_attempts,
            || generate_temp_username(prefix, max),
            move |candidate| async move {
                store
                    .find_user_id_by_username(&candidate)
                    .await
                    .map(|id| id.is_some())
            },
        )
        .await
    }

    async fn hash_password(&self, password: String) -> Result<String> {
        let hasher = Arc::clone(&self.hasher);
        let hashed = task::spawn_blocking(move || hasher.hash(&password)).await??;
        Ok(hashed)
    }

    async fn verify_password(&self, password: &str, hashed: String) -> Result<bool> {
        let hasher = Arc::clone(&self.hasher);
        let password = password.to_string();
        let is_valid = task::spawn_blocking(move || hasher.verify(&password, &hashed)).await??;
        Ok(is_valid)
    }
}

#[async_trait]
impl RegistrationBackend for SeaOrmRegistrationService {
    async fn add_user(&self, input: AddUserInput) -> Result<UserId> {
        let input = input.without_blanks();
        validate_add_user(&input)?;

        let AddUserInput {
            username,
            email,
            password,
            linked_account,
        } = input;

        let password_hash = match password {
            Some(password) => Some(self.hash_password(password).await?),
            None => None,
        };

        let mut user = NewUser {
            username: String::new(),
            password_hash,
            email,
            linked_account: linked_account.map(LinkedAccount::from),
        };

        let Some(username) = username else {
            // A generated name can be taken between the check and the insert.
            // Only that case is retried; other duplicates go back to the caller.
            for attempt in 1..=self.usernames.max_attempts {
                user.username = self.make_temp_username().await?;

                match self.store.insert_user(user.clone()).await {
                    Ok(id) => {
                        info!(user_id = %id, username = %user.username, "Created user with temporary username");
                        metrics::counter!("users_created_total").increment(1);
                        return Ok(id);
                    }
                    Err(e) if e.is_uniqueness_on("users.username") => {
                        warn!(attempt, username = %user.username, "Temporary username taken on insert, retrying");
                        metrics::counter!("username_conflicts_total").increment(1);
                    }
                    Err(e) => return Err(e),
                }
            }

            error!(attempts = self.usernames.max_attempts, "Temporary username insertion exhausted");
            return Err(RegistrationError::ResourceExhausted {
                what: "username",
                attempts: self.usernames.max_attempts,
            });
        };

        user.username = username;
        let id = self.store.insert_user(user).await?;
        info!(user_id = %id, "Created user");
        metrics::counter!("users_created_total").increment(1);
        Ok(id)
    }

    async fn activate(&self, token: &str) -> Result<()> {
        let touched = self
            .store
            .activate_by_linked_token(token, Utc::now())
            .await?;

        if touched > 0 {
            info!("Activated account via linked account token");
        } else {
            debug!("Activation token matched no account");
        }

        Ok(())
    }

    async fn issue_access_token(&self, user_id: UserId) -> Result<String> {
        self.tokens.issue_access_token(user_id).await
    }

    async fn verify_access_token(&self, token: &str) -> Result<Option<UserId>> {
        self.tokens.verify_access_token(token).await
    }

    async fn lookup_username(&self, username: &str) -> Result<Option<UserId>> {
        self.store.find_user_id_by_username(username).await
    }

    async fn get_user(&self, user_id: UserId) -> Result<Option<User>> {
        self.store.get_user(user_id).await
    }

    async fn authenticate(&self, username: &str, password: &str) -> Result<Option<UserId>> {
        let Some((user_id, Some(hashed))) = self.store.find_user_credentials(username).await?
        else {
            return Ok(None);
        };

        if self.verify_password(password, hashed).await? {
            Ok(Some(user_id))
        } else {
            Ok(None)
        }
    }
}
