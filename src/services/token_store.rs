//! Access-token issuance, verification and lazy expiry.
//!
//! Tokens live in the owning user's token set. Expired tokens are not swept on a
//! schedule: every issuance and verification first pulls the user's tokens that
//! are older than the retention window.
//!
//! Issuance is check-then-act. Between the global existence check and the push
//! another caller may store the same string; the unique index on the token
//! column rejects the loser, and issuance starts over with a fresh candidate.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, error, warn};

use crate::config::TokenConfig;
use crate::db::Store;
use crate::domain::UserId;
use crate::error::{RegistrationError, Result};
use crate::services::token_generator::{RandomTokenGenerator, TokenGenerator};
use crate::services::unique::generate_unique;

#[derive(Clone)]
pub struct TokenStore {
    store: Store,
    generator: Arc<dyn TokenGenerator>,
    retention: Duration,
    max_attempts: u32,
}

impl TokenStore {
    #[must_use]
    pub fn new(store: Store, config: &TokenConfig) -> Self {
        Self::with_generator(store, config, Arc::new(RandomTokenGenerator))
    }

    #[must_use]
    pub fn with_generator(
        store: Store,
        config: &TokenConfig,
        generator: Arc<dyn TokenGenerator>,
    ) -> Self {
        Self {
            store,
            generator,
            retention: config.retention(),
            max_attempts: config.max_attempts,
        }
    }

    /// Pulls every token of `user_id` issued at or before `now - retention`.
    pub async fn purge_expired(&self, user_id: UserId) -> Result<u64> {
        let cutoff = Utc::now() - self.retention;
        let purged = self.store.pull_access_tokens_before(user_id, cutoff).await?;

        if purged > 0 {
            debug!(user_id = %user_id, purged, "Purged expired access tokens");
            metrics::counter!("access_tokens_purged_total").increment(purged);
        }

        Ok(purged)
    }

    async fn unused_token(&self) -> Result<String> {
        let store = &self.store;
        let generator = &self.generator;

        generate_unique(
            "access token",
            self.max_attempts,
            || generator.generate(),
            move |candidate| async move {
                store
                    .find_token_owner(&candidate)
                    .await
                    .map(|owner| owner.is_some())
            },
        )
        .await
    }

    /// Creates a token unique across all users, stores it for `user_id` and
    /// returns it.
    pub async fn issue_access_token(&self, user_id: UserId) -> Result<String> {
        if !self.store.user_exists(user_id).await? {
            return Err(RegistrationError::NotFound(format!("user {user_id}")));
        }

        for attempt in 1..=self.max_attempts {
            let token = self.unused_token().await?;

            self.purge_expired(user_id).await?;

            match self
                .store
                .push_access_token(user_id, &token, Utc::now())
                .await
            {
                Ok(()) => {
                    debug!(user_id = %user_id, "Issued access token");
                    metrics::counter!("access_tokens_issued_total").increment(1);
                    return Ok(token);
                }
                Err(e) if e.is_uniqueness() => {
                    warn!(user_id = %user_id, attempt, "Access token collided on insert, retrying");
                    metrics::counter!("token_conflicts_total").increment(1);
                }
                Err(e) => return Err(e),
            }
        }

        error!(user_id = %user_id, attempts = self.max_attempts, "Access token issuance exhausted");
        Err(RegistrationError::ResourceExhausted {
            what: "access token",
            attempts: self.max_attempts,
        })
    }

    /// Returns the owner of `token` if it exists and has not expired.
    ///
    /// The owner's expired tokens are purged on the way, so a token can turn
    /// invalid between the two lookups.
    pub async fn verify_access_token(&self, token: &str) -> Result<Option<UserId>> {
        let Some(owner) = self.store.find_token_owner(token).await? else {
            metrics::counter!("access_tokens_verified_total", "result" => "unknown").increment(1);
            return Ok(None);
        };

        self.purge_expired(owner).await?;

        let owner = self.store.find_token_owner(token).await?;
        let result = if owner.is_some() { "valid" } else { "expired" };
        debug!(result, "Verified access token");
        metrics::counter!("access_tokens_verified_total", "result" => result).increment(1);

        Ok(owner)
    }
}
