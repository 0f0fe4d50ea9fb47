use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect, Set};

use crate::domain::UserId;
use crate::entities::{access_tokens, prelude::*};
use crate::error::Result;

/// Token rows embedded under a user. Every operation here is a single statement.
pub struct AccessTokenRepository {
    conn: DatabaseConnection,
}

impl AccessTokenRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Owner of `token`, searched across all users.
    pub async fn find_owner(&self, token: &str) -> Result<Option<UserId>> {
        let owner = AccessTokens::find()
            .select_only()
            .column(access_tokens::Column::UserId)
            .filter(access_tokens::Column::Token.eq(token))
            .into_tuple::<i32>()
            .one(&self.conn)
            .await?;

        Ok(owner.map(UserId::new))
    }

    /// Appends a token to the user's set. Fails with `Uniqueness` if the token
    /// string is already held by anyone.
    pub async fn push(&self, user_id: UserId, token: &str, issued_at: DateTime<Utc>) -> Result<()> {
        let active_model = access_tokens::ActiveModel {
            user_id: Set(user_id.value()),
            token: Set(token.to_string()),
            issued_at: Set(issued_at),
            ..Default::default()
        };

        AccessTokens::insert(active_model).exec(&self.conn).await?;
        Ok(())
    }

    /// Removes every token of `user_id` issued at or before `cutoff`.
    pub async fn pull_issued_before(&self, user_id: UserId, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = AccessTokens::delete_many()
            .filter(access_tokens::Column::UserId.eq(user_id.value()))
            .filter(access_tokens::Column::IssuedAt.lte(cutoff))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected)
    }

    pub async fn count_for_user(&self, user_id: UserId) -> Result<u64> {
        let count = AccessTokens::find()
            .filter(access_tokens::Column::UserId.eq(user_id.value()))
            .count(&self.conn)
            .await?;

        Ok(count)
    }
}
