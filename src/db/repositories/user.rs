use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, Order, Query};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};

use crate::domain::{AccessToken, LinkedAccount, User, UserId};
use crate::entities::{access_tokens, linked_accounts, prelude::*, users};
use crate::error::Result;

/// Fields of a user record about to be inserted.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: Option<String>,
    pub email: Option<String>,
    pub linked_account: Option<LinkedAccount>,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_linked_account(m: linked_accounts::Model) -> LinkedAccount {
        LinkedAccount {
            account_type: m.account_type,
            account_id: m.account_id,
            first_name: m.first_name,
            last_name: m.last_name,
            token: m.token,
        }
    }

    /// Insert the user record and its linked account as one unit.
    ///
    /// A duplicate username or linked identity surfaces as
    /// [`RegistrationError::Uniqueness`](crate::error::RegistrationError::Uniqueness).
    pub async fn insert(&self, user: NewUser) -> Result<UserId> {
        let txn = self.conn.begin().await?;

        let active_model = users::ActiveModel {
            username: Set(user.username),
            password_hash: Set(user.password_hash),
            email: Set(user.email),
            activated_timestamp: Set(None),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        let res = Users::insert(active_model).exec(&txn).await?;
        let user_id = res.last_insert_id;

        if let Some(account) = user.linked_account {
            let linked = linked_accounts::ActiveModel {
                user_id: Set(user_id),
                account_type: Set(account.account_type),
                account_id: Set(account.account_id),
                first_name: Set(account.first_name),
                last_name: Set(account.last_name),
                token: Set(account.token),
                ..Default::default()
            };
            LinkedAccounts::insert(linked).exec(&txn).await?;
        }

        txn.commit().await?;
        Ok(UserId::new(user_id))
    }

    pub async fn exists(&self, id: UserId) -> Result<bool> {
        let count = Users::find_by_id(id.value()).count(&self.conn).await?;
        Ok(count > 0)
    }

    pub async fn find_id_by_username(&self, username: &str) -> Result<Option<UserId>> {
        let id = Users::find()
            .select_only()
            .column(users::Column::Id)
            .filter(users::Column::Username.eq(username))
            .into_tuple::<i32>()
            .one(&self.conn)
            .await?;

        Ok(id.map(UserId::new))
    }

    /// Returns the user id and stored password hash for a username.
    pub async fn find_credentials(
        &self,
        username: &str,
    ) -> Result<Option<(UserId, Option<String>)>> {
        let user = Users::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await?;

        Ok(user.map(|u| (UserId::new(u.id), u.password_hash)))
    }

    /// Loads the user together with its linked accounts and access tokens.
    pub async fn get(&self, id: UserId) -> Result<Option<User>> {
        let Some(user) = Users::find_by_id(id.value()).one(&self.conn).await? else {
            return Ok(None);
        };

        let linked = LinkedAccounts::find()
            .filter(linked_accounts::Column::UserId.eq(user.id))
            .order_by_asc(linked_accounts::Column::Id)
            .all(&self.conn)
            .await?;

        let tokens = AccessTokens::find()
            .filter(access_tokens::Column::UserId.eq(user.id))
            .order_by_asc(access_tokens::Column::IssuedAt)
            .order_by_asc(access_tokens::Column::Id)
            .all(&self.conn)
            .await?;

        Ok(Some(User {
            id: UserId::new(user.id),
            username: user.username,
            email: user.email,
            has_password: user.password_hash.is_some(),
            linked_accounts: linked.into_iter().map(Self::map_linked_account).collect(),
            access_tokens: tokens
                .into_iter()
                .map(|t| AccessToken {
                    token: t.token,
                    timestamp: t.issued_at,
                })
                .collect(),
            activated_timestamp: user.activated_timestamp,
            created_at: user.created_at,
        }))
    }

    /// Sets `activated_timestamp` on the first user whose linked accounts carry
    /// `token`. Returns the number of users touched (0 or 1).
    pub async fn activate_by_linked_token(&self, token: &str, at: DateTime<Utc>) -> Result<u64> {
        let owner = Query::select()
            .column(linked_accounts::Column::UserId)
            .from(LinkedAccounts)
            .and_where(linked_accounts::Column::Token.eq(token))
            .order_by(linked_accounts::Column::Id, Order::Asc)
            .limit(1)
            .to_owned();

        let result = Users::update_many()
            .col_expr(users::Column::ActivatedTimestamp, Expr::value(at))
            .filter(users::Column::Id.in_subquery(owner))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected)
    }
}
