//! Domain service for user registration and access tokens.
//!
//! Creates local and linked-identity accounts, marks activation, and issues and
//! verifies bearer access tokens.

use serde::Deserialize;

use crate::domain::{FACEBOOK_ACCOUNT_TYPE, LinkedAccount, User, UserId};
use crate::error::Result;

fn default_account_type() -> String {
    FACEBOOK_ACCOUNT_TYPE.to_string()
}

/// External identity to attach to a new user.
#[derive(Debug, Clone, Deserialize)]
pub struct LinkedAccountInput {
    #[serde(default = "default_account_type")]
    pub account_type: String,
    pub account_id: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    /// Activation token later passed to [`RegistrationBackend::activate`].
    #[serde(default)]
    pub token: Option<String>,
}

impl LinkedAccountInput {
    pub fn facebook(account_id: impl Into<String>) -> Self {
        Self {
            account_type: default_account_type(),
            account_id: account_id.into(),
            first_name: None,
            last_name: None,
            token: None,
        }
    }
}

impl From<LinkedAccountInput> for LinkedAccount {
    fn from(input: LinkedAccountInput) -> Self {
        Self {
            account_type: input.account_type,
            account_id: input.account_id,
            first_name: input.first_name,
            last_name: input.last_name,
            token: input.token,
        }
    }
}

/// Registration request. Every field is optional; an absent or empty username
/// gets a generated temporary one.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AddUserInput {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub linked_account: Option<LinkedAccountInput>,
}

impl AddUserInput {
    /// Treats empty `username`, `email` and `password` as absent.
    #[must_use]
    pub fn without_blanks(self) -> Self {
        fn present(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.is_empty())
        }

        Self {
            username: present(self.username),
            email: present(self.email),
            password: present(self.password),
            linked_account: self.linked_account,
        }
    }
}

/// Registration backend consumed by the web layer.
#[async_trait::async_trait]
pub trait RegistrationBackend: Send + Sync {
    /// Creates a user and returns its id.
    ///
    /// # Errors
    ///
    /// [`Validation`](crate::error::RegistrationError::Validation) for malformed
    /// input, [`Uniqueness`](crate::error::RegistrationError::Uniqueness) when the
    /// username or linked account is already registered.
    async fn add_user(&self, input: AddUserInput) -> Result<UserId>;

    /// Marks the user holding `token` on a linked account as activated.
    /// Unknown tokens are ignored.
    async fn activate(&self, token: &str) -> Result<()>;

    async fn issue_access_token(&self, user_id: UserId) -> Result<String>;

    /// Returns the owner of a live token, `None` for unknown or expired ones.
    async fn verify_access_token(&self, token: &str) -> Result<Option<UserId>>;

    async fn lookup_username(&self, username: &str) -> Result<Option<UserId>>;

    async fn get_user(&self, user_id: UserId) -> Result<Option<User>>;

    /// Checks a local password. `None` for unknown users, wrong passwords and
    /// accounts without a password.
    async fn authenticate(&self, username: &str, password: &str) -> Result<Option<UserId>>;
}
