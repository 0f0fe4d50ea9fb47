pub use super::access_tokens::Entity as AccessTokens;
pub use super::linked_accounts::Entity as LinkedAccounts;
pub use super::users::Entity as Users;
