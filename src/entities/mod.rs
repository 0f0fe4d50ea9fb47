pub mod prelude;

pub mod access_tokens;
pub mod linked_accounts;
pub mod users;
