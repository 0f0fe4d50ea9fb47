use std::sync::LazyLock;

use regex::Regex;

use crate::error::{RegistrationError, Result};
use crate::services::registration_service::{AddUserInput, LinkedAccountInput};

/// Leading letter then 3 to 31 of letters, digits, underscore or dot.
static USERNAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9_.]{3,31}$").expect("username pattern is valid")
});

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s.]+(\.[^@\s.]+)+$").expect("email pattern is valid")
});

const MAX_NAME_FIELD_LEN: usize = 128;

pub fn validate_username(username: &str) -> Result<&str> {
    if !USERNAME_RE.is_match(username) || username.matches('.').count() > 1 {
        return Err(RegistrationError::validation(
            "username: use 4 to 32 characters and start with a letter. \
             You may use letters, numbers, underscores, and one dot (.)",
        ));
    }
    Ok(username)
}

pub fn validate_email(email: &str) -> Result<&str> {
    if !EMAIL_RE.is_match(email) {
        return Err(RegistrationError::validation(format!(
            "email: invalid email address: {email}"
        )));
    }
    Ok(email)
}

pub fn validate_linked_account(account: &LinkedAccountInput) -> Result<()> {
    if account.account_type.trim().is_empty() {
        return Err(RegistrationError::validation(
            "linked_account.account_type cannot be empty",
        ));
    }

    if account.account_id.trim().is_empty() {
        return Err(RegistrationError::validation(
            "linked_account.account_id cannot be empty",
        ));
    }

    for (field, value) in [
        ("first_name", &account.first_name),
        ("last_name", &account.last_name),
    ] {
        if value.as_ref().is_some_and(|v| v.len() > MAX_NAME_FIELD_LEN) {
            return Err(RegistrationError::validation(format!(
                "linked_account.{field} must be {MAX_NAME_FIELD_LEN} characters or less"
            )));
        }
    }

    if account.token.as_ref().is_some_and(|t| t.is_empty()) {
        return Err(RegistrationError::validation(
            "linked_account.token cannot be empty when given",
        ));
    }

    Ok(())
}

/// Structural checks on registration input. Uniqueness is left to the store.
pub fn validate_add_user(input: &AddUserInput) -> Result<()> {
    if let Some(username) = &input.username {
        validate_username(username)?;
    }

    if let Some(email) = &input.email {
        validate_email(email)?;
    }

    if let Some(account) = &input.linked_account {
        validate_linked_account(account)?;
    }

    Ok(())
}
