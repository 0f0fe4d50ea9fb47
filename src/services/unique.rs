//! Optimistic generation of values that must not collide with stored ones.

use std::future::Future;

use tracing::error;

use crate::error::{RegistrationError, Result};

/// Draws candidates until `exists` reports one as unused, trying at most
/// `max_attempts` candidates.
///
/// The returned value was free when checked. A concurrent writer can still take
/// it before the caller stores it; the store's unique index turns that into a
/// [`RegistrationError::Uniqueness`] on the write, which callers treat as a retry.
pub async fn generate_unique<C, E, Fut>(
    what: &'static str,
    max_attempts: u32,
    mut candidate: C,
    mut exists: E,
) -> Result<String>
where
    C: FnMut() -> String,
    E: FnMut(String) -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    for _ in 0..max_attempts {
        let value = candidate();
        if !exists(value.clone()).await? {
            return Ok(value);
        }
    }

    error!(what, max_attempts, "Unique value generation exhausted");
    Err(RegistrationError::ResourceExhausted {
        what,
        attempts: max_attempts,
    })
}
