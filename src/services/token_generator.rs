//! Random candidate values for access tokens and temporary usernames.

use rand::Rng;

/// Characters an access token is drawn from.
pub const TOKEN_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub const TOKEN_LENGTH: usize = 32;

/// Source of candidate access tokens.
///
/// Candidates are not checked for uniqueness here; see [`super::unique::generate_unique`].
pub trait TokenGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Draws each character uniformly from [`TOKEN_ALPHABET`] using the OS-seeded
/// thread RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomTokenGenerator;

impl TokenGenerator for RandomTokenGenerator {
    fn generate(&self) -> String {
        generate_token()
    }
}

#[must_use]
pub fn generate_token() -> String {
    let mut rng = rand::rng();
    (0..TOKEN_LENGTH)
        .map(|_| char::from(TOKEN_ALPHABET[rng.random_range(0..TOKEN_ALPHABET.len())]))
        .collect()
}

/// `prefix` followed by a random number in `0..=max`, e.g. `user4821337`.
#[must_use]
pub fn generate_temp_username(prefix: &str, max: u32) -> String {
    let n = rand::rng().random_range(0..=max);
    format!("{prefix}{n}")
}
