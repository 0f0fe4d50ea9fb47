pub mod hash;
pub use hash::{Argon2Hasher, HashProvider};

pub mod token_generator;
pub use token_generator::{RandomTokenGenerator, TokenGenerator};

pub mod unique;
pub use unique::generate_unique;

pub mod token_store;
pub use token_store::TokenStore;

pub mod validation;

pub mod registration_service;
pub mod registration_service_impl;
pub use registration_service::{AddUserInput, LinkedAccountInput, RegistrationBackend};
pub use registration_service_impl::SeaOrmRegistrationService;
