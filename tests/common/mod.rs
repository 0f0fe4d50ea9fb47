#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use sea_orm::ConnectionTrait;
use tokenvault::config::Config;
use tokenvault::db::Store;
use tokenvault::services::{SeaOrmRegistrationService, TokenGenerator};

pub fn test_config() -> Config {
    let db_path =
        std::env::temp_dir().join(format!("tokenvault-test-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config
}

pub async fn spawn_store() -> (Store, Config) {
    let config = test_config();
    let store = Store::new(&config.general.database_path)
        .await
        .expect("failed to open test store");
    (store, config)
}

pub async fn spawn_service() -> (SeaOrmRegistrationService, Store, Config) {
    let (store, config) = spawn_store().await;
    let service =
        SeaOrmRegistrationService::new(store.clone(), &config).expect("failed to build service");
    (service, store, config)
}

/// Hands out a fixed sequence of tokens.
pub struct ScriptedTokens(Mutex<VecDeque<String>>);

impl ScriptedTokens {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(Mutex::new(tokens.into_iter().map(Into::into).collect()))
    }
}

impl TokenGenerator for ScriptedTokens {
    fn generate(&self) -> String {
        self.0
            .lock()
            .unwrap()
            .pop_front()
            .expect("scripted tokens exhausted")
    }
}

pub fn token_of(c: char) -> String {
    std::iter::repeat_n(c, 32).collect()
}

/// Runs raw SQL against the store, e.g. to install a trigger that simulates a
/// concurrent writer.
pub async fn execute(store: &Store, sql: &str) {
    store
        .conn
        .execute_unprepared(sql)
        .await
        .expect("raw statement failed");
}
