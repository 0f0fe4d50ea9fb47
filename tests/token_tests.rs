//! Access token issuance, verification and expiry against a real store.

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, Utc};
use common::{ScriptedTokens, spawn_service, spawn_store, token_of};
use tokenvault::RegistrationError;
use tokenvault::config::TokenConfig;
use tokenvault::services::{AddUserInput, RegistrationBackend, TokenStore};
use tokenvault::services::token_generator::{TOKEN_ALPHABET, TOKEN_LENGTH};

#[tokio::test]
async fn issued_token_verifies_to_its_user() {
    let (service, _, _) = spawn_service().await;
    let user_id = service.add_user(AddUserInput::default()).await.unwrap();

    let token = service.issue_access_token(user_id).await.unwrap();

    assert_eq!(token.len(), TOKEN_LENGTH);
    assert!(token.bytes().all(|b| TOKEN_ALPHABET.contains(&b)));
    assert_eq!(
        service.verify_access_token(&token).await.unwrap(),
        Some(user_id)
    );
}

#[tokio::test]
async fn unknown_token_is_not_found() {
    let (service, _, _) = spawn_service().await;
    service.add_user(AddUserInput::default()).await.unwrap();

    assert_eq!(
        service
            .verify_access_token("NEVERISSUEDNEVERISSUEDNEVERISSUE")
            .await
            .unwrap(),
        None
    );
}

#[tokio::test]
async fn consecutive_tokens_are_distinct_and_both_valid() {
    let (service, store, _) = spawn_service().await;
    let user_id = service.add_user(AddUserInput::default()).await.unwrap();

    let first = service.issue_access_token(user_id).await.unwrap();
    let second = service.issue_access_token(user_id).await.unwrap();

    assert_ne!(first, second);
    assert_eq!(service.verify_access_token(&first).await.unwrap(), Some(user_id));
    assert_eq!(service.verify_access_token(&second).await.unwrap(), Some(user_id));
    assert_eq!(store.access_token_count(user_id).await.unwrap(), 2);
}

#[tokio::test]
async fn issuing_purges_expired_tokens() {
    let (service, store, _) = spawn_service().await;
    let user_id = service.add_user(AddUserInput::default()).await.unwrap();

    let stale = token_of('S');
    let recent = token_of('R');
    store
        .push_access_token(user_id, &stale, Utc::now() - Duration::days(31))
        .await
        .unwrap();
    store
        .push_access_token(user_id, &recent, Utc::now() - Duration::days(29))
        .await
        .unwrap();

    let fresh = service.issue_access_token(user_id).await.unwrap();

    let user = service.get_user(user_id).await.unwrap().unwrap();
    let tokens: Vec<&str> = user.access_tokens.iter().map(|t| t.token.as_str()).collect();
    assert_eq!(tokens, vec![recent.as_str(), fresh.as_str()]);
}

#[tokio::test]
async fn verifying_an_expired_token_purges_it() {
    let (service, store, _) = spawn_service().await;
    let user_id = service.add_user(AddUserInput::default()).await.unwrap();

    let stale = token_of('S');
    store
        .push_access_token(user_id, &stale, Utc::now() - Duration::days(45))
        .await
        .unwrap();

    assert_eq!(service.verify_access_token(&stale).await.unwrap(), None);
    assert_eq!(store.find_token_owner(&stale).await.unwrap(), None);
    assert_eq!(store.access_token_count(user_id).await.unwrap(), 0);
}

#[tokio::test]
async fn verify_sweeps_the_owners_other_expired_tokens() {
    let (service, store, _) = spawn_service().await;
    let user_id = service.add_user(AddUserInput::default()).await.unwrap();

    let stale = token_of('S');
    store
        .push_access_token(user_id, &stale, Utc::now() - Duration::days(31))
        .await
        .unwrap();
    let live = service.issue_access_token(user_id).await.unwrap();
    // Issuance already swept the stale token; put it back to check verify does too.
    store
        .push_access_token(user_id, &stale, Utc::now() - Duration::days(31))
        .await
        .unwrap();

    assert_eq!(service.verify_access_token(&live).await.unwrap(), Some(user_id));
    assert_eq!(store.find_token_owner(&stale).await.unwrap(), None);
}

#[tokio::test]
async fn purge_only_touches_the_given_user() {
    let (service, store, _) = spawn_service().await;
    let alice = service.add_user(AddUserInput::default()).await.unwrap();
    let bob = service.add_user(AddUserInput::default()).await.unwrap();

    let old = Utc::now() - Duration::days(60);
    store.push_access_token(alice, &token_of('A'), old).await.unwrap();
    store.push_access_token(bob, &token_of('B'), old).await.unwrap();

    let purged = service.tokens().purge_expired(alice).await.unwrap();

    assert_eq!(purged, 1);
    assert_eq!(store.access_token_count(alice).await.unwrap(), 0);
    assert_eq!(store.access_token_count(bob).await.unwrap(), 1);
}

#[tokio::test]
async fn shorter_retention_is_honoured() {
    let (service, store, _) = spawn_service().await;
    let user_id = service.add_user(AddUserInput::default()).await.unwrap();

    let tokens = TokenStore::new(
        store.clone(),
        &TokenConfig {
            retention_days: 1,
            ..TokenConfig::default()
        },
    );

    let token = token_of('D');
    store
        .push_access_token(user_id, &token, Utc::now() - Duration::days(2))
        .await
        .unwrap();

    assert_eq!(tokens.verify_access_token(&token).await.unwrap(), None);
}

#[tokio::test]
async fn candidate_held_by_another_user_is_regenerated() {
    let (service, store, _) = spawn_service().await;
    let alice = service.add_user(AddUserInput::default()).await.unwrap();
    let bob = service.add_user(AddUserInput::default()).await.unwrap();

    let taken = token_of('T');
    let free = token_of('F');
    store.push_access_token(alice, &taken, Utc::now()).await.unwrap();

    let tokens = TokenStore::with_generator(
        store.clone(),
        &TokenConfig::default(),
        Arc::new(ScriptedTokens::new([taken.clone(), free.clone()])),
    );

    assert_eq!(tokens.issue_access_token(bob).await.unwrap(), free);
    assert_eq!(store.find_token_owner(&taken).await.unwrap(), Some(alice));
    assert_eq!(store.find_token_owner(&free).await.unwrap(), Some(bob));
}

#[tokio::test]
async fn token_taken_between_check_and_insert_is_regenerated() {
    let (service, store, _) = spawn_service().await;
    let alice = service.add_user(AddUserInput::default()).await.unwrap();
    let bob = service.add_user(AddUserInput::default()).await.unwrap();

    let raced = token_of('Q');
    let free = token_of('F');
    // Another writer stores bob's candidate for alice right before bob's insert.
    common::execute(
        &store,
        &format!(
            "CREATE TRIGGER race_access_token BEFORE INSERT ON access_tokens \
             WHEN NEW.token = '{raced}' AND NEW.user_id = {bob} \
             BEGIN \
                 INSERT INTO access_tokens (user_id, token, issued_at) \
                 VALUES ({alice}, NEW.token, NEW.issued_at); \
             END"
        ),
    )
    .await;

    let tokens = TokenStore::with_generator(
        store.clone(),
        &TokenConfig::default(),
        Arc::new(ScriptedTokens::new([raced, free.clone()])),
    );

    assert_eq!(tokens.issue_access_token(bob).await.unwrap(), free);
    assert_eq!(store.find_token_owner(&free).await.unwrap(), Some(bob));
    assert_eq!(store.access_token_count(bob).await.unwrap(), 1);
}

#[tokio::test]
async fn issuance_gives_up_after_max_attempts() {
    let (service, store, _) = spawn_service().await;
    let alice = service.add_user(AddUserInput::default()).await.unwrap();
    let bob = service.add_user(AddUserInput::default()).await.unwrap();

    let taken = token_of('T');
    store.push_access_token(alice, &taken, Utc::now()).await.unwrap();

    let tokens = TokenStore::with_generator(
        store.clone(),
        &TokenConfig {
            max_attempts: 3,
            ..TokenConfig::default()
        },
        Arc::new(ScriptedTokens::new(vec![taken; 3])),
    );

    let err = tokens.issue_access_token(bob).await.unwrap_err();
    assert!(matches!(
        err,
        RegistrationError::ResourceExhausted {
            what: "access token",
            attempts: 3
        }
    ));
    assert_eq!(store.access_token_count(bob).await.unwrap(), 0);
}

#[tokio::test]
async fn duplicate_token_insert_is_a_uniqueness_error() {
    let (service, store, _) = spawn_service().await;
    let alice = service.add_user(AddUserInput::default()).await.unwrap();
    let bob = service.add_user(AddUserInput::default()).await.unwrap();

    let token = token_of('X');
    store.push_access_token(alice, &token, Utc::now()).await.unwrap();

    let err = store
        .push_access_token(bob, &token, Utc::now())
        .await
        .unwrap_err();

    assert!(err.is_uniqueness(), "unexpected error: {err:?}");
    assert_eq!(store.find_token_owner(&token).await.unwrap(), Some(alice));
}

#[tokio::test]
async fn issuing_for_a_missing_user_fails() {
    let (store, config) = spawn_store().await;
    let tokens = TokenStore::new(store, &config.tokens);

    let err = tokens
        .issue_access_token(tokenvault::domain::UserId::new(999))
        .await
        .unwrap_err();

    assert!(matches!(err, RegistrationError::NotFound(_)));
}

#[tokio::test]
async fn concurrent_issuance_yields_distinct_valid_tokens() {
    let (service, store, _) = spawn_service().await;
    let user_id = service.add_user(AddUserInput::default()).await.unwrap();

    let results =
        futures::future::join_all((0..8).map(|_| service.issue_access_token(user_id))).await;

    let tokens: HashSet<String> = results.into_iter().map(Result::unwrap).collect();
    assert_eq!(tokens.len(), 8);
    assert_eq!(store.access_token_count(user_id).await.unwrap(), 8);

    for token in &tokens {
        assert_eq!(service.verify_access_token(token).await.unwrap(), Some(user_id));
    }
}
