use chrono::Duration;
use gatekeeper::config::Config;
use gatekeeper::db::{Store, StoreError};
use gatekeeper::models::{Password, Scope, Token, User};

fn test_config() -> Config {
    let path = std::env::temp_dir().join(format!("gatekeeper-store-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.database.url = format!("sqlite:{}", path.display());
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config
}

async fn setup() -> (Store, Config) {
    let config = test_config();
    let store = Store::connect(&config.database)
        .await
        .expect("Failed to open test database");
    (store, config)
}

async fn insert_user(store: &Store, config: &Config, email: &str) -> User {
    let password = Password::set("pa55word", &config.security).unwrap();
    let user = User::new(
        "Test".to_string(),
        "User".to_string(),
        email.to_string(),
        password,
    );
    store.insert_user(&user).await.unwrap();
    user
}

async fn insert_token(store: &Store, user: &User, ttl: Duration, scope: Scope) -> Token {
    let token = Token::generate(user.id, ttl, scope).unwrap();
    store.insert_token(&token).await.unwrap();
    token
}

#[tokio::test]
async fn test_user_round_trip() {
    let (store, config) = setup().await;
    let user = insert_user(&store, &config, "round@example.com").await;

    let by_email = store.get_user_by_email("round@example.com").await.unwrap();
    assert_eq!(by_email.id, user.id);
    assert_eq!(by_email.created_at, user.created_at);
    assert_eq!(by_email.last_updated, user.last_updated);
    assert!(by_email.password.matches("pa55word").unwrap());

    let by_id = store.get_user_by_id(user.id).await.unwrap();
    assert_eq!(by_id.email, "round@example.com");

    assert!(matches!(
        store.get_user_by_email("nobody@example.com").await,
        Err(StoreError::NotFound)
    ));
}

#[tokio::test]
async fn test_duplicate_email() {
    let (store, config) = setup().await;
    insert_user(&store, &config, "dup@example.com").await;

    let password = Password::set("pa55word", &config.security).unwrap();
    let twin = User::new(
        "Twin".to_string(),
        "User".to_string(),
        "dup@example.com".to_string(),
        password,
    );
    assert!(matches!(
        store.insert_user(&twin).await,
        Err(StoreError::DuplicateEmail)
    ));

    let mut other = insert_user(&store, &config, "other@example.com").await;
    let expected = other.last_updated;
    other.email = "dup@example.com".to_string();
    assert!(matches!(
        store.update_user(&other, expected).await,
        Err(StoreError::DuplicateEmail)
    ));
}

#[tokio::test]
async fn test_token_scope_isolation() {
    let (store, config) = setup().await;
    let user = insert_user(&store, &config, "scope@example.com").await;
    let token = insert_token(&store, &user, Duration::hours(1), Scope::Activation).await;

    let owner = store
        .get_user_for_token(Scope::Activation, &token.plaintext)
        .await
        .unwrap();
    assert_eq!(owner.id, user.id);

    for scope in [Scope::Authentication, Scope::PasswordReset] {
        assert!(matches!(
            store.get_user_for_token(scope, &token.plaintext).await,
            Err(StoreError::NotFound)
        ));
    }
}

#[tokio::test]
async fn test_expired_token_looks_unknown() {
    let (store, config) = setup().await;
    let user = insert_user(&store, &config, "expired@example.com").await;
    let expired = insert_token(&store, &user, Duration::seconds(-1), Scope::Authentication).await;

    let expired_result = store
        .get_user_for_token(Scope::Authentication, &expired.plaintext)
        .await;
    let unknown_result = store
        .get_user_for_token(Scope::Authentication, "ABCDEFGHIJKLMNOPQRSTUVWXYZ")
        .await;

    assert!(matches!(expired_result, Err(StoreError::NotFound)));
    assert!(matches!(unknown_result, Err(StoreError::NotFound)));
}

#[tokio::test]
async fn test_delete_tokens_is_scope_wide() {
    let (store, config) = setup().await;
    let user = insert_user(&store, &config, "delete@example.com").await;
    let bystander = insert_user(&store, &config, "bystander@example.com").await;

    let first = insert_token(&store, &user, Duration::hours(1), Scope::Activation).await;
    let second = insert_token(&store, &user, Duration::hours(1), Scope::Activation).await;
    let login = insert_token(&store, &user, Duration::hours(1), Scope::Authentication).await;
    let foreign = insert_token(&store, &bystander, Duration::hours(1), Scope::Activation).await;

    let deleted = store
        .delete_tokens_for_user(Scope::Activation, user.id)
        .await
        .unwrap();
    assert_eq!(deleted, 2);

    for token in [&first, &second] {
        assert!(matches!(
            store
                .get_user_for_token(Scope::Activation, &token.plaintext)
                .await,
            Err(StoreError::NotFound)
        ));
    }

    assert!(
        store
            .get_user_for_token(Scope::Authentication, &login.plaintext)
            .await
            .is_ok()
    );
    assert!(
        store
            .get_user_for_token(Scope::Activation, &foreign.plaintext)
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn test_update_bumps_version() {
    let (store, config) = setup().await;
    let mut user = insert_user(&store, &config, "version@example.com").await;
    let original = user.last_updated;

    user.activated = true;
    let updated = store.update_user(&user, original).await.unwrap();
    assert!(updated.last_updated > original);

    let stored = store.get_user_by_id(user.id).await.unwrap();
    assert!(stored.activated);
    assert_eq!(stored.last_updated, updated.last_updated);

    // The old version is now stale.
    assert!(matches!(
        store.update_user(&user, original).await,
        Err(StoreError::EditConflict)
    ));
}

#[tokio::test]
async fn test_concurrent_stale_updates_conflict_once() {
    let (store, config) = setup().await;
    let user = insert_user(&store, &config, "race@example.com").await;
    let expected = user.last_updated;

    let mut left = user.clone();
    left.first_name = "Left".to_string();
    let mut right = user.clone();
    right.first_name = "Right".to_string();

    let (a, b) = tokio::join!(
        store.update_user(&left, expected),
        store.update_user(&right, expected)
    );

    let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
    let conflicts = [&a, &b]
        .iter()
        .filter(|r| matches!(r, Err(StoreError::EditConflict)))
        .count();
    assert_eq!(successes, 1);
    assert_eq!(conflicts, 1);

    let stored = store.get_user_by_id(user.id).await.unwrap();
    let winner = if a.is_ok() { "Left" } else { "Right" };
    assert_eq!(stored.first_name, winner);
}

#[tokio::test]
async fn test_grant_permissions_idempotent() {
    let (store, config) = setup().await;
    let user = insert_user(&store, &config, "perms@example.com").await;

    assert!(store.get_permissions_for_user(user.id).await.unwrap().is_empty());

    let codes = vec!["movies:read".to_string(), "movies:write".to_string()];
    assert_eq!(store.grant_permissions(user.id, &codes).await.unwrap(), 2);
    assert_eq!(store.grant_permissions(user.id, &codes).await.unwrap(), 0);

    let unknown = vec!["reactor:scram".to_string()];
    assert_eq!(store.grant_permissions(user.id, &unknown).await.unwrap(), 0);
    assert_eq!(store.grant_permissions(user.id, &[]).await.unwrap(), 0);

    let permissions = store.get_permissions_for_user(user.id).await.unwrap();
    assert_eq!(permissions.len(), 2);
    assert!(permissions.includes("movies:read"));
    assert!(permissions.includes("movies:write"));
    assert!(!permissions.includes("reactor:scram"));
}

fn new_user(config: &Config, email: &str) -> User {
    let password = Password::set("pa55word", &config.security).unwrap();
    User::new(
        "New".to_string(),
        "User".to_string(),
        email.to_string(),
        password,
    )
}

#[tokio::test]
async fn test_registration_writes_together() {
    let (store, config) = setup().await;
    let user = new_user(&config, "together@example.com");
    let token = Token::generate(user.id, Duration::hours(1), Scope::Activation).unwrap();

    store
        .insert_registration(&user, &["movies:read".to_string()], &token)
        .await
        .unwrap();

    let owner = store
        .get_user_for_token(Scope::Activation, &token.plaintext)
        .await
        .unwrap();
    assert_eq!(owner.id, user.id);
    let permissions = store.get_permissions_for_user(user.id).await.unwrap();
    assert!(permissions.includes("movies:read"));
}

#[tokio::test]
async fn test_registration_rolls_back_on_failure() {
    let (store, config) = setup().await;
    let existing = insert_user(&store, &config, "first@example.com").await;
    let taken = insert_token(&store, &existing, Duration::hours(1), Scope::Activation).await;

    // The last write collides on the token hash.
    let user = new_user(&config, "second@example.com");
    let mut clash = taken.clone();
    clash.user_id = user.id;

    let result = store
        .insert_registration(&user, &["movies:read".to_string()], &clash)
        .await;
    assert!(result.is_err());

    assert!(matches!(
        store.get_user_by_email("second@example.com").await,
        Err(StoreError::NotFound)
    ));
    assert!(store.get_permissions_for_user(user.id).await.unwrap().is_empty());

    // A retry with a fresh token succeeds instead of hitting DuplicateEmail.
    let fresh = Token::generate(user.id, Duration::hours(1), Scope::Activation).unwrap();
    store
        .insert_registration(&user, &["movies:read".to_string()], &fresh)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_ping() {
    let (store, _) = setup().await;
    assert!(store.ping().await.is_ok());
}
