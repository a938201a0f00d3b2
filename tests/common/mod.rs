// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::{to_bytes, Body};
use axum::http::Response;
use lifeos::cache::Cache;
use lifeos::db::Database;
use lifeos::models::{NewUser, User};
use lifeos::routes::create_router;
use lifeos::services::{PasswordHasher, TokenPair, TokenSubject};
use lifeos::settings::{Settings, PROFILE_VAR};
use lifeos::AppState;
use std::collections::HashMap;
use std::sync::Arc;

/// Password given to seeded users.
#[allow(dead_code)]
pub const PASSWORD: &str = "quiet-lantern-orbit-73";

/// Settings for the given profile from a fixed set of variables.
#[allow(dead_code)]
pub fn settings_for(profile: &str, pairs: &[(&str, &str)]) -> Settings {
    let mut vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    vars.entry("SECRET_KEY".to_string())
        .or_insert_with(|| "integration-test-secret-key-long-enough-for-hs256".to_string());
    vars.insert(PROFILE_VAR.to_string(), profile.to_string());
    Settings::from_lookup(|key: &str| vars.get(key).cloned()).expect("test settings must resolve")
}

/// Create a test app with the given dependencies and a fast hasher.
#[allow(dead_code)]
pub fn build_app(
    settings: Settings,
    db: Database,
    hasher: PasswordHasher,
) -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(settings, db, Cache::local()).with_hasher(hasher));
    (create_router(state.clone()), state)
}

/// Create a test app from settings backed by an in-memory database.
#[allow(dead_code)]
pub fn create_app_with(settings: Settings) -> (axum::Router, Arc<AppState>) {
    build_app(settings, Database::in_memory(), PasswordHasher::new(1_000))
}

/// Create a development-profile test app.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_app_with(Settings::test_default())
}

/// Development app whose database is offline, so every query fails.
#[allow(dead_code)]
pub fn create_offline_app() -> (axum::Router, Arc<AppState>) {
    build_app(
        Settings::test_default(),
        Database::new_mock(),
        PasswordHasher::new(1_000),
    )
}

/// Store a user with [`PASSWORD`].
#[allow(dead_code)]
pub async fn seed_user(state: &AppState, email: &str, is_staff: bool) -> User {
    state
        .db
        .create_user(&NewUser {
            email: email.to_string(),
            password_hash: state.hasher.hash(PASSWORD).expect("hashing must succeed"),
            first_name: String::new(),
            last_name: String::new(),
            is_staff,
        })
        .await
        .expect("seeding a user must succeed")
}

/// Token pair for a stored user, signed with the app's key.
#[allow(dead_code)]
pub fn tokens_for(state: &AppState, user: &User) -> TokenPair {
    state
        .tokens
        .issue_pair(&TokenSubject::from(user))
        .expect("token issuance must succeed")
}

/// Token pair for an arbitrary subject that need not exist.
#[allow(dead_code)]
pub fn token_pair(state: &AppState, user_id: i64, is_staff: bool) -> TokenPair {
    state
        .tokens
        .issue_pair(&TokenSubject {
            user_id,
            email: format!("user{}@example.com", user_id),
            is_staff,
        })
        .expect("token issuance must succeed")
}

/// Seed a user and return an access token for it.
#[allow(dead_code)]
pub async fn login_as(state: &AppState, email: &str, is_staff: bool) -> String {
    let user = seed_user(state, email, is_staff).await;
    tokens_for(state, &user).access
}

#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).expect("response body must be JSON")
}

#[allow(dead_code)]
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
