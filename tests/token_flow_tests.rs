// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Registration, login, token refresh, verify and blacklist endpoints.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use lifeos::db::Database;
use lifeos::models::UserStatusUpdate;
use lifeos::services::PasswordHasher;
use lifeos::settings::Settings;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tower::ServiceExt;

mod common;

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    (status, common::body_json(response).await)
}

#[tokio::test]
async fn test_refresh_rotates_and_old_token_is_rejected() {
    let (app, state) = common::create_test_app();
    let user = common::seed_user(&state, "user11@example.com", false).await;
    let pair = common::tokens_for(&state, &user);

    let (status, body) = post(
        &app,
        "/api/v1/auth/token/refresh/",
        json!({ "refresh": pair.refresh }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["access"].is_string());
    let rotated = body["refresh"].as_str().unwrap().to_string();
    assert_ne!(rotated, pair.refresh);

    let (status, body) = post(
        &app,
        "/api/v1/auth/token/refresh/",
        json!({ "refresh": pair.refresh }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_token");

    let (status, _) = post(
        &app,
        "/api/v1/auth/token/refresh/",
        json!({ "refresh": rotated }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_refreshed_access_token_authorizes() {
    let (app, state) = common::create_test_app();
    let user = common::seed_user(&state, "user12@example.com", false).await;
    let pair = common::tokens_for(&state, &user);

    let (_, body) = post(
        &app,
        "/api/v1/auth/token/refresh/",
        json!({ "refresh": pair.refresh }),
    )
    .await;
    let access = body["access"].as_str().unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/calendar/")
                .header(header::AUTHORIZATION, format!("Bearer {}", access))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_access_token_cannot_refresh() {
    let (app, state) = common::create_test_app();
    let user = common::seed_user(&state, "user13@example.com", false).await;
    let pair = common::tokens_for(&state, &user);

    let (status, _) = post(
        &app,
        "/api/v1/auth/token/refresh/",
        json!({ "refresh": pair.access }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_verify() {
    let (app, state) = common::create_test_app();
    let user = common::seed_user(&state, "user14@example.com", false).await;
    let pair = common::tokens_for(&state, &user);

    let (status, body) = post(&app, "/api/v1/auth/token/verify/", json!({ "token": pair.access })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));

    let (status, _) = post(&app, "/api/v1/auth/token/verify/", json!({ "token": "garbage" })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_blacklist_revokes_refresh_token() {
    let (app, state) = common::create_test_app();
    let user = common::seed_user(&state, "user15@example.com", false).await;
    let pair = common::tokens_for(&state, &user);

    let (status, _) = post(
        &app,
        "/api/v1/auth/token/blacklist/",
        json!({ "refresh": pair.refresh }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = post(
        &app,
        "/api/v1/auth/token/refresh/",
        json!({ "refresh": pair.refresh }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = post(&app, "/api/v1/auth/token/verify/", json!({ "token": pair.refresh })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_obtain_requires_credentials() {
    let (app, _) = common::create_test_app();

    let (status, body) = post(
        &app,
        "/api/v1/auth/token/",
        json!({ "email": "", "password": "" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_register_rejects_invalid_email() {
    let (app, _) = common::create_test_app();

    let (status, body) = post(
        &app,
        "/api/v1/auth/register/",
        json!({ "email": "not-an-email", "password": "correct horse battery staple" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert!(body["fields"]["email"].is_array());
}

#[tokio::test]
async fn test_register_applies_password_policy() {
    let (app, _) = common::create_test_app();

    for password in ["short1", "12345678901", "password", "ada.lovelace@example.com"] {
        let (status, body) = post(
            &app,
            "/api/v1/auth/register/",
            json!({ "email": "ada.lovelace@example.com", "password": password }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", password);
        assert!(
            !body["fields"]["password"].as_array().unwrap().is_empty(),
            "{}",
            password
        );
    }
}

#[tokio::test]
async fn test_register_then_login() {
    let (app, state) = common::create_test_app();

    let (status, body) = post(
        &app,
        "/api/v1/auth/register/",
        json!({ "email": "Grace@Example.com", "password": common::PASSWORD, "first_name": "Grace" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["email"], "grace@example.com");
    assert!(body.get("password").is_none());

    let (status, body) = post(
        &app,
        "/api/v1/auth/register/",
        json!({ "email": "grace@example.com", "password": common::PASSWORD }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    let (status, body) = post(
        &app,
        "/api/v1/auth/token/",
        json!({ "email": "GRACE@example.com", "password": common::PASSWORD }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["access"].is_string());
    assert!(body["refresh"].is_string());

    let stored = state
        .db
        .get_user_by_email("grace@example.com")
        .await
        .unwrap()
        .unwrap();
    assert!(stored.last_login.is_some());
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let (app, state) = common::create_test_app();
    let user = common::seed_user(&state, "ada@example.com", false).await;
    common::seed_user(&state, "gone@example.com", false).await;
    let gone = state.db.get_user_by_email("gone@example.com").await.unwrap().unwrap();
    state
        .db
        .set_user_status(
            gone.id,
            &UserStatusUpdate {
                is_active: Some(false),
                is_staff: None,
            },
        )
        .await
        .unwrap();

    let attempts = [
        ("ada@example.com", "wrong-password-entirely"),
        ("nobody@example.com", common::PASSWORD),
        ("gone@example.com", common::PASSWORD),
    ];
    for (email, password) in attempts {
        let (status, body) = post(
            &app,
            "/api/v1/auth/token/",
            json!({ "email": email, "password": password }),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", email);
        assert_eq!(body, json!({ "error": "unauthorized" }), "{}", email);
    }
    assert!(state.db.get_user(user.id).await.unwrap().unwrap().last_login.is_none());
}

#[tokio::test]
async fn test_unknown_email_costs_a_password_check() {
    let (app, state) = common::build_app(
        Settings::test_default(),
        Database::in_memory(),
        PasswordHasher::new(50_000),
    );
    common::seed_user(&state, "ada@example.com", false).await;

    let timed = |email: &'static str| {
        let app = app.clone();
        async move {
            let start = Instant::now();
            let (status, _) = post(
                &app,
                "/api/v1/auth/token/",
                json!({ "email": email, "password": "wrong-password-entirely" }),
            )
            .await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            start.elapsed()
        }
    };

    let wrong_password = timed("ada@example.com").await;
    let unknown = timed("nobody@example.com").await;
    assert!(
        unknown * 3 >= wrong_password && wrong_password > Duration::ZERO,
        "unknown {:?} vs wrong password {:?}",
        unknown,
        wrong_password
    );
}

#[tokio::test]
async fn test_refresh_rejected_for_deleted_account() {
    let (app, state) = common::create_test_app();
    // Validly signed, but no such user is stored.
    let pair = common::token_pair(&state, 424242, true);

    let (status, body) = post(
        &app,
        "/api/v1/auth/token/refresh/",
        json!({ "refresh": pair.refresh }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_token");
}

#[tokio::test]
async fn test_refresh_rejected_for_deactivated_account() {
    let (app, state) = common::create_test_app();
    let user = common::seed_user(&state, "ada@example.com", false).await;
    let pair = common::tokens_for(&state, &user);
    state
        .db
        .set_user_status(
            user.id,
            &UserStatusUpdate {
                is_active: Some(false),
                is_staff: None,
            },
        )
        .await
        .unwrap();

    let (status, _) = post(
        &app,
        "/api/v1/auth/token/refresh/",
        json!({ "refresh": pair.refresh }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_carries_current_staff_flag() {
    let (app, state) = common::create_test_app();
    let user = common::seed_user(&state, "root@example.com", true).await;
    let pair = common::tokens_for(&state, &user);
    state
        .db
        .set_user_status(
            user.id,
            &UserStatusUpdate {
                is_active: None,
                is_staff: Some(false),
            },
        )
        .await
        .unwrap();

    let (status, body) = post(
        &app,
        "/api/v1/auth/token/refresh/",
        json!({ "refresh": pair.refresh }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let claims = state
        .tokens
        .verify(body["access"].as_str().unwrap(), lifeos::services::TokenType::Access)
        .await
        .unwrap();
    assert!(!claims.is_staff);
}

#[tokio::test]
async fn test_concurrent_refresh_with_one_token() {
    let (app, state) = common::create_test_app();
    let user = common::seed_user(&state, "ada@example.com", false).await;
    let pair = common::tokens_for(&state, &user);
    let body = json!({ "refresh": pair.refresh });

    let (a, b) = tokio::join!(
        post(&app, "/api/v1/auth/token/refresh/", body.clone()),
        post(&app, "/api/v1/auth/token/refresh/", body.clone())
    );
    let mut statuses = [a.0.as_u16(), b.0.as_u16()];
    statuses.sort_unstable();
    assert_eq!(statuses, [200, 401]);
}

#[tokio::test]
async fn test_malformed_json_uses_error_envelope() {
    let (app, _) = common::create_test_app();

    let send = |content_type: &'static str, body: &'static str| {
        let app = app.clone();
        async move {
            let response = app
                .oneshot(
                    Request::builder()
                        .method("POST")
                        .uri("/api/v1/auth/token/")
                        .header(header::CONTENT_TYPE, content_type)
                        .body(Body::from(body))
                        .unwrap(),
                )
                .await
                .unwrap();
            let status = response.status();
            (status, common::body_json(response).await)
        }
    };

    let (status, body) = send("application/json", "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
    assert!(body["details"].is_string());

    let (status, body) = send("application/json", r#"{"email": "a@b.c"}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    let (status, body) = send("text/plain", "{}").await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body["error"], "unsupported_media_type");
}

#[tokio::test]
async fn test_register_with_offline_database() {
    let (app, _) = common::create_offline_app();

    let (status, body) = post(
        &app,
        "/api/v1/auth/register/",
        json!({ "email": "grace@example.com", "password": "quiet-lantern-orbit-73" }),
    )
    .await;
    // Offline database.
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "database_error");
}
