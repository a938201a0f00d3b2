// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account registration and JWT token routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::user::UserResponse;
use crate::models::NewUser;
use crate::routes::table::{Access, Endpoint};
use crate::services::tokens::RefreshedTokens;
use crate::services::{TokenPair, TokenSubject, TokenType, UserAttributes};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{Method, StatusCode},
    routing::{get, post},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

pub fn endpoints() -> Vec<Endpoint> {
    vec![
        Endpoint::new(
            Method::POST,
            "register/",
            "auth-register",
            "Create an account",
            Access::Public,
            post(register),
        ),
        Endpoint::new(
            Method::POST,
            "token/",
            "token-obtain-pair",
            "Obtain an access/refresh token pair",
            Access::Public,
            post(obtain_token_pair),
        ),
        Endpoint::new(
            Method::POST,
            "token/refresh/",
            "token-refresh",
            "Exchange a refresh token for a new access token",
            Access::Public,
            post(refresh_token),
        ),
        Endpoint::new(
            Method::POST,
            "token/verify/",
            "token-verify",
            "Check that a token is valid",
            Access::Public,
            post(verify_token),
        ),
        Endpoint::new(
            Method::POST,
            "token/blacklist/",
            "token-blacklist",
            "Revoke a refresh token",
            Access::Public,
            post(blacklist_token),
        ),
        Endpoint::new(
            Method::GET,
            "me/",
            "auth-me",
            "Current user profile",
            Access::Authenticated,
            get(get_me),
        ),
    ]
}

/// Empty JSON object, the success body of verify and blacklist.
#[derive(Serialize)]
pub struct Empty {}

/// JSON request body, with parse failures reported in the error envelope.
type JsonBody<T> = std::result::Result<Json<T>, JsonRejection>;

// ─── Registration ────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    pub password: String,
    #[serde(default)]
    #[validate(length(max = 150, message = "Ensure this field has no more than 150 characters."))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(max = 150, message = "Ensure this field has no more than 150 characters."))]
    pub last_name: String,
}

async fn register(
    State(state): State<Arc<AppState>>,
    body: JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    let Json(body) = body?;
    body.validate()?;

    let email = body.email.trim().to_lowercase();
    let attributes = UserAttributes {
        email: &email,
        first_name: &body.first_name,
        last_name: &body.last_name,
    };
    if let Err(errors) = state.password_policy.validate(&body.password, &attributes) {
        return Err(AppError::field("password", errors));
    }

    let hasher = state.hasher.clone();
    let password = body.password;
    let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(|e| AppError::Internal(e.into()))??;

    let user = state
        .db
        .create_user(&NewUser {
            email,
            password_hash,
            first_name: body.first_name.trim().to_string(),
            last_name: body.last_name.trim().to_string(),
            is_staff: false,
        })
        .await?;

    tracing::info!(user_id = user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(user.to_response(&state.settings.rest.datetime_format, state.settings.time_zone)),
    ))
}

// ─── Tokens ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TokenObtainRequest {
    pub email: String,
    pub password: String,
}

/// Authenticate with email and password.
async fn obtain_token_pair(
    State(state): State<Arc<AppState>>,
    body: JsonBody<TokenObtainRequest>,
) -> Result<Json<TokenPair>> {
    let Json(body) = body?;
    if body.email.trim().is_empty() || body.password.is_empty() {
        return Err(AppError::BadRequest(
            "Both 'email' and 'password' are required".to_string(),
        ));
    }

    let user = state
        .db
        .get_user_by_email(&body.email)
        .await?
        .filter(|u| u.is_active);

    let hasher = state.hasher.clone();
    let encoded = user.as_ref().map(|u| u.password.clone());
    let password = body.password;
    let valid = tokio::task::spawn_blocking(move || match encoded {
        Some(encoded) => hasher.verify(&password, &encoded),
        // Same work as a real check so unknown accounts answer no faster.
        None => {
            hasher.verify_dummy(&password);
            false
        }
    })
    .await
    .map_err(|e| AppError::Internal(e.into()))?;

    let Some(user) = user else {
        return Err(AppError::Unauthorized);
    };
    if !valid {
        tracing::info!(user_id = user.id, "Rejected login with wrong password");
        return Err(AppError::Unauthorized);
    }

    if state.tokens.settings().update_last_login {
        state.db.update_last_login(user.id).await?;
    }

    let pair = state.tokens.issue_pair(&TokenSubject::from(&user))?;
    tracing::info!(user_id = user.id, "Issued token pair");
    Ok(Json(pair))
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

/// Exchange a refresh token. The account is reloaded so that deactivated
/// users are refused and staff changes reach the new tokens.
async fn refresh_token(
    State(state): State<Arc<AppState>>,
    body: JsonBody<RefreshRequest>,
) -> Result<Json<RefreshedTokens>> {
    let Json(body) = body?;
    let claims = state.tokens.verify(&body.refresh, TokenType::Refresh).await?;

    let user = state
        .db
        .get_user(claims.user_id)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| {
            tracing::info!(user_id = claims.user_id, "Refresh for missing or inactive user");
            AppError::InvalidToken
        })?;

    let refreshed = state
        .tokens
        .refresh(&claims, &TokenSubject::from(&user))
        .await?;
    Ok(Json(refreshed))
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub token: String,
}

async fn verify_token(
    State(state): State<Arc<AppState>>,
    body: JsonBody<VerifyRequest>,
) -> Result<Json<Empty>> {
    let Json(body) = body?;
    state.tokens.verify_any(&body.token).await?;
    Ok(Json(Empty {}))
}

async fn blacklist_token(
    State(state): State<Arc<AppState>>,
    body: JsonBody<RefreshRequest>,
) -> Result<Json<Empty>> {
    let Json(body) = body?;
    state.tokens.blacklist(&body.refresh).await?;
    Ok(Json(Empty {}))
}

// ─── Profile ─────────────────────────────────────────────────

async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    let profile = state
        .db
        .get_user(user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;

    Ok(Json(profile.to_response(
        &state.settings.rest.datetime_format,
        state.settings.time_zone,
    )))
}
