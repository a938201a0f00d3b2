// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT authentication middleware.

use crate::error::AppError;
use crate::services::TokenType;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Authenticated user: the access token's subject, as currently stored.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub email: String,
    pub is_staff: bool,
}

/// Pull the token out of `Authorization: <type> <token>` for one of the
/// accepted header types.
pub fn bearer_token<'a>(headers: &'a HeaderMap, header_types: &[String]) -> Option<&'a str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();

    if token.is_empty() || !header_types.iter().any(|t| t == scheme) {
        return None;
    }
    Some(token)
}

/// Middleware that requires a valid access token for an active account.
///
/// The account is reloaded on every request, so deactivation and staff
/// changes apply to tokens that were issued before them.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers(), &state.tokens.settings().auth_header_types)
        .ok_or(AppError::Unauthorized)?;

    let claims = state.tokens.verify(token, TokenType::Access).await?;

    let user = state
        .db
        .get_user(claims.user_id)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| {
            tracing::info!(user_id = claims.user_id, "Token for missing or inactive user");
            AppError::InvalidToken
        })?;

    request.extensions_mut().insert(AuthUser {
        user_id: user.id,
        email: user.email,
        is_staff: user.is_staff,
    });

    Ok(next.run(request).await)
}

/// Middleware that requires the authenticated user to be staff.
///
/// Must run after [`require_auth`].
pub async fn require_staff(request: Request, next: Next) -> Result<Response, AppError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or(AppError::Unauthorized)?;

    if !user.is_staff {
        tracing::warn!(user_id = user.user_id, "Non-staff user denied admin access");
        return Err(AppError::Forbidden);
    }

    Ok(next.run(request).await)
}
