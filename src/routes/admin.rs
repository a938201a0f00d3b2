// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Staff-only admin console.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::user::UserResponse;
use crate::models::{Page, PageQuery, UserStatusUpdate};
use crate::routes::table::{Access, Endpoint, RouteSummary, ADMIN_PREFIX};
use crate::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::Method,
    routing::{get, patch},
    Extension, Json,
};
use serde::Serialize;
use std::sync::Arc;

/// Route summaries made available to the admin overview.
#[derive(Clone)]
pub struct RouteIndex(pub Arc<Vec<RouteSummary>>);

pub fn endpoints() -> Vec<Endpoint> {
    vec![
        Endpoint::new(
            Method::GET,
            "",
            "admin-index",
            "Site overview",
            Access::Staff,
            get(get_overview),
        ),
        Endpoint::new(
            Method::GET,
            "users/",
            "admin-users",
            "List user accounts",
            Access::Staff,
            get(list_users),
        ),
        Endpoint::new(
            Method::PATCH,
            "users/{id}/",
            "admin-user-status",
            "Activate, deactivate, promote or demote an account",
            Access::Staff,
            patch(update_user_status),
        ),
    ]
}

#[derive(Serialize)]
pub struct TokenPolicy {
    pub access_token_lifetime_seconds: i64,
    pub refresh_token_lifetime_seconds: i64,
    pub rotate_refresh_tokens: bool,
    pub blacklist_after_rotation: bool,
    pub user_id_claim: String,
}

#[derive(Serialize)]
pub struct OverviewResponse {
    pub site: String,
    pub profile: String,
    pub debug: bool,
    pub database: String,
    pub cache: String,
    pub allowed_hosts: Vec<String>,
    pub tokens: TokenPolicy,
    pub routes: Vec<RouteSummary>,
}

/// Effective configuration and route table. Secrets are never included.
async fn get_overview(
    State(state): State<Arc<AppState>>,
    Extension(RouteIndex(routes)): Extension<RouteIndex>,
) -> Json<OverviewResponse> {
    let settings = &state.settings;
    let jwt = state.tokens.settings();

    Json(OverviewResponse {
        site: format!("{} administration", settings.docs.title),
        profile: settings.profile.to_string(),
        debug: settings.debug,
        database: format!(
            "postgres://{}:{}/{}",
            settings.database.host, settings.database.port, settings.database.name
        ),
        cache: state.cache.describe(),
        allowed_hosts: settings.allowed_hosts.clone(),
        tokens: TokenPolicy {
            access_token_lifetime_seconds: jwt.access_token_lifetime.num_seconds(),
            refresh_token_lifetime_seconds: jwt.refresh_token_lifetime.num_seconds(),
            rotate_refresh_tokens: jwt.rotate_refresh_tokens,
            blacklist_after_rotation: jwt.blacklist_after_rotation,
            user_id_claim: jwt.user_id_claim.clone(),
        },
        routes: routes.as_ref().clone(),
    })
}

async fn list_users(
    State(state): State<Arc<AppState>>,
    query: std::result::Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<Page<UserResponse>>> {
    let Query(query) = query?;
    let page_size = state.settings.rest.page_size;

    let count = state.db.count_users().await?;
    let (page, offset) = query.resolve(count, page_size)?;
    let users = state.db.list_users(offset, page_size as i64).await?;

    let results = users
        .iter()
        .map(|u| u.to_response(&state.settings.rest.datetime_format, state.settings.time_zone))
        .collect();

    let path = format!("{}users/", ADMIN_PREFIX);
    Ok(Json(Page::new(results, count, page, page_size, &path)?))
}

/// Change an account's active and staff flags. Takes effect on the next
/// request made with any of the account's tokens.
async fn update_user_status(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AuthUser>,
    Path(id): Path<i64>,
    body: std::result::Result<Json<UserStatusUpdate>, JsonRejection>,
) -> Result<Json<UserResponse>> {
    let Json(update) = body?;
    if update.is_active.is_none() && update.is_staff.is_none() {
        return Err(AppError::BadRequest(
            "Provide 'is_active' and/or 'is_staff'".to_string(),
        ));
    }
    if id == admin.user_id && (update.is_active == Some(false) || update.is_staff == Some(false)) {
        return Err(AppError::BadRequest(
            "Staff cannot deactivate or demote their own account".to_string(),
        ));
    }

    let user = state
        .db
        .set_user_status(id, &update)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;

    tracing::info!(
        admin_id = admin.user_id,
        user_id = user.id,
        is_active = user.is_active,
        is_staff = user.is_staff,
        "Account status changed"
    );

    Ok(Json(user.to_response(
        &state.settings.rest.datetime_format,
        state.settings.time_zone,
    )))
}
