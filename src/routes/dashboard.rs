// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Dashboard route: entry point linking the user to every domain.

use crate::middleware::auth::AuthUser;
use crate::routes::domains::{describe, DomainResponse};
use crate::routes::table::{Access, Domain, Endpoint};
use crate::AppState;
use axum::{extract::State, http::Method, routing::get, Extension, Json};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn endpoints() -> Vec<Endpoint> {
    vec![Endpoint::new(
        Method::GET,
        "",
        "dashboard-index",
        "Dashboard overview",
        Access::Authenticated,
        get(get_dashboard),
    )]
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DashboardResponse {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub user_id: i64,
    pub email: String,
    /// Today's date in the configured time zone
    pub today: String,
    pub time_zone: String,
    pub sections: Vec<DomainResponse>,
}

async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Json<DashboardResponse> {
    let tz = state.settings.time_zone;
    let today = Utc::now()
        .with_timezone(&tz)
        .format(&state.settings.rest.date_format)
        .to_string();

    let sections = Domain::ALL
        .into_iter()
        .filter(|d| !matches!(d, Domain::Auth | Domain::Dashboard))
        .map(|d| describe(&state, d))
        .collect();

    Json(DashboardResponse {
        user_id: user.user_id,
        email: user.email,
        today,
        time_zone: tz.name().to_string(),
        sections,
    })
}
