// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Descriptor routes for the life-tracking domains.

use crate::middleware::auth::AuthUser;
use crate::routes::table::{Access, Domain, Endpoint};
use crate::AppState;
use axum::{extract::State, http::Method, routing::get, Extension, Json};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Describes one API domain.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DomainResponse {
    pub domain: String,
    pub tag: String,
    pub description: String,
    pub path: String,
}

pub fn describe(state: &AppState, domain: Domain) -> DomainResponse {
    DomainResponse {
        domain: domain.slug().to_string(),
        tag: domain.tag().to_string(),
        description: state
            .settings
            .docs
            .tag_description(domain.tag())
            .unwrap_or_default()
            .to_string(),
        path: domain.prefix(),
    }
}

pub fn endpoints(domain: Domain) -> Vec<Endpoint> {
    let handler = move |State(state): State<Arc<AppState>>, Extension(user): Extension<AuthUser>| async move {
        tracing::debug!(user_id = user.user_id, domain = domain.slug(), "Describing domain");
        Json(describe(&state, domain))
    };

    vec![Endpoint::new(
        Method::GET,
        "",
        index_name(domain),
        "Describe this domain",
        Access::Authenticated,
        get(handler),
    )]
}

fn index_name(domain: Domain) -> &'static str {
    match domain {
        Domain::Auth => "auth-index",
        Domain::Dashboard => "dashboard-index",
        Domain::Goals => "goals-index",
        Domain::Calendar => "calendar-index",
        Domain::Journal => "journal-index",
        Domain::GamePlan => "gameplan-index",
        Domain::Learning => "learning-index",
        Domain::Finance => "finance-index",
        Domain::Health => "health-index",
    }
}
