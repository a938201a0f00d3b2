// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! The route table: every URL prefix the service answers and the
//! sub-route-table mounted under it.

use crate::routes::{admin, auth, dashboard, docs, domains};
use crate::AppState;
use axum::http::Method;
use axum::routing::MethodRouter;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

pub const API_V1_PREFIX: &str = "/api/v1/";
pub const ADMIN_PREFIX: &str = "/admin/";
pub const SCHEMA_PATH: &str = "/api/schema/";
pub const SWAGGER_PATH: &str = "/api/docs/";
pub const REDOC_PATH: &str = "/api/redoc/";

/// API domains, each mounted under `/api/v1/<slug>/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    Auth,
    Dashboard,
    Goals,
    Calendar,
    Journal,
    GamePlan,
    Learning,
    Finance,
    Health,
}

impl Domain {
    pub const ALL: [Domain; 9] = [
        Domain::Auth,
        Domain::Dashboard,
        Domain::Goals,
        Domain::Calendar,
        Domain::Journal,
        Domain::GamePlan,
        Domain::Learning,
        Domain::Finance,
        Domain::Health,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            Domain::Auth => "auth",
            Domain::Dashboard => "dashboard",
            Domain::Goals => "goals",
            Domain::Calendar => "calendar",
            Domain::Journal => "journal",
            Domain::GamePlan => "gameplan",
            Domain::Learning => "learning",
            Domain::Finance => "finance",
            Domain::Health => "health",
        }
    }

    /// Documentation tag name.
    pub fn tag(self) -> &'static str {
        match self {
            Domain::Auth => "Auth",
            Domain::Dashboard => "Dashboard",
            Domain::Goals => "Goals",
            Domain::Calendar => "Calendar",
            Domain::Journal => "Journal",
            Domain::GamePlan => "Game Plan",
            Domain::Learning => "Learning",
            Domain::Finance => "Finance",
            Domain::Health => "Health",
        }
    }

    pub fn prefix(self) -> String {
        format!("{}{}/", API_V1_PREFIX, self.slug())
    }
}

/// Who may call an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    Public,
    Authenticated,
    Staff,
}

/// One routed operation.
pub struct Endpoint {
    pub method: Method,
    /// Path relative to the mount prefix (`""` is the prefix itself)
    pub path: &'static str,
    pub name: &'static str,
    pub summary: &'static str,
    pub access: Access,
    pub handler: MethodRouter<Arc<AppState>>,
}

impl Endpoint {
    pub fn new(
        method: Method,
        path: &'static str,
        name: &'static str,
        summary: &'static str,
        access: Access,
        handler: MethodRouter<Arc<AppState>>,
    ) -> Self {
        Self {
            method,
            path,
            name,
            summary,
            access,
            handler,
        }
    }
}

/// A path prefix and the sub-route-table mounted under it.
pub struct Mount {
    pub prefix: String,
    pub domain: Option<Domain>,
    pub endpoints: Vec<Endpoint>,
}

impl Mount {
    /// Full path of one of this mount's endpoints.
    pub fn full_path(&self, endpoint: &Endpoint) -> String {
        format!("{}{}", self.prefix, endpoint.path)
    }
}

/// Serializable description of a routed endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct RouteSummary {
    pub method: String,
    pub path: String,
    pub name: &'static str,
    pub summary: &'static str,
    pub access: Access,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<&'static str>,
}

/// Static, flat route table.
pub struct RouteTable {
    mounts: Vec<Mount>,
}

impl RouteTable {
    pub fn build() -> Self {
        let mut mounts = vec![Mount {
            prefix: ADMIN_PREFIX.to_string(),
            domain: None,
            endpoints: admin::endpoints(),
        }];

        for domain in Domain::ALL {
            let endpoints = match domain {
                Domain::Auth => auth::endpoints(),
                Domain::Dashboard => dashboard::endpoints(),
                other => domains::endpoints(other),
            };
            mounts.push(Mount {
                prefix: domain.prefix(),
                domain: Some(domain),
                endpoints,
            });
        }

        for (prefix, endpoint) in docs::endpoints() {
            mounts.push(Mount {
                prefix: prefix.to_string(),
                domain: None,
                endpoints: vec![endpoint],
            });
        }

        Self { mounts }
    }

    pub fn mounts(&self) -> &[Mount] {
        &self.mounts
    }

    pub fn summaries(&self) -> Vec<RouteSummary> {
        self.mounts
            .iter()
            .flat_map(|mount| {
                mount.endpoints.iter().map(move |endpoint| RouteSummary {
                    method: endpoint.method.to_string(),
                    path: mount.full_path(endpoint),
                    name: endpoint.name,
                    summary: endpoint.summary,
                    access: endpoint.access,
                    tag: mount.domain.map(Domain::tag),
                })
            })
            .collect()
    }

    /// All full paths in the table.
    pub fn paths(&self) -> HashSet<String> {
        self.mounts
            .iter()
            .flat_map(|mount| mount.endpoints.iter().map(move |e| mount.full_path(e)))
            .collect()
    }

    pub fn into_mounts(self) -> Vec<Mount> {
        self.mounts
    }
}
