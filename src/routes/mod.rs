// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.

pub mod admin;
pub mod auth;
pub mod dashboard;
pub mod docs;
pub mod domains;
pub mod table;

use crate::error::AppError;
use crate::middleware::hosts::validate_host;
use crate::middleware::render::browsable_renderer;
use crate::middleware::security::add_security_headers;
use crate::middleware::{require_auth, require_staff};
use crate::settings::CorsSettings;
use crate::AppState;
use admin::RouteIndex;
use axum::http::{header, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{middleware, Extension, Router};
use docs::ApiSchema;
use std::collections::HashSet;
use std::sync::Arc;
use table::{Access, RouteTable};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

fn cors_layer(settings: &CorsSettings) -> CorsLayer {
    // Credentials rule out a literal `*`, so allow-all mirrors the origin.
    let origins = if settings.allow_all_origins {
        AllowOrigin::mirror_request()
    } else {
        AllowOrigin::list(
            settings
                .allowed_origins
                .iter()
                .filter_map(|o| HeaderValue::from_str(o).ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(settings.allow_credentials)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
}

/// Redirect `GET`/`HEAD` for a known path missing its trailing slash,
/// otherwise answer 404.
fn fallback_response(paths: &HashSet<String>, method: &Method, uri: &Uri) -> Response {
    let path = uri.path();
    if (method == Method::GET || method == Method::HEAD) && !path.ends_with('/') {
        let slashed = format!("{}/", path);
        if paths.contains(&slashed) {
            let location = match uri.query() {
                Some(query) => format!("{}?{}", slashed, query),
                None => slashed,
            };
            if let Ok(location) = HeaderValue::from_str(&location) {
                return (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)])
                    .into_response();
            }
        }
    }

    AppError::NotFound(format!("No route for {}", path)).into_response()
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    let table = RouteTable::build();
    let schema = ApiSchema(Arc::new(docs::openapi(&table, &state.settings)));
    let index = RouteIndex(Arc::new(table.summaries()));
    let paths = Arc::new(table.paths());

    let mut public_routes = Router::new();
    let mut authenticated_routes = Router::new();
    let mut staff_routes = Router::new();

    for mount in table.into_mounts() {
        let prefix = mount.prefix;
        for endpoint in mount.endpoints {
            let path = format!("{}{}", prefix, endpoint.path);
            match endpoint.access {
                Access::Public => public_routes = public_routes.route(&path, endpoint.handler),
                Access::Authenticated => {
                    authenticated_routes = authenticated_routes.route(&path, endpoint.handler)
                }
                Access::Staff => staff_routes = staff_routes.route(&path, endpoint.handler),
            }
        }
    }

    // Route layers run outermost-last, so staff is checked after auth.
    let authenticated_routes = authenticated_routes
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));
    let staff_routes = staff_routes
        .route_layer(middleware::from_fn(require_staff))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let mut router = Router::new()
        .merge(public_routes)
        .merge(authenticated_routes)
        .merge(staff_routes)
        .fallback(move |method: Method, uri: Uri| {
            let paths = paths.clone();
            async move { fallback_response(&paths, &method, &uri) }
        });

    if state.settings.debug {
        let settings = &state.settings;
        for (url, root) in [
            (&settings.static_url, &settings.static_root),
            (&settings.media_url, &settings.media_root),
        ] {
            let prefix = url.trim_end_matches('/');
            if prefix.starts_with('/') && prefix.len() > 1 {
                tracing::debug!(url = %url, root = %root.display(), "Serving files");
                router = router.nest_service(prefix, ServeDir::new(root));
            }
        }
    }

    router
        .layer(Extension(schema))
        .layer(Extension(index))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            browsable_renderer,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            add_security_headers,
        ))
        .layer(middleware::from_fn_with_state(state.clone(), validate_host))
        .layer(cors_layer(&state.settings.cors))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
