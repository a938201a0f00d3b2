// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Security headers and TLS redirect middleware.

use crate::settings::SecuritySettings;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// Whether the request arrived over TLS. `X-Forwarded-Proto` only counts
/// when the deployment says a trusted proxy sets it.
fn is_secure(req: &Request, trust_forwarded_proto: bool) -> bool {
    if req.uri().scheme_str() == Some("https") {
        return true;
    }
    if !trust_forwarded_proto {
        return false;
    }
    req.headers()
        .get("x-forwarded-proto")
        .and_then(|h| h.to_str().ok())
        .map(|proto| proto.split(',').next().unwrap_or("").trim().eq_ignore_ascii_case("https"))
        .unwrap_or(false)
}

/// `https://` location for a plain-HTTP request, if its host is known.
fn https_location(req: &Request) -> Option<String> {
    let host = req
        .headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| req.uri().authority().map(|a| a.as_str()))?;
    let path = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    Some(format!("https://{}{}", host, path))
}

fn hsts_value(settings: &SecuritySettings) -> String {
    let mut value = format!("max-age={}", settings.hsts_seconds);
    if settings.hsts_include_subdomains {
        value.push_str("; includeSubDomains");
    }
    if settings.hsts_preload {
        value.push_str("; preload");
    }
    value
}

/// Headers to set on a response, given the settings and transport.
pub fn security_headers(settings: &SecuritySettings, secure: bool) -> Vec<(HeaderName, String)> {
    let mut headers = Vec::new();

    if settings.content_type_nosniff {
        headers.push((header::X_CONTENT_TYPE_OPTIONS, "nosniff".to_string()));
    }
    if !settings.x_frame_options.is_empty() {
        headers.push((header::X_FRAME_OPTIONS, settings.x_frame_options.clone()));
    }
    if settings.browser_xss_filter {
        headers.push((header::X_XSS_PROTECTION, "1; mode=block".to_string()));
    }
    if !settings.referrer_policy.is_empty() {
        headers.push((header::REFERRER_POLICY, settings.referrer_policy.clone()));
    }
    if !settings.cross_origin_opener_policy.is_empty() {
        headers.push((
            HeaderName::from_static("cross-origin-opener-policy"),
            settings.cross_origin_opener_policy.clone(),
        ));
    }
    // Browsers ignore HSTS over plain HTTP.
    if secure && settings.hsts_seconds > 0 {
        headers.push((header::STRICT_TRANSPORT_SECURITY, hsts_value(settings)));
    }

    headers
}

/// Redirect plain-HTTP requests when TLS is enforced and add security
/// headers to all responses. Headers already set by a handler are kept.
pub async fn add_security_headers(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let settings = &state.settings.security;
    let secure = is_secure(&req, settings.trust_forwarded_proto);

    if settings.ssl_redirect && !secure {
        if let Some(location) = https_location(&req) {
            tracing::debug!(location = %location, "Redirecting to HTTPS");
            return match HeaderValue::from_str(&location) {
                Ok(location) => {
                    (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)]).into_response()
                }
                Err(_) => StatusCode::BAD_REQUEST.into_response(),
            };
        }
    }

    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    for (name, value) in security_headers(settings, secure) {
        if headers.contains_key(&name) {
            continue;
        }
        if let Ok(value) = HeaderValue::from_str(&value) {
            headers.insert(name, value);
        }
    }

    response
}
