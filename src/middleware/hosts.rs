// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Host header validation.

use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Strip the port from a host, keeping IPv6 brackets.
fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }
    match host.rsplit_once(':') {
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    }
}

/// Whether `host` matches one of the allowed patterns.
///
/// `*` matches anything; a pattern with a leading dot matches the domain
/// and all of its subdomains; anything else must match exactly.
pub fn host_allowed(host: &str, allowed: &[String]) -> bool {
    let host = strip_port(host).trim_end_matches('.').to_ascii_lowercase();
    if host.is_empty() {
        return false;
    }

    allowed.iter().any(|pattern| {
        let pattern = pattern.to_ascii_lowercase();
        if pattern == "*" {
            return true;
        }
        match pattern.strip_prefix('.') {
            Some(domain) => host == domain || host.ends_with(&pattern),
            None => host == pattern,
        }
    })
}

/// Reject requests addressed to a host this deployment does not serve.
pub async fn validate_host(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let host = request
        .headers()
        .get(header::HOST)
        .map(|h| h.to_str().unwrap_or_default().to_string())
        .or_else(|| request.uri().authority().map(|a| a.to_string()));

    if let Some(host) = host {
        if !host_allowed(&host, &state.settings.allowed_hosts) {
            tracing::warn!(host = %host, "Rejected request with disallowed Host header");
            return Err(AppError::BadRequest(format!("Invalid HTTP_HOST header: {:?}", host)));
        }
    }

    Ok(next.run(request).await)
}
