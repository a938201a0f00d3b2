// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Browsable API renderer.
//!
//! When the browsable renderer is enabled and a browser asks for HTML, JSON
//! responses are wrapped in a minimal page so the API can be explored by hand.

use crate::AppState;
use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Largest JSON body that will be re-rendered as HTML.
const MAX_RENDER_BYTES: usize = 4 * 1024 * 1024;

pub(crate) fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn wants_html(request: &Request) -> bool {
    request
        .headers()
        .get(header::ACCEPT)
        .and_then(|h| h.to_str().ok())
        .map(|accept| accept.contains("text/html"))
        .unwrap_or(false)
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|h| h.to_str().ok())
        .map(|ct| ct.starts_with("application/json"))
        .unwrap_or(false)
}

/// Render a JSON body as an HTML page.
pub fn browsable_page(title: &str, method: &str, path: &str, status: u16, json: &[u8]) -> String {
    let pretty = serde_json::from_slice::<serde_json::Value>(json)
        .and_then(|v| serde_json::to_string_pretty(&v))
        .unwrap_or_else(|_| String::from_utf8_lossy(json).into_owned());

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n</head>\n\
         <body>\n<h1>{title}</h1>\n<p><code>{method} {path}</code> &rarr; <strong>{status}</strong></p>\n\
         <pre>{body}</pre>\n</body>\n</html>\n",
        title = escape_html(title),
        method = escape_html(method),
        path = escape_html(path),
        status = status,
        body = escape_html(&pretty),
    )
}

pub async fn browsable_renderer(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if !state.settings.rest.browsable() || !wants_html(&request) {
        return next.run(request).await;
    }

    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let response = next.run(request).await;
    if !is_json(&response) {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, MAX_RENDER_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to buffer response for browsable rendering");
            return Response::from_parts(parts, Body::empty());
        }
    };

    let page = browsable_page(
        &state.settings.docs.title,
        &method,
        &path,
        parts.status.as_u16(),
        &bytes,
    );

    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    Response::from_parts(parts, Body::from(page))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<a href=\"x\">&'</a>"),
            "&lt;a href=&quot;x&quot;&gt;&amp;&#x27;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_page_pretty_prints_and_escapes() {
        let page = browsable_page("API", "GET", "/api/v1/goals/", 200, br#"{"a":"<b>"}"#);
        assert!(page.contains("&quot;a&quot;: &quot;&lt;b&gt;&quot;"));
        assert!(page.contains("GET /api/v1/goals/"));
        assert!(page.contains("<strong>200</strong>"));
    }
}
