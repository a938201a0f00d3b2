// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OpenAPI schema generation and the interactive documentation pages.
//!
//! The schema is generated once from the route table when the router is
//! built, so the published document always matches what is actually routed.

use crate::middleware::render::escape_html;
use crate::routes::table::{Access, Endpoint, RouteTable, REDOC_PATH, SCHEMA_PATH, SWAGGER_PATH};
use crate::settings::Settings;
use crate::AppState;
use axum::{
    extract::State,
    http::Method,
    response::{Html, IntoResponse},
    routing::get,
    Extension, Json,
};
use serde_json::{json, Map, Value};
use std::sync::Arc;

const SWAGGER_UI_DIST: &str = "https://cdn.jsdelivr.net/npm/swagger-ui-dist@5";
const REDOC_BUNDLE: &str = "https://cdn.jsdelivr.net/npm/redoc@2/bundles/redoc.standalone.js";

/// Precomputed OpenAPI document shared with the schema handler.
#[derive(Clone)]
pub struct ApiSchema(pub Arc<Value>);

pub fn endpoints() -> Vec<(&'static str, Endpoint)> {
    vec![
        (
            SCHEMA_PATH,
            Endpoint::new(
                Method::GET,
                "",
                "schema",
                "OpenAPI 3 schema",
                Access::Public,
                get(get_schema),
            ),
        ),
        (
            SWAGGER_PATH,
            Endpoint::new(
                Method::GET,
                "",
                "swagger-ui",
                "Swagger UI",
                Access::Public,
                get(swagger_ui),
            ),
        ),
        (
            REDOC_PATH,
            Endpoint::new(
                Method::GET,
                "",
                "redoc",
                "ReDoc",
                Access::Public,
                get(redoc),
            ),
        ),
    ]
}

/// Build the OpenAPI 3 document for every endpoint under the configured
/// schema path prefix.
pub fn openapi(table: &RouteTable, settings: &Settings) -> Value {
    let docs = &settings.docs;
    let mut paths = Map::new();

    for mount in table.mounts() {
        for endpoint in &mount.endpoints {
            let path = mount.full_path(endpoint);
            if !path.starts_with(&docs.schema_path_prefix) {
                continue;
            }
            if endpoint.name == "schema" && !docs.serve_include_schema {
                continue;
            }

            let mut operation = json!({
                "operationId": endpoint.name,
                "summary": endpoint.summary,
                "responses": operation_responses(endpoint.access),
            });
            if let Some(domain) = mount.domain {
                operation["tags"] = json!([domain.tag()]);
            }
            if endpoint.access == Access::Public {
                operation["security"] = json!([]);
            }

            let item = paths
                .entry(path)
                .or_insert_with(|| Value::Object(Map::new()));
            item[endpoint.method.as_str().to_lowercase()] = operation;
        }
    }

    let tags: Vec<Value> = docs
        .tags
        .iter()
        .map(|t| json!({ "name": t.name, "description": t.description }))
        .collect();

    json!({
        "openapi": "3.0.3",
        "info": {
            "title": docs.title,
            "description": docs.description,
            "version": docs.version,
        },
        "tags": tags,
        "paths": paths,
        "components": {
            "securitySchemes": {
                "jwtAuth": {
                    "type": "http",
                    "scheme": "bearer",
                    "bearerFormat": "JWT",
                }
            }
        },
        "security": [{ "jwtAuth": [] }],
    })
}

fn operation_responses(access: Access) -> Value {
    let mut responses = json!({ "200": { "description": "Success" } });
    match access {
        Access::Public => {}
        Access::Authenticated => {
            responses["401"] = json!({ "description": "Authentication credentials were not provided or are invalid" });
        }
        Access::Staff => {
            responses["401"] = json!({ "description": "Authentication credentials were not provided or are invalid" });
            responses["403"] = json!({ "description": "Staff access required" });
        }
    }
    responses
}

async fn get_schema(Extension(ApiSchema(schema)): Extension<ApiSchema>) -> impl IntoResponse {
    Json(schema.as_ref().clone())
}

async fn swagger_ui(State(state): State<Arc<AppState>>) -> Html<String> {
    let title = escape_html(&state.settings.docs.title);
    Html(format!(
        r##"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<link rel="stylesheet" href="{dist}/swagger-ui.css">
</head>
<body>
<div id="swagger-ui"></div>
<script src="{dist}/swagger-ui-bundle.js"></script>
<script>
window.ui = SwaggerUIBundle({{ url: "{schema}", dom_id: "#swagger-ui", persistAuthorization: true }});
</script>
</body>
</html>
"##,
        title = title,
        dist = SWAGGER_UI_DIST,
        schema = SCHEMA_PATH,
    ))
}

async fn redoc(State(state): State<Arc<AppState>>) -> Html<String> {
    let title = escape_html(&state.settings.docs.title);
    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
</head>
<body>
<redoc spec-url="{schema}"></redoc>
<script src="{bundle}"></script>
</body>
</html>
"#,
        title = title,
        schema = SCHEMA_PATH,
        bundle = REDOC_BUNDLE,
    ))
}
