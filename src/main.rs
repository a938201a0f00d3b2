// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Life OS API Server
//!
//! Personal life-management backend: goals, calendar, journal, game plan,
//! learning, finance and health, behind JWT authentication.

use lifeos::{cache::Cache, db::Database, settings::Settings, telemetry, AppState};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;
    telemetry::init_logging(&settings.logging)?;

    tracing::info!(
        profile = %settings.profile,
        port = settings.port,
        debug = settings.debug,
        "Starting Life OS API"
    );
    for warning in settings.deploy_warnings() {
        tracing::warn!(check = %warning, "Deployment check failed");
    }

    let db = Database::connect(&settings.database).await?;
    db.run_migrations().await?;
    tracing::info!(host = %settings.database.host, name = %settings.database.name, "Database ready");

    let cache = Cache::from_settings(&settings.cache).await?;
    tracing::info!(cache = %cache.describe(), "Cache initialized");

    let state = Arc::new(AppState::new(settings, db, cache));
    bootstrap_superuser(&state).await?;

    let app = lifeos::routes::create_router(state.clone());

    let addr = format!("0.0.0.0:{}", state.settings.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Create the configured staff account if it does not exist yet.
async fn bootstrap_superuser(state: &AppState) -> anyhow::Result<()> {
    let Some(superuser) = state.settings.superuser.clone() else {
        return Ok(());
    };

    let hasher = state.hasher.clone();
    let password = superuser.password;
    let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password)).await??;

    let email = superuser.email.trim().to_lowercase();
    if state.db.ensure_superuser(&email, &password_hash).await? {
        tracing::info!(email = %email, "Created superuser");
    } else {
        tracing::debug!(email = %email, "Superuser already exists");
    }
    Ok(())
}
