// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Life OS: backend service for a personal life-management system.
//!
//! This crate provides the configuration, authentication and routing
//! skeleton that the goals, calendar, journal, game plan, learning, finance
//! and health domains are mounted on.

pub mod cache;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod settings;
pub mod telemetry;

use cache::Cache;
use db::Database;
use services::{PasswordHasher, PasswordPolicy, TokenService};
use settings::Settings;

/// Shared application state.
pub struct AppState {
    pub settings: Settings,
    pub db: Database,
    pub cache: Cache,
    pub tokens: TokenService,
    pub hasher: PasswordHasher,
    pub password_policy: PasswordPolicy,
}

impl AppState {
    pub fn new(settings: Settings, db: Database, cache: Cache) -> Self {
        let tokens = TokenService::new(settings.jwt.clone(), &settings.secret_key, cache.clone());
        let password_policy = PasswordPolicy::new(settings.passwords.clone());
        Self {
            settings,
            db,
            cache,
            tokens,
            hasher: PasswordHasher::default(),
            password_policy,
        }
    }

    /// Replace the password hasher, e.g. with fewer iterations in tests.
    pub fn with_hasher(mut self, hasher: PasswordHasher) -> Self {
        self.hasher = hasher;
        self
    }
}
