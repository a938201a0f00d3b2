// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (authentication, security, etc.).

pub mod auth;
pub mod hosts;
pub mod render;
pub mod security;

pub use auth::{require_auth, require_staff, AuthUser};
