// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Production profile: TLS enforcement, strict CORS, Redis cache.

use super::env::{self, Lookup};
use super::{CacheSettings, LogHandler, Renderer, Settings};
use tracing::level_filters::LevelFilter;

pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379/1";
/// One year.
pub const HSTS_SECONDS: u64 = 31_536_000;

/// Apply production overrides on top of the base settings.
pub fn apply(settings: &mut Settings, lookup: Lookup<'_>) {
    settings.debug = false;

    let security = &mut settings.security;
    security.browser_xss_filter = true;
    security.content_type_nosniff = true;
    security.ssl_redirect = true;
    security.session_cookie_secure = true;
    security.csrf_cookie_secure = true;
    security.x_frame_options = "DENY".to_string();
    security.hsts_seconds = HSTS_SECONDS;
    security.hsts_include_subdomains = true;
    security.hsts_preload = true;

    settings.cors.allow_all_origins = false;

    settings.cache = CacheSettings::Redis {
        url: env::string(lookup, "REDIS_URL", DEFAULT_REDIS_URL),
    };

    settings.rest.renderers = vec![Renderer::Json];

    settings.logging.root_handlers = vec![LogHandler::Console, LogHandler::File];
    settings.logging.root_level = LevelFilter::WARN;
}
