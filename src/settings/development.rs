// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Development profile: local work, permissive CORS, verbose logs.

use super::{CacheSettings, Renderer, Settings};
use tracing::level_filters::LevelFilter;

pub const ALLOWED_HOSTS: [&str; 3] = ["localhost", "127.0.0.1", "0.0.0.0"];
pub const CACHE_LOCATION: &str = "lifeos-dev-cache";

/// Apply development overrides on top of the base settings.
pub fn apply(settings: &mut Settings) {
    settings.debug = true;
    settings.allowed_hosts = ALLOWED_HOSTS.iter().map(|h| h.to_string()).collect();

    settings.cors.allow_all_origins = true;

    settings.cache = CacheSettings::LocalMemory {
        location: CACHE_LOCATION.to_string(),
    };

    settings.rest.renderers = vec![Renderer::Json, Renderer::Browsable];

    settings.logging.root_level = LevelFilter::DEBUG;
}
