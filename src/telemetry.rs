// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Structured JSON logging.

use crate::settings::{LogHandler, LoggingSettings};
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Target of this crate's own events.
const APP_TARGET: &str = "lifeos";
/// Targets of the HTTP framework's request traces.
const FRAMEWORK_TARGETS: [&str; 2] = ["tower_http", "axum"];

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to open log file {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to install subscriber: {0}")]
    Init(#[from] TryInitError),
}

fn level(filter: LevelFilter) -> String {
    filter.to_string().to_lowercase()
}

/// Root level for a handler, `off` when root events are not routed to it.
fn root_level(settings: &LoggingSettings, handler: LogHandler) -> LevelFilter {
    if settings.root_handlers.contains(&handler) {
        settings.root_level
    } else {
        LevelFilter::OFF
    }
}

/// Default console filter, used when `RUST_LOG` is unset.
fn console_directives(settings: &LoggingSettings) -> String {
    let mut directives = level(root_level(settings, LogHandler::Console));
    for target in FRAMEWORK_TARGETS {
        directives.push_str(&format!(",{}={}", target, level(settings.framework_level)));
    }
    directives.push_str(&format!(",{}={}", APP_TARGET, level(settings.apps_level)));
    directives
}

/// Framework traces go to the console only.
fn file_targets(settings: &LoggingSettings) -> Targets {
    FRAMEWORK_TARGETS
        .iter()
        .fold(Targets::new(), |targets, target| {
            targets.with_target(*target, LevelFilter::OFF)
        })
        .with_target(APP_TARGET, settings.apps_level)
        .with_default(root_level(settings, LogHandler::File))
}

/// Install the console and file JSON layers.
pub fn init_logging(settings: &LoggingSettings) -> Result<(), LoggingError> {
    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(console_directives(settings)));

    let console = tracing_subscriber::fmt::layer()
        .json()
        .with_current_span(true)
        .flatten_event(true)
        .with_filter(console_filter);

    let path = &settings.file_path;
    let open = || -> std::io::Result<fs::File> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        OpenOptions::new().create(true).append(true).open(path)
    };
    let file = open().map_err(|source| LoggingError::File {
        path: path.clone(),
        source,
    })?;

    let file_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .with_filter(file_targets(settings));

    tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .try_init()?;

    Ok(())
}
