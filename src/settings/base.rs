// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Base settings shared by every profile.

use super::env::{self, Lookup};
use super::{
    ApiDocsSettings, ApiTag, CacheSettings, ConfigError, CorsSettings, DatabaseSettings,
    JwtSettings, LogHandler, LoggingSettings, PasswordPolicySettings, Profile, Renderer,
    RestSettings, SecuritySettings, Settings, SuperuserSettings,
};
use chrono::Duration;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

pub const DEFAULT_ALLOWED_HOSTS: &str = "localhost,127.0.0.1";
pub const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";
pub const DEFAULT_PORT: u16 = 8000;

const DEFAULT_ACCESS_MINUTES: i64 = 60;
const DEFAULT_REFRESH_DAYS: i64 = 7;

/// Documentation tags, one per API domain.
const TAGS: [(&str, &str); 9] = [
    ("Auth", "Authentication & User Management"),
    ("Dashboard", "Dashboard, Quotes & Vision Board"),
    ("Goals", "Goals & Milestones"),
    ("Calendar", "Calendar Events"),
    ("Journal", "Journal Entries & Mood Tracking"),
    ("Game Plan", "Quarterly Planning"),
    ("Learning", "Courses & Education Tracking"),
    ("Finance", "Transactions, Savings & Investments"),
    ("Health", "Workouts, Logs & Achievements"),
];

pub(super) fn settings(lookup: Lookup<'_>, profile: Profile) -> Result<Settings, ConfigError> {
    let base_dir = PathBuf::from(env::string(lookup, "BASE_DIR", "."));

    let access_minutes = env::parse(lookup, "JWT_ACCESS_TOKEN_LIFETIME_MINUTES", DEFAULT_ACCESS_MINUTES)?;
    let refresh_days = env::parse(lookup, "JWT_REFRESH_TOKEN_LIFETIME_DAYS", DEFAULT_REFRESH_DAYS)?;
    if access_minutes <= 0 {
        return Err(ConfigError::Invalid {
            key: "JWT_ACCESS_TOKEN_LIFETIME_MINUTES",
            value: access_minutes.to_string(),
        });
    }
    if refresh_days <= 0 {
        return Err(ConfigError::Invalid {
            key: "JWT_REFRESH_TOKEN_LIFETIME_DAYS",
            value: refresh_days.to_string(),
        });
    }

    let superuser = match (
        lookup("LIFEOS_SUPERUSER_EMAIL"),
        lookup("LIFEOS_SUPERUSER_PASSWORD"),
    ) {
        (Some(email), Some(password)) if !email.trim().is_empty() && !password.is_empty() => {
            Some(SuperuserSettings {
                email: email.trim().to_lowercase(),
                password,
            })
        }
        _ => None,
    };

    Ok(Settings {
        profile,
        secret_key: env::required(lookup, "SECRET_KEY")?,
        debug: env::flag(lookup, "DEBUG", false)?,
        allowed_hosts: env::csv(lookup, "ALLOWED_HOSTS", DEFAULT_ALLOWED_HOSTS),

        port: env::parse(lookup, "PORT", DEFAULT_PORT)?,
        time_zone: chrono_tz::Africa::Johannesburg,
        media_url: "/media/".to_string(),
        media_root: base_dir.join("media"),
        static_url: "/static/".to_string(),
        static_root: base_dir.join("staticfiles"),

        database: DatabaseSettings {
            name: env::string(lookup, "DB_NAME", "lifeos_db"),
            user: env::string(lookup, "DB_USER", "lifeos_user"),
            password: env::string(lookup, "DB_PASSWORD", ""),
            host: env::string(lookup, "DB_HOST", "localhost"),
            port: env::parse(lookup, "DB_PORT", 5432)?,
        },

        jwt: JwtSettings {
            access_token_lifetime: Duration::minutes(access_minutes),
            refresh_token_lifetime: Duration::days(refresh_days),
            rotate_refresh_tokens: true,
            blacklist_after_rotation: true,
            update_last_login: true,
            auth_header_types: vec!["Bearer".to_string()],
            user_id_claim: "user_id".to_string(),
        },

        cors: CorsSettings {
            allowed_origins: env::csv(lookup, "CORS_ALLOWED_ORIGINS", DEFAULT_CORS_ORIGINS),
            allow_all_origins: false,
            allow_credentials: true,
        },

        cache: CacheSettings::LocalMemory {
            location: String::new(),
        },

        security: SecuritySettings {
            ssl_redirect: false,
            session_cookie_secure: false,
            csrf_cookie_secure: false,
            content_type_nosniff: true,
            browser_xss_filter: false,
            x_frame_options: "DENY".to_string(),
            hsts_seconds: 0,
            hsts_include_subdomains: false,
            hsts_preload: false,
            referrer_policy: "same-origin".to_string(),
            cross_origin_opener_policy: "same-origin".to_string(),
            trust_forwarded_proto: env::flag(lookup, "TRUST_X_FORWARDED_PROTO", false)?,
        },

        rest: RestSettings {
            page_size: 20,
            renderers: vec![Renderer::Json, Renderer::Browsable],
            datetime_format: "%Y-%m-%dT%H:%M:%S%z".to_string(),
            date_format: "%Y-%m-%d".to_string(),
        },

        docs: ApiDocsSettings {
            title: "Life OS 2026 API".to_string(),
            description: "Personal Life Management System — API Documentation".to_string(),
            version: "1.0.0".to_string(),
            schema_path_prefix: "/api/v1/".to_string(),
            serve_include_schema: false,
            tags: TAGS
                .iter()
                .map(|(name, description)| ApiTag {
                    name: name.to_string(),
                    description: description.to_string(),
                })
                .collect(),
        },

        logging: LoggingSettings {
            root_level: LevelFilter::INFO,
            root_handlers: vec![LogHandler::Console],
            apps_level: LevelFilter::DEBUG,
            framework_level: LevelFilter::INFO,
            file_path: base_dir.join("logs").join("lifeos.log"),
        },

        passwords: PasswordPolicySettings {
            min_length: 8,
            user_attribute_similarity: true,
            common_passwords: true,
            numeric: true,
        },

        superuser,
        base_dir,
    })
}
