// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application settings, layered by profile.
//!
//! Settings are built in two steps. The base layer reads the environment and
//! fills in defaults shared by every deployment; then the selected profile
//! (development or production) replaces individual values. A later layer
//! always wins for the keys it sets, nothing is merged.

mod base;
pub mod development;
pub mod env;
pub mod production;

use chrono::Duration;
use chrono_tz::Tz;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::level_filters::LevelFilter;

use env::Lookup;

/// Environment variable selecting the settings profile.
pub const PROFILE_VAR: &str = "LIFEOS_SETTINGS";

/// Settings profile layered on top of the base settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Development,
    Production,
}

impl Profile {
    pub fn as_str(self) -> &'static str {
        match self {
            Profile::Development => "development",
            Profile::Production => "production",
        }
    }
}

impl FromStr for Profile {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Profile::Development),
            "production" | "prod" => Ok(Profile::Production),
            other => Err(ConfigError::UnknownProfile(other.to_string())),
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// PostgreSQL connection parameters.
#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub name: String,
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
}

impl DatabaseSettings {
    /// Connection URL in the form sqlx expects.
    pub fn url(&self) -> String {
        if self.password.is_empty() {
            format!(
                "postgres://{}@{}:{}/{}",
                self.user, self.host, self.port, self.name
            )
        } else {
            format!(
                "postgres://{}:{}@{}:{}/{}",
                self.user, self.password, self.host, self.port, self.name
            )
        }
    }
}

/// JWT issuance and verification.
#[derive(Debug, Clone)]
pub struct JwtSettings {
    pub access_token_lifetime: Duration,
    pub refresh_token_lifetime: Duration,
    /// Issue a new refresh token on every refresh.
    pub rotate_refresh_tokens: bool,
    /// Blacklist the old refresh token once it has been rotated.
    pub blacklist_after_rotation: bool,
    /// Record `last_login` when a token pair is obtained.
    pub update_last_login: bool,
    /// Accepted `Authorization` schemes.
    pub auth_header_types: Vec<String>,
    /// Claim carrying the user id.
    pub user_id_claim: String,
}

#[derive(Debug, Clone)]
pub struct CorsSettings {
    pub allowed_origins: Vec<String>,
    pub allow_all_origins: bool,
    pub allow_credentials: bool,
}

/// Cache backend selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheSettings {
    /// Per-process in-memory cache.
    LocalMemory { location: String },
    /// Shared Redis cache.
    Redis { url: String },
}

/// HTTP security headers and TLS enforcement.
#[derive(Debug, Clone)]
pub struct SecuritySettings {
    pub ssl_redirect: bool,
    pub session_cookie_secure: bool,
    pub csrf_cookie_secure: bool,
    pub content_type_nosniff: bool,
    pub browser_xss_filter: bool,
    pub x_frame_options: String,
    pub hsts_seconds: u64,
    pub hsts_include_subdomains: bool,
    pub hsts_preload: bool,
    pub referrer_policy: String,
    pub cross_origin_opener_policy: String,
    /// Treat `X-Forwarded-Proto: https` as a secure request. Only safe
    /// behind a proxy that overwrites the header.
    pub trust_forwarded_proto: bool,
}

/// Response renderers available to API views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Renderer {
    Json,
    /// HTML page wrapping the JSON body, for browsing the API by hand.
    Browsable,
}

#[derive(Debug, Clone)]
pub struct RestSettings {
    pub page_size: u32,
    pub renderers: Vec<Renderer>,
    /// strftime format for timestamps in responses.
    pub datetime_format: String,
    /// strftime format for dates in responses.
    pub date_format: String,
}

impl RestSettings {
    pub fn browsable(&self) -> bool {
        self.renderers.contains(&Renderer::Browsable)
    }
}

/// A documentation tag (one per API domain).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiTag {
    pub name: String,
    pub description: String,
}

/// OpenAPI document metadata.
#[derive(Debug, Clone)]
pub struct ApiDocsSettings {
    pub title: String,
    pub description: String,
    pub version: String,
    /// Only paths under this prefix appear in the schema.
    pub schema_path_prefix: String,
    /// Whether the schema view itself is listed in the schema.
    pub serve_include_schema: bool,
    pub tags: Vec<ApiTag>,
}

impl ApiDocsSettings {
    /// Description of the tag with the given name.
    pub fn tag_description(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|tag| tag.name == name)
            .map(|tag| tag.description.as_str())
    }
}

/// Log output targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogHandler {
    Console,
    File,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    /// Level for all targets other than this crate.
    pub root_level: LevelFilter,
    pub root_handlers: Vec<LogHandler>,
    /// Level for this crate's own events (always console and file).
    pub apps_level: LevelFilter,
    /// Level for the HTTP framework's request traces (console only,
    /// independent of the root level).
    pub framework_level: LevelFilter,
    pub file_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct PasswordPolicySettings {
    pub min_length: usize,
    pub user_attribute_similarity: bool,
    pub common_passwords: bool,
    pub numeric: bool,
}

/// Credentials for the staff account created at startup.
#[derive(Clone)]
pub struct SuperuserSettings {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for SuperuserSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuperuserSettings")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Fully resolved application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub profile: Profile,

    // --- Security ---
    /// Signing key for tokens
    pub secret_key: String,
    pub debug: bool,
    pub allowed_hosts: Vec<String>,

    // --- Server ---
    pub port: u16,
    pub base_dir: PathBuf,
    pub time_zone: Tz,
    pub media_url: String,
    pub media_root: PathBuf,
    pub static_url: String,
    pub static_root: PathBuf,

    pub database: DatabaseSettings,
    pub jwt: JwtSettings,
    pub cors: CorsSettings,
    pub cache: CacheSettings,
    pub security: SecuritySettings,
    pub rest: RestSettings,
    pub docs: ApiDocsSettings,
    pub logging: LoggingSettings,
    pub passwords: PasswordPolicySettings,
    pub superuser: Option<SuperuserSettings>,
}

impl Settings {
    /// Load settings from `.env` (if present) and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key: &str| std::env::var(key).ok())
    }

    /// Resolve the profile and build settings from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup: Lookup<'_> = &lookup;

        let profile = match lookup(PROFILE_VAR) {
            Some(raw) => raw.parse()?,
            None => Profile::Development,
        };

        let mut settings = base::settings(lookup, profile)?;
        match profile {
            Profile::Development => development::apply(&mut settings),
            Profile::Production => production::apply(&mut settings, lookup),
        }

        Ok(settings)
    }

    /// Deployment checks. These never prevent startup; the caller logs them.
    pub fn deploy_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        let distinct_chars = {
            let mut chars: Vec<char> = self.secret_key.chars().collect();
            chars.sort_unstable();
            chars.dedup();
            chars.len()
        };
        if self.secret_key.len() < 50 || distinct_chars < 5 {
            warnings.push(
                "SECRET_KEY has fewer than 50 characters or fewer than 5 unique characters"
                    .to_string(),
            );
        }

        if self.profile == Profile::Production {
            if self.debug {
                warnings.push("DEBUG is enabled in the production profile".to_string());
            }
            if self.security.hsts_seconds == 0 {
                warnings.push("HSTS is disabled".to_string());
            }
            if !self.security.ssl_redirect {
                warnings.push("SSL redirect is disabled".to_string());
            }
            if self.allowed_hosts.iter().any(|h| h == "*") {
                warnings.push("ALLOWED_HOSTS accepts any host".to_string());
            }
        }

        warnings
    }

    /// Default settings for testing only.
    ///
    /// Development profile with a fixed secret key and no environment access.
    pub fn test_default() -> Self {
        Self::from_lookup(|key: &str| match key {
            "SECRET_KEY" => Some("test-secret-key-that-is-long-enough-for-hs256-signing".to_string()),
            _ => None,
        })
        .expect("test settings must resolve")
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },

    #[error("Unknown settings profile {0:?} (expected 'development' or 'production')")]
    UnknownProfile(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_with(pairs: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key: &str| vars.get(key).cloned())
    }

    #[test]
    fn test_profile_defaults_to_development() {
        let settings = settings_with(&[("SECRET_KEY", "k")]).unwrap();
        assert_eq!(settings.profile, Profile::Development);
    }

    #[test]
    fn test_profile_aliases() {
        assert_eq!("prod".parse::<Profile>().unwrap(), Profile::Production);
        assert_eq!("Development".parse::<Profile>().unwrap(), Profile::Development);
        assert!(matches!(
            "staging".parse::<Profile>(),
            Err(ConfigError::UnknownProfile(p)) if p == "staging"
        ));
    }

    #[test]
    fn test_missing_secret_key() {
        let err = settings_with(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("SECRET_KEY")));
    }

    #[test]
    fn test_database_url() {
        let settings = settings_with(&[("SECRET_KEY", "k")]).unwrap();
        assert_eq!(
            settings.database.url(),
            "postgres://lifeos_user@localhost:5432/lifeos_db"
        );

        let settings = settings_with(&[
            ("SECRET_KEY", "k"),
            ("DB_PASSWORD", "pw"),
            ("DB_HOST", "db"),
            ("DB_PORT", "6543"),
        ])
        .unwrap();
        assert_eq!(settings.database.url(), "postgres://lifeos_user:pw@db:6543/lifeos_db");
    }

    #[test]
    fn test_deploy_warnings_short_key() {
        let settings = settings_with(&[("SECRET_KEY", "short")]).unwrap();
        let warnings = settings.deploy_warnings();
        assert!(warnings.iter().any(|w| w.contains("SECRET_KEY")));
    }

    #[test]
    fn test_deploy_warnings_clean_production() {
        let key = "a1b2c3d4e5f6g7h8i9j0k1l2m3n4o5p6q7r8s9t0u1v2w3x4y5z6";
        let settings = settings_with(&[("SECRET_KEY", key), (PROFILE_VAR, "production")]).unwrap();
        assert!(settings.deploy_warnings().is_empty());
    }

    #[test]
    fn test_superuser_debug_redacts_password() {
        let su = SuperuserSettings {
            email: "root@example.com".to_string(),
            password: "hunter22".to_string(),
        };
        let rendered = format!("{:?}", su);
        assert!(!rendered.contains("hunter22"));
    }
}
