// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User account model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// User account stored in the `users` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    /// Login identifier, stored lowercase
    pub email: String,
    /// Encoded password hash (`pbkdf2_sha256$...`)
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// Fields needed to insert a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,
}

/// Staff change to an account's flags. Omitted fields are left as they are.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserStatusUpdate {
    pub is_active: Option<bool>,
    pub is_staff: Option<bool>,
}

/// Public view of a user.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub date_joined: String,
    pub last_login: Option<String>,
}

impl User {
    /// Render for API output, formatting timestamps with `datetime_format`
    /// in the given time zone.
    pub fn to_response(&self, datetime_format: &str, tz: chrono_tz::Tz) -> UserResponse {
        let format = |t: DateTime<Utc>| t.with_timezone(&tz).format(datetime_format).to_string();
        UserResponse {
            id: self.id,
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            is_active: self.is_active,
            is_staff: self.is_staff,
            date_joined: format(self.date_joined),
            last_login: self.last_login.map(format),
        }
    }
}
