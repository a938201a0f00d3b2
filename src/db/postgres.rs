// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! PostgreSQL queries on user accounts.

use crate::db::{tables, EMAIL_TAKEN};
use crate::error::AppError;
use crate::models::{NewUser, User, UserStatusUpdate};
use chrono::Utc;
use sqlx::postgres::{PgPool, PgPoolOptions};

const MAX_CONNECTIONS: u32 = 10;
/// Postgres SQLSTATE for unique constraint violations.
const UNIQUE_VIOLATION: &str = "23505";

fn db_error(e: sqlx::Error) -> AppError {
    AppError::Database(e.to_string())
}

pub(super) async fn connect(url: &str) -> Result<PgPool, AppError> {
    PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect(url)
        .await
        .map_err(|e| AppError::Database(format!("Failed to connect to PostgreSQL: {}", e)))
}

pub(super) async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| AppError::Database(format!("Migration failed: {}", e)))
}

pub(super) async fn create_user(pool: &PgPool, user: &NewUser) -> Result<User, AppError> {
    let query = format!(
        "INSERT INTO {} (email, password, first_name, last_name, is_staff)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING *",
        tables::USERS
    );

    sqlx::query_as::<_, User>(&query)
        .bind(user.email.trim().to_lowercase())
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.is_staff)
        .fetch_one(pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                AppError::Conflict(EMAIL_TAKEN.to_string())
            }
            _ => db_error(e),
        })
}

pub(super) async fn get_user(pool: &PgPool, id: i64) -> Result<Option<User>, AppError> {
    let query = format!("SELECT * FROM {} WHERE id = $1", tables::USERS);
    sqlx::query_as::<_, User>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(db_error)
}

pub(super) async fn get_user_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, AppError> {
    let query = format!("SELECT * FROM {} WHERE email = $1", tables::USERS);
    sqlx::query_as::<_, User>(&query)
        .bind(email)
        .fetch_optional(pool)
        .await
        .map_err(db_error)
}

pub(super) async fn update_last_login(pool: &PgPool, id: i64) -> Result<(), AppError> {
    let query = format!("UPDATE {} SET last_login = $1 WHERE id = $2", tables::USERS);
    sqlx::query(&query)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await
        .map_err(db_error)?;
    Ok(())
}

pub(super) async fn count_users(pool: &PgPool) -> Result<u64, AppError> {
    let query = format!("SELECT COUNT(*) FROM {}", tables::USERS);
    let count: i64 = sqlx::query_scalar(&query)
        .fetch_one(pool)
        .await
        .map_err(db_error)?;
    Ok(count.max(0) as u64)
}

pub(super) async fn list_users(pool: &PgPool, offset: i64, limit: i64) -> Result<Vec<User>, AppError> {
    let query = format!(
        "SELECT * FROM {} ORDER BY id LIMIT $1 OFFSET $2",
        tables::USERS
    );
    sqlx::query_as::<_, User>(&query)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .map_err(db_error)
}

pub(super) async fn set_user_status(
    pool: &PgPool,
    id: i64,
    update: &UserStatusUpdate,
) -> Result<Option<User>, AppError> {
    let query = format!(
        "UPDATE {}
         SET is_active = COALESCE($1, is_active), is_staff = COALESCE($2, is_staff)
         WHERE id = $3
         RETURNING *",
        tables::USERS
    );
    sqlx::query_as::<_, User>(&query)
        .bind(update.is_active)
        .bind(update.is_staff)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(db_error)
}

pub(super) async fn ensure_superuser(
    pool: &PgPool,
    email: &str,
    password_hash: &str,
) -> Result<bool, AppError> {
    let query = format!(
        "INSERT INTO {} (email, password, is_staff)
         VALUES ($1, $2, TRUE)
         ON CONFLICT (email) DO NOTHING",
        tables::USERS
    );
    let result = sqlx::query(&query)
        .bind(email)
        .bind(password_hash)
        .execute(pool)
        .await
        .map_err(db_error)?;
    Ok(result.rows_affected() == 1)
}
