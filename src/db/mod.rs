// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! [`Database`] fronts one of three backends: a PostgreSQL pool, an
//! in-process store (tests and throwaway local runs), or an offline stub
//! whose every operation fails.

pub mod memory;
pub mod postgres;

use crate::error::AppError;
use crate::models::{NewUser, User, UserStatusUpdate};
use crate::settings::DatabaseSettings;
use memory::MemoryStore;
use sqlx::postgres::PgPool;
use std::sync::Arc;

/// Table names as constants.
pub mod tables {
    pub const USERS: &str = "users";
}

pub(crate) const EMAIL_TAKEN: &str = "A user with that email already exists";

#[derive(Clone)]
enum Backend {
    Postgres(PgPool),
    Memory(Arc<MemoryStore>),
    Offline,
}

/// User account storage.
#[derive(Clone)]
pub struct Database {
    backend: Backend,
}

impl Database {
    /// Connect to PostgreSQL.
    pub async fn connect(settings: &DatabaseSettings) -> Result<Self, AppError> {
        let pool = postgres::connect(&settings.url()).await?;

        tracing::info!(
            host = %settings.host,
            port = settings.port,
            database = %settings.name,
            "Connected to PostgreSQL"
        );

        Ok(Self {
            backend: Backend::Postgres(pool),
        })
    }

    /// Connect to PostgreSQL with a full connection URL.
    pub async fn connect_url(url: &str) -> Result<Self, AppError> {
        Ok(Self {
            backend: Backend::Postgres(postgres::connect(url).await?),
        })
    }

    /// Create a mock database for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self {
            backend: Backend::Offline,
        }
    }

    /// Empty in-process store. Data lives as long as the last clone.
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(MemoryStore::new())),
        }
    }

    fn offline() -> AppError {
        AppError::Database("Database not connected (offline mode)".to_string())
    }

    /// Apply migrations located under `migrations/`.
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        match &self.backend {
            Backend::Postgres(pool) => postgres::run_migrations(pool).await,
            Backend::Memory(_) => Ok(()),
            Backend::Offline => Err(Self::offline()),
        }
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Insert a user. Fails with `Conflict` when the email is taken.
    pub async fn create_user(&self, user: &NewUser) -> Result<User, AppError> {
        match &self.backend {
            Backend::Postgres(pool) => postgres::create_user(pool, user).await,
            Backend::Memory(store) => store.create_user(user),
            Backend::Offline => Err(Self::offline()),
        }
    }

    /// Get a user by id.
    pub async fn get_user(&self, id: i64) -> Result<Option<User>, AppError> {
        match &self.backend {
            Backend::Postgres(pool) => postgres::get_user(pool, id).await,
            Backend::Memory(store) => Ok(store.get_user(id)),
            Backend::Offline => Err(Self::offline()),
        }
    }

    /// Get a user by (case-insensitive) email.
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let email = email.trim().to_lowercase();
        match &self.backend {
            Backend::Postgres(pool) => postgres::get_user_by_email(pool, &email).await,
            Backend::Memory(store) => Ok(store.get_user_by_email(&email)),
            Backend::Offline => Err(Self::offline()),
        }
    }

    /// Record a successful login.
    pub async fn update_last_login(&self, id: i64) -> Result<(), AppError> {
        match &self.backend {
            Backend::Postgres(pool) => postgres::update_last_login(pool, id).await,
            Backend::Memory(store) => {
                store.update_last_login(id);
                Ok(())
            }
            Backend::Offline => Err(Self::offline()),
        }
    }

    pub async fn count_users(&self) -> Result<u64, AppError> {
        match &self.backend {
            Backend::Postgres(pool) => postgres::count_users(pool).await,
            Backend::Memory(store) => Ok(store.count_users()),
            Backend::Offline => Err(Self::offline()),
        }
    }

    /// List users ordered by id.
    pub async fn list_users(&self, offset: i64, limit: i64) -> Result<Vec<User>, AppError> {
        match &self.backend {
            Backend::Postgres(pool) => postgres::list_users(pool, offset, limit).await,
            Backend::Memory(store) => Ok(store.list_users(offset, limit)),
            Backend::Offline => Err(Self::offline()),
        }
    }

    /// Change the active and staff flags. Unset fields keep their value.
    ///
    /// Returns the updated row, or `None` when no such user exists.
    pub async fn set_user_status(
        &self,
        id: i64,
        update: &UserStatusUpdate,
    ) -> Result<Option<User>, AppError> {
        match &self.backend {
            Backend::Postgres(pool) => postgres::set_user_status(pool, id, update).await,
            Backend::Memory(store) => Ok(store.set_user_status(id, update)),
            Backend::Offline => Err(Self::offline()),
        }
    }

    /// Create the staff account if no user with that email exists yet.
    ///
    /// Returns `true` when a new account was created.
    pub async fn ensure_superuser(&self, email: &str, password_hash: &str) -> Result<bool, AppError> {
        let email = email.trim().to_lowercase();
        match &self.backend {
            Backend::Postgres(pool) => postgres::ensure_superuser(pool, &email, password_hash).await,
            Backend::Memory(store) => Ok(store.ensure_superuser(&email, password_hash)),
            Backend::Offline => Err(Self::offline()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password_hash: "pbkdf2_sha256$1$c2FsdA==$aGFzaA==".to_string(),
            first_name: "Ada".to_string(),
            last_name: String::new(),
            is_staff: false,
        }
    }

    #[tokio::test]
    async fn test_mock_database_reports_offline() {
        let db = Database::new_mock();
        let err = db.get_user(1).await.unwrap_err();
        assert!(matches!(err, AppError::Database(msg) if msg.contains("offline")));
        assert!(db.set_user_status(1, &UserStatusUpdate::default()).await.is_err());
    }

    #[tokio::test]
    async fn test_memory_user_lifecycle() {
        let db = Database::in_memory();
        let ada = db.create_user(&new_user("Ada@Example.com")).await.unwrap();
        assert_eq!(ada.email, "ada@example.com");
        assert!(ada.is_active);

        let found = db.get_user_by_email(" ADA@example.com ").await.unwrap().unwrap();
        assert_eq!(found.id, ada.id);

        let err = db.create_user(&new_user("ada@example.com")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        db.update_last_login(ada.id).await.unwrap();
        assert!(db.get_user(ada.id).await.unwrap().unwrap().last_login.is_some());
    }

    #[tokio::test]
    async fn test_memory_listing_is_ordered_by_id() {
        let db = Database::in_memory();
        for n in 0..5 {
            db.create_user(&new_user(&format!("user{}@example.com", n)))
                .await
                .unwrap();
        }

        assert_eq!(db.count_users().await.unwrap(), 5);
        let page = db.list_users(1, 2).await.unwrap();
        let emails: Vec<&str> = page.iter().map(|u| u.email.as_str()).collect();
        assert_eq!(emails, ["user1@example.com", "user2@example.com"]);
    }

    #[tokio::test]
    async fn test_memory_status_update() {
        let db = Database::in_memory();
        let user = db.create_user(&new_user("grace@example.com")).await.unwrap();

        let updated = db
            .set_user_status(
                user.id,
                &UserStatusUpdate {
                    is_active: None,
                    is_staff: Some(true),
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert!(updated.is_staff);
        assert!(updated.is_active);

        let missing = db
            .set_user_status(user.id + 100, &UserStatusUpdate::default())
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_memory_ensure_superuser_once() {
        let db = Database::in_memory();
        assert!(db.ensure_superuser("Root@Example.com", "hash").await.unwrap());
        assert!(!db.ensure_superuser("root@example.com", "other").await.unwrap());

        let root = db.get_user_by_email("root@example.com").await.unwrap().unwrap();
        assert!(root.is_staff);
        assert_eq!(root.password, "hash");
    }
}
