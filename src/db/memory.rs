// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process user store with the same semantics as the PostgreSQL tables.

use crate::db::EMAIL_TAKEN;
use crate::error::AppError;
use crate::models::{NewUser, User, UserStatusUpdate};
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};

/// Users keyed by lowercase email, so the map entry enforces uniqueness.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: DashMap<String, User>,
    last_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&self, email: String, row: impl FnOnce(i64, String) -> User) -> Option<User> {
        match self.users.entry(email.clone()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                let id = self.last_id.fetch_add(1, Ordering::Relaxed) + 1;
                Some(slot.insert(row(id, email)).clone())
            }
        }
    }

    pub fn create_user(&self, user: &NewUser) -> Result<User, AppError> {
        self.insert(user.email.trim().to_lowercase(), |id, email| User {
            id,
            email,
            password: user.password_hash.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_active: true,
            is_staff: user.is_staff,
            date_joined: Utc::now(),
            last_login: None,
        })
        .ok_or_else(|| AppError::Conflict(EMAIL_TAKEN.to_string()))
    }

    pub fn get_user(&self, id: i64) -> Option<User> {
        self.users
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| entry.value().clone())
    }

    pub fn get_user_by_email(&self, email: &str) -> Option<User> {
        self.users.get(email).map(|entry| entry.value().clone())
    }

    pub fn update_last_login(&self, id: i64) {
        if let Some(mut entry) = self.users.iter_mut().find(|entry| entry.id == id) {
            entry.last_login = Some(Utc::now());
        }
    }

    pub fn count_users(&self) -> u64 {
        self.users.len() as u64
    }

    pub fn list_users(&self, offset: i64, limit: i64) -> Vec<User> {
        let mut users: Vec<User> = self.users.iter().map(|entry| entry.value().clone()).collect();
        users.sort_by_key(|u| u.id);
        users
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect()
    }

    pub fn set_user_status(&self, id: i64, update: &UserStatusUpdate) -> Option<User> {
        let mut entry = self.users.iter_mut().find(|entry| entry.id == id)?;
        if let Some(is_active) = update.is_active {
            entry.is_active = is_active;
        }
        if let Some(is_staff) = update.is_staff {
            entry.is_staff = is_staff;
        }
        Some(entry.value().clone())
    }

    pub fn ensure_superuser(&self, email: &str, password_hash: &str) -> bool {
        self.insert(email.to_string(), |id, email| User {
            id,
            email,
            password: password_hash.to_string(),
            first_name: String::new(),
            last_name: String::new(),
            is_active: true,
            is_staff: true,
            date_joined: Utc::now(),
            last_login: None,
        })
        .is_some()
    }
}
