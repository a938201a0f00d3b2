// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Key-value cache with an in-process or Redis backend.
//!
//! The backend is picked from [`CacheSettings`]: development runs against a
//! per-process map, production against a shared Redis instance so every
//! replica sees the same token blacklist.

use crate::settings::CacheSettings;
use dashmap::mapref::entry::Entry as MapEntry;
use dashmap::DashMap;
use redis::AsyncCommands;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

impl From<CacheError> for crate::error::AppError {
    fn from(err: CacheError) -> Self {
        crate::error::AppError::Cache(err.to_string())
    }
}

#[derive(Debug)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

/// In-process cache.
///
/// Expired entries are dropped when read, and every write sweeps the whole
/// map once the earliest recorded expiry has passed, so keys that are never
/// read again do not accumulate.
#[derive(Debug, Clone, Default)]
pub struct LocalCache {
    location: String,
    entries: Arc<DashMap<String, Entry>>,
    /// Earliest expiry among stored entries, if any entry has a TTL.
    next_expiry: Arc<Mutex<Option<Instant>>>,
}

impl LocalCache {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            ..Self::default()
        }
    }

    fn get(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        let live = self
            .entries
            .get(key)
            .map(|entry| entry.is_live(now).then(|| entry.value.clone()));

        match live {
            Some(Some(value)) => Some(value),
            Some(None) => {
                self.entries.remove_if(key, |_, entry| !entry.is_live(now));
                None
            }
            None => None,
        }
    }

    fn entry(value: &str, ttl: Option<Duration>, now: Instant) -> Entry {
        Entry {
            value: value.to_string(),
            expires_at: ttl.map(|ttl| now + ttl),
        }
    }

    fn set(&self, key: &str, value: &str, ttl: Option<Duration>) {
        let now = Instant::now();
        self.sweep(now);
        let entry = Self::entry(value, ttl, now);
        let expires_at = entry.expires_at;
        self.entries.insert(key.to_string(), entry);
        self.track_expiry(expires_at);
    }

    /// Store the value only if the key is absent or expired.
    fn set_if_absent(&self, key: &str, value: &str, ttl: Option<Duration>) -> bool {
        let now = Instant::now();
        self.sweep(now);
        let entry = Self::entry(value, ttl, now);
        let expires_at = entry.expires_at;

        let stored = match self.entries.entry(key.to_string()) {
            MapEntry::Occupied(mut slot) if !slot.get().is_live(now) => {
                slot.insert(entry);
                true
            }
            MapEntry::Occupied(_) => false,
            MapEntry::Vacant(slot) => {
                slot.insert(entry);
                true
            }
        };

        if stored {
            self.track_expiry(expires_at);
        }
        stored
    }

    fn delete(&self, key: &str) {
        self.entries.remove(key);
    }

    fn next_expiry(&self) -> MutexGuard<'_, Option<Instant>> {
        self.next_expiry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn track_expiry(&self, expires_at: Option<Instant>) {
        let Some(at) = expires_at else {
            return;
        };
        let mut next = self.next_expiry();
        *next = Some(next.map_or(at, |current| current.min(at)));
    }

    /// Drop every expired entry if any entry can have expired by `now`.
    fn sweep(&self, now: Instant) {
        let mut next = self.next_expiry();
        if next.map_or(true, |at| at > now) {
            return;
        }

        self.entries.retain(|_, entry| entry.is_live(now));
        *next = self
            .entries
            .iter()
            .filter_map(|entry| entry.expires_at)
            .min();
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Redis-backed cache sharing one multiplexed connection.
#[derive(Clone)]
pub struct RedisCache {
    url: String,
    conn: redis::aio::ConnectionManager,
}

impl RedisCache {
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)?;
        let conn = redis::aio::ConnectionManager::new(client).await?;
        tracing::info!(url = %redact_url(url), "Connected to Redis");
        Ok(Self {
            url: url.to_string(),
            conn,
        })
    }
}

/// Application cache.
#[derive(Clone)]
pub enum Cache {
    Local(LocalCache),
    Redis(RedisCache),
}

impl Cache {
    /// Open the backend selected by settings.
    pub async fn from_settings(settings: &CacheSettings) -> Result<Self, CacheError> {
        match settings {
            CacheSettings::LocalMemory { location } => Ok(Cache::Local(LocalCache::new(location))),
            CacheSettings::Redis { url } => Ok(Cache::Redis(RedisCache::connect(url).await?)),
        }
    }

    /// In-memory cache for tests and single-process use.
    pub fn local() -> Self {
        Cache::Local(LocalCache::new("default"))
    }

    /// Short description of the backend, safe to expose to staff.
    pub fn describe(&self) -> String {
        match self {
            Cache::Local(local) => format!("local-memory ({})", local.location),
            Cache::Redis(redis) => format!("redis ({})", redact_url(&redis.url)),
        }
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        match self {
            Cache::Local(local) => Ok(local.get(key)),
            Cache::Redis(redis) => {
                let mut conn = redis.conn.clone();
                Ok(conn.get::<_, Option<String>>(key).await?)
            }
        }
    }

    /// Store a value. A `None` TTL keeps the value until deleted.
    pub async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
        match self {
            Cache::Local(local) => {
                local.set(key, value, ttl);
                Ok(())
            }
            Cache::Redis(redis) => {
                let mut conn = redis.conn.clone();
                match ttl {
                    // Redis rejects a zero expiry; round up to one second.
                    Some(ttl) => conn.set_ex::<_, _, ()>(key, value, ttl.as_secs().max(1)).await?,
                    None => conn.set::<_, _, ()>(key, value).await?,
                }
                Ok(())
            }
        }
    }

    /// Store a value unless the key already holds a live one.
    ///
    /// Returns `true` when this call stored the value. The check and the
    /// write are one atomic step on both backends.
    pub async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<bool, CacheError> {
        match self {
            Cache::Local(local) => Ok(local.set_if_absent(key, value, ttl)),
            Cache::Redis(redis) => {
                let mut conn = redis.conn.clone();
                let mut cmd = redis::cmd("SET");
                cmd.arg(key).arg(value).arg("NX");
                if let Some(ttl) = ttl {
                    cmd.arg("EX").arg(ttl.as_secs().max(1));
                }
                // `SET ... NX` replies OK when stored and nil otherwise.
                let reply: Option<String> = cmd.query_async(&mut conn).await?;
                Ok(reply.is_some())
            }
        }
    }

    pub async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        match self {
            Cache::Local(local) => Ok(local.get(key).is_some()),
            Cache::Redis(redis) => {
                let mut conn = redis.conn.clone();
                Ok(conn.exists::<_, bool>(key).await?)
            }
        }
    }

    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        match self {
            Cache::Local(local) => {
                local.delete(key);
                Ok(())
            }
            Cache::Redis(redis) => {
                let mut conn = redis.conn.clone();
                conn.del::<_, ()>(key).await?;
                Ok(())
            }
        }
    }
}

/// Strip credentials from a connection URL before logging it.
pub(crate) fn redact_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***{}", &url[..scheme_end], &url[at..])
        }
        _ => url.to_string(),
    }
}
