//! Query cache: avoids paying the listing provider twice for the same search.
//!
//! Entries live in the store for `cache_ttl` (7 days). Store hits are also
//! memoized in-process for at most [`MEMO_TTL`], never past their own
//! `expires_at`; misses never are. A row deleted from the store (for
//! example by a session delete cascading) stops being served once its memo
//! entry lapses.

use std::time::{Duration, Instant};

use chrono::{TimeDelta, Utc};
use moka::Expiry;
use moka::future::Cache;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{CacheEntry, NewCacheEntry};
use crate::query::normalize_query;
use crate::session::Session;
use crate::traits::CacheStore;

const MEMO_CAPACITY: u64 = 10_000;

/// Longest a store hit is served from memory without re-reading the store.
pub const MEMO_TTL: Duration = Duration::from_secs(5 * 60);

/// A valid cache entry, reduced to what callers need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheHit {
    pub session_id: Uuid,
    pub result_count: u32,
    pub expires_at: chrono::DateTime<Utc>,
}

impl From<&CacheEntry> for CacheHit {
    fn from(entry: &CacheEntry) -> Self {
        Self {
            session_id: entry.session_id,
            result_count: entry.result_count,
            expires_at: entry.expires_at,
        }
    }
}

/// Memo entries die after [`MEMO_TTL`] or when the cache entry does,
/// whichever comes first.
struct UntilExpiry;

impl Expiry<(Uuid, String), CacheHit> for UntilExpiry {
    fn expire_after_create(
        &self,
        _key: &(Uuid, String),
        value: &CacheHit,
        _created_at: Instant,
    ) -> Option<Duration> {
        let remaining = (value.expires_at - Utc::now()).to_std().unwrap_or(Duration::ZERO);
        Some(remaining.min(MEMO_TTL))
    }
}

#[derive(Clone)]
pub struct QueryCache<C: CacheStore> {
    store: C,
    ttl: TimeDelta,
    memo: Cache<(Uuid, String), CacheHit>,
}

impl<C: CacheStore> QueryCache<C> {
    pub fn new(store: C, ttl: TimeDelta) -> Self {
        let memo = Cache::builder()
            .max_capacity(MEMO_CAPACITY)
            .expire_after(UntilExpiry)
            .build();
        Self { store, ttl, memo }
    }

    /// Session id of a non-expired entry for this owner's query, if any.
    pub async fn lookup(&self, business_type: &str, location: &str, owner_id: Uuid) -> Option<Uuid> {
        self.lookup_hit(business_type, location, owner_id)
            .await
            .map(|hit| hit.session_id)
    }

    /// Like [`lookup`](Self::lookup), keeping the entry's result count.
    ///
    /// Store errors are logged and reported as a miss: a broken cache must
    /// never prevent a search.
    pub async fn lookup_hit(
        &self,
        business_type: &str,
        location: &str,
        owner_id: Uuid,
    ) -> Option<CacheHit> {
        let key = (owner_id, normalize_query(business_type, location));
        let now = Utc::now();

        if let Some(hit) = self.memo.get(&key).await {
            if hit.expires_at > now {
                return Some(hit);
            }
            self.memo.invalidate(&key).await;
        }

        match self.store.find_valid(owner_id, &key.1, now).await {
            Ok(Some(entry)) if entry.is_valid_at(now) => {
                let hit = CacheHit::from(&entry);
                tracing::debug!(query = %key.1, session_id = %hit.session_id, "Cache hit");
                self.memo.insert(key, hit).await;
                Some(hit)
            }
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(query = %key.1, error = %e, "Cache lookup failed, treating as miss");
                None
            }
        }
    }

    /// Write a fresh entry for a naturally completed session.
    ///
    /// Never deduplicates: every completed search gets its own row.
    pub async fn record(&self, session: &Session, result_count: u32) -> Result<CacheEntry, AppError> {
        let cached_at = Utc::now();
        let entry = NewCacheEntry {
            owner_id: session.owner_id,
            search_query: session.search_query.clone(),
            session_id: session.id,
            business_type: session.business_type.clone(),
            location: session.location.clone(),
            result_count,
            cached_at,
            expires_at: cached_at + self.ttl,
        };

        let stored = self.store.insert_entry(&entry).await?;
        self.memo
            .insert(
                (stored.owner_id, stored.search_query.clone()),
                CacheHit::from(&stored),
            )
            .await;
        Ok(stored)
    }
}
