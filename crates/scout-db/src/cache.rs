use chrono::{DateTime, Utc};
use scout_core::error::AppError;
use scout_core::models::{CacheEntry, NewCacheEntry};
use scout_core::traits::CacheStore;
use uuid::Uuid;

use crate::store::{PgStore, persistence};

#[derive(sqlx::FromRow)]
struct CacheEntryRow {
    id: Uuid,
    owner_id: Uuid,
    search_query: String,
    session_id: Uuid,
    business_type: String,
    location: String,
    result_count: i32,
    cached_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl From<CacheEntryRow> for CacheEntry {
    fn from(row: CacheEntryRow) -> Self {
        CacheEntry {
            id: row.id,
            owner_id: row.owner_id,
            search_query: row.search_query,
            session_id: row.session_id,
            business_type: row.business_type,
            location: row.location,
            result_count: row.result_count.max(0) as u32,
            cached_at: row.cached_at,
            expires_at: row.expires_at,
        }
    }
}

impl CacheStore for PgStore {
    async fn find_valid(
        &self,
        owner_id: Uuid,
        search_query: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<CacheEntry>, AppError> {
        let row = sqlx::query_as::<_, CacheEntryRow>(
            r#"
            SELECT id, owner_id, search_query, session_id, business_type, location,
                   result_count, cached_at, expires_at
            FROM search_cache
            WHERE owner_id = $1 AND search_query = $2 AND expires_at > $3
            ORDER BY cached_at DESC
            LIMIT 1
            "#,
        )
        .bind(owner_id)
        .bind(search_query)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::CacheLookupError(e.to_string()))?;

        Ok(row.map(Into::into))
    }

    async fn insert_entry(&self, entry: &NewCacheEntry) -> Result<CacheEntry, AppError> {
        let row = sqlx::query_as::<_, CacheEntryRow>(
            r#"
            INSERT INTO search_cache (
                owner_id, search_query, session_id, business_type, location,
                result_count, cached_at, expires_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, owner_id, search_query, session_id, business_type, location,
                      result_count, cached_at, expires_at
            "#,
        )
        .bind(entry.owner_id)
        .bind(&entry.search_query)
        .bind(entry.session_id)
        .bind(&entry.business_type)
        .bind(&entry.location)
        .bind(entry.result_count as i32)
        .bind(entry.cached_at)
        .bind(entry.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(persistence)?;

        Ok(row.into())
    }
}
