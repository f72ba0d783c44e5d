use scout_core::error::AppError;
use scout_core::models::NewSearchLogEntry;
use scout_core::traits::SearchLogStore;
use uuid::Uuid;

use crate::store::{PgStore, persistence};

impl SearchLogStore for PgStore {
    async fn append(&self, entry: &NewSearchLogEntry) -> Result<Uuid, AppError> {
        let row: (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO search_logs (owner_id, business_type, location, result_count, was_cached)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(entry.owner_id)
        .bind(&entry.business_type)
        .bind(&entry.location)
        .bind(entry.result_count as i32)
        .bind(entry.was_cached)
        .fetch_one(&self.pool)
        .await
        .map_err(persistence)?;

        Ok(row.0)
    }
}
