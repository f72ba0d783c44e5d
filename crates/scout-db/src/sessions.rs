use chrono::{DateTime, Utc};
use scout_core::error::AppError;
use scout_core::session::{NewSession, ProcessingStatus, Session, SessionStatus};
use scout_core::traits::SessionStore;
use uuid::Uuid;

use crate::store::{PgStore, persistence};

// -- Internal row type for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct SessionRow {
    id: Uuid,
    owner_id: Uuid,
    business_type: String,
    location: String,
    search_query: String,
    status: String,
    total_records: i32,
    processing_status: String,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        Session {
            id: row.id,
            owner_id: row.owner_id,
            business_type: row.business_type,
            location: row.location,
            search_query: row.search_query,
            status: row.status.parse().unwrap_or(SessionStatus::Running),
            total_records: row.total_records.max(0) as u32,
            processing_status: row
                .processing_status
                .parse()
                .unwrap_or(ProcessingStatus::Pending),
            created_at: row.created_at,
            completed_at: row.completed_at,
        }
    }
}

impl SessionStore for PgStore {
    async fn create_session(&self, session: &NewSession) -> Result<Session, AppError> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            INSERT INTO sessions (owner_id, business_type, location, search_query)
            VALUES ($1, $2, $3, $4)
            RETURNING id, owner_id, business_type, location, search_query, status,
                      total_records, processing_status, created_at, completed_at
            "#,
        )
        .bind(session.owner_id)
        .bind(&session.business_type)
        .bind(&session.location)
        .bind(&session.search_query)
        .fetch_one(&self.pool)
        .await
        .map_err(persistence)?;

        Ok(row.into())
    }

    async fn get_session(
        &self,
        session_id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<Session>, AppError> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT id, owner_id, business_type, location, search_query, status,
                   total_records, processing_status, created_at, completed_at
            FROM sessions
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(session_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(persistence)?;

        Ok(row.map(Into::into))
    }

    async fn update_status(
        &self,
        session_id: Uuid,
        status: SessionStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE sessions
            SET status = $2, completed_at = COALESCE($3, completed_at)
            WHERE id = $1 AND status NOT IN ('completed', 'failed')
            "#,
        )
        .bind(session_id)
        .bind(status.as_str())
        .bind(completed_at)
        .execute(&self.pool)
        .await
        .map_err(persistence)?;

        Ok(())
    }

    async fn set_total_records(&self, session_id: Uuid, total_records: u32) -> Result<(), AppError> {
        // GREATEST keeps the counter monotonic under replays.
        sqlx::query(
            r#"
            UPDATE sessions
            SET total_records = GREATEST(total_records, $2)
            WHERE id = $1
            "#,
        )
        .bind(session_id)
        .bind(total_records as i32)
        .execute(&self.pool)
        .await
        .map_err(persistence)?;

        Ok(())
    }

    async fn set_processing_status(
        &self,
        session_id: Uuid,
        status: ProcessingStatus,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE sessions SET processing_status = $2 WHERE id = $1")
            .bind(session_id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await
            .map_err(persistence)?;

        Ok(())
    }
}
