use chrono::{DateTime, Utc};
use scout_core::error::AppError;
use scout_core::models::{NewProcessedListing, NewRawListing, ProcessedListing, RawListing};
use scout_core::traits::ListingStore;
use sqlx::types::Json;
use uuid::Uuid;

use crate::store::{LISTING_SELECT, ListingColumns, PgStore, persistence};

// -- Internal row types for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct RawListingRow {
    id: Uuid,
    session_id: Uuid,
    ordinal: i32,
    #[sqlx(flatten)]
    listing: ListingColumns,
    created_at: DateTime<Utc>,
}

impl From<RawListingRow> for RawListing {
    fn from(row: RawListingRow) -> Self {
        RawListing {
            id: row.id,
            session_id: row.session_id,
            position: row.ordinal as u32,
            listing: row.listing.into(),
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProcessedListingRow {
    id: Uuid,
    session_id: Uuid,
    raw_listing_id: Uuid,
    ordinal: i32,
    #[sqlx(flatten)]
    listing: ListingColumns,
    is_duplicate: bool,
    is_website_verified: bool,
    website_status_code: Option<i32>,
    created_at: DateTime<Utc>,
}

impl From<ProcessedListingRow> for ProcessedListing {
    fn from(row: ProcessedListingRow) -> Self {
        ProcessedListing {
            id: row.id,
            session_id: row.session_id,
            raw_listing_id: row.raw_listing_id,
            position: row.ordinal as u32,
            listing: row.listing.into(),
            is_duplicate: row.is_duplicate,
            is_website_verified: row.is_website_verified,
            website_status_code: row.website_status_code.map(|c| c as u16),
            created_at: row.created_at,
        }
    }
}

impl ListingStore for PgStore {
    async fn insert_raw(&self, raw: &NewRawListing) -> Result<RawListing, AppError> {
        let listing = &raw.listing;
        let (id, created_at): (Uuid, DateTime<Utc>) = sqlx::query_as(
            r#"
            INSERT INTO raw_listings (
                session_id, ordinal, name, description, rating, reviews, category, website,
                address, phone, latitude, longitude, opening_hours, price_level, thumbnail, place_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING id, created_at
            "#,
        )
        .bind(raw.session_id)
        .bind(raw.position as i32)
        .bind(&listing.name)
        .bind(&listing.description)
        .bind(listing.rating)
        .bind(listing.reviews.map(|r| r as i32))
        .bind(&listing.category)
        .bind(&listing.website)
        .bind(&listing.address)
        .bind(&listing.phone)
        .bind(listing.latitude)
        .bind(listing.longitude)
        .bind(listing.opening_hours.as_ref().map(Json))
        .bind(&listing.price_level)
        .bind(&listing.thumbnail)
        .bind(&listing.place_id)
        .fetch_one(&self.pool)
        .await
        .map_err(persistence)?;

        Ok(RawListing {
            id,
            session_id: raw.session_id,
            position: raw.position,
            listing: raw.listing.clone(),
            created_at,
        })
    }

    async fn raw_listings(&self, session_id: Uuid) -> Result<Vec<RawListing>, AppError> {
        let sql = format!(
            "SELECT id, session_id, ordinal, {LISTING_SELECT}, created_at \
             FROM raw_listings WHERE session_id = $1 ORDER BY ordinal"
        );
        let rows = sqlx::query_as::<_, RawListingRow>(&sql)
            .bind(session_id)
            .fetch_all(&self.pool)
            .await
            .map_err(persistence)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn insert_processed(&self, listings: &[NewProcessedListing]) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await.map_err(persistence)?;
        let mut written = 0;

        for processed in listings {
            let listing = &processed.listing;
            let result = sqlx::query(
                r#"
                INSERT INTO processed_listings (
                    session_id, raw_listing_id, ordinal, name, description, rating, reviews,
                    category, website, address, phone, latitude, longitude, opening_hours,
                    price_level, thumbnail, place_id, is_duplicate, is_website_verified,
                    website_status_code
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                        $17, $18, $19, $20)
                "#,
            )
            .bind(processed.session_id)
            .bind(processed.raw_listing_id)
            .bind(processed.position as i32)
            .bind(&listing.name)
            .bind(&listing.description)
            .bind(listing.rating)
            .bind(listing.reviews.map(|r| r as i32))
            .bind(&listing.category)
            .bind(&listing.website)
            .bind(&listing.address)
            .bind(&listing.phone)
            .bind(listing.latitude)
            .bind(listing.longitude)
            .bind(listing.opening_hours.as_ref().map(Json))
            .bind(&listing.price_level)
            .bind(&listing.thumbnail)
            .bind(&listing.place_id)
            .bind(processed.is_duplicate)
            .bind(processed.is_website_verified)
            .bind(processed.website_status_code.map(i32::from))
            .execute(&mut *tx)
            .await
            .map_err(persistence)?;
            written += result.rows_affected();
        }

        tx.commit().await.map_err(persistence)?;
        Ok(written)
    }

    async fn processed_listings(&self, session_id: Uuid) -> Result<Vec<ProcessedListing>, AppError> {
        let sql = format!(
            "SELECT id, session_id, raw_listing_id, ordinal, {LISTING_SELECT}, is_duplicate, \
             is_website_verified, website_status_code, created_at \
             FROM processed_listings WHERE session_id = $1 ORDER BY ordinal"
        );
        let rows = sqlx::query_as::<_, ProcessedListingRow>(&sql)
            .bind(session_id)
            .fetch_all(&self.pool)
            .await
            .map_err(persistence)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
