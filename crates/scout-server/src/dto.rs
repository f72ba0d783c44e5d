use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use scout_core::listing::Listing;
use scout_core::models::{ProcessedListing, RawListing};
use scout_core::session::Session;

// ---------------------------------------------------------------------------
// Searches
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct StartSearchRequest {
    pub business_type: String,
    pub location: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SearchResponse {
    pub session_id: Uuid,
    /// True when the answer came from the query cache and no scrape ran.
    pub cached: bool,
    /// Known only for cached answers.
    pub result_count: Option<u32>,
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SessionResponse {
    pub id: Uuid,
    pub business_type: String,
    pub location: String,
    pub search_query: String,
    pub status: String,
    pub total_records: u32,
    pub processing_status: String,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            id: session.id,
            business_type: session.business_type,
            location: session.location,
            search_query: session.search_query,
            status: session.status.to_string(),
            total_records: session.total_records,
            processing_status: session.processing_status.to_string(),
            created_at: session.created_at,
            completed_at: session.completed_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Listings
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ListingResponse {
    pub id: Uuid,
    pub position: u32,
    pub name: String,
    pub description: Option<String>,
    pub rating: Option<f64>,
    pub reviews: Option<u32>,
    pub category: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[schema(value_type = Option<Object>)]
    pub opening_hours: Option<serde_json::Value>,
    pub price_level: Option<String>,
    pub thumbnail: Option<String>,
    pub place_id: Option<String>,
    /// Processed listings only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website_status_code: Option<u16>,
}

impl ListingResponse {
    fn build(id: Uuid, position: u32, listing: Listing, website_status_code: Option<u16>) -> Self {
        Self {
            id,
            position,
            name: listing.name,
            description: listing.description,
            rating: listing.rating,
            reviews: listing.reviews,
            category: listing.category,
            website: listing.website,
            address: listing.address,
            phone: listing.phone,
            latitude: listing.latitude,
            longitude: listing.longitude,
            opening_hours: listing
                .opening_hours
                .map(|hours| serde_json::to_value(hours).unwrap_or_default()),
            price_level: listing.price_level,
            thumbnail: listing.thumbnail,
            place_id: listing.place_id,
            website_status_code,
        }
    }
}

impl From<RawListing> for ListingResponse {
    fn from(raw: RawListing) -> Self {
        Self::build(raw.id, raw.position, raw.listing, None)
    }
}

impl From<ProcessedListing> for ListingResponse {
    fn from(processed: ProcessedListing) -> Self {
        Self::build(
            processed.id,
            processed.position,
            processed.listing,
            processed.website_status_code,
        )
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ListingListResponse {
    pub session_id: Uuid,
    pub listings: Vec<ListingResponse>,
    pub total: usize,
}

// ---------------------------------------------------------------------------
// System
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
