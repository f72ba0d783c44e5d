use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::listing::Listing;

/// A listing as ingested for a session, immutable once written.
#[derive(Debug, Clone, Serialize)]
pub struct RawListing {
    pub id: Uuid,
    pub session_id: Uuid,
    /// Zero-based position in the order the source returned it.
    pub position: u32,
    pub listing: Listing,
    pub created_at: DateTime<Utc>,
}

/// DTO for inserting a raw listing.
#[derive(Debug, Clone)]
pub struct NewRawListing {
    pub session_id: Uuid,
    pub position: u32,
    pub listing: Listing,
}

/// A listing that survived dedup and website verification.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedListing {
    pub id: Uuid,
    pub session_id: Uuid,
    pub raw_listing_id: Uuid,
    pub position: u32,
    pub listing: Listing,
    pub is_duplicate: bool,
    pub is_website_verified: bool,
    pub website_status_code: Option<u16>,
    pub created_at: DateTime<Utc>,
}

/// DTO for inserting a processed listing.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProcessedListing {
    pub session_id: Uuid,
    pub raw_listing_id: Uuid,
    pub position: u32,
    pub listing: Listing,
    pub is_duplicate: bool,
    pub is_website_verified: bool,
    pub website_status_code: Option<u16>,
}

/// Maps a normalized query of one owner to the session that answered it.
#[derive(Debug, Clone, Serialize)]
pub struct CacheEntry {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub search_query: String,
    pub session_id: Uuid,
    pub business_type: String,
    pub location: String,
    pub result_count: u32,
    pub cached_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// DTO for inserting a cache entry.
#[derive(Debug, Clone)]
pub struct NewCacheEntry {
    pub owner_id: Uuid,
    pub search_query: String,
    pub session_id: Uuid,
    pub business_type: String,
    pub location: String,
    pub result_count: u32,
    pub cached_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Audit record of one search, append-only.
#[derive(Debug, Clone, Serialize)]
pub struct SearchLogEntry {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub business_type: String,
    pub location: String,
    pub result_count: u32,
    pub was_cached: bool,
    pub created_at: DateTime<Utc>,
}

/// DTO for appending a search log entry.
#[derive(Debug, Clone)]
pub struct NewSearchLogEntry {
    pub owner_id: Uuid,
    pub business_type: String,
    pub location: String,
    pub result_count: u32,
    pub was_cached: bool,
}

/// Outcome of one dedup + verification pass over a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProcessingSummary {
    pub processed: usize,
    pub total_raw: usize,
    /// `total_raw - processed`: counts exact duplicates *and* candidates
    /// dropped for failing verification (or having no website).
    pub duplicates_removed: usize,
    /// Records skipped because an earlier record had the same dedup key.
    pub duplicates_skipped: usize,
    /// First occurrences dropped because their website did not verify.
    pub unverified_dropped: usize,
}
