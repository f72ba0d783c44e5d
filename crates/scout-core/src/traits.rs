use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppError;
use crate::listing::Listing;
use crate::models::{
    CacheEntry, NewCacheEntry, NewProcessedListing, NewRawListing, NewSearchLogEntry,
    ProcessedListing, RawListing,
};
use crate::session::{NewSession, ProcessingStatus, Session, SessionStatus};

/// Fetches raw listings for a business type + location from the upstream provider.
pub trait ListingSource: Send + Sync + Clone {
    fn search(
        &self,
        business_type: &str,
        location: &str,
    ) -> impl Future<Output = Result<Vec<Listing>, AppError>> + Send;
}

/// Checks whether a website answers.
pub trait WebsiteVerifier: Send + Sync + Clone {
    /// Issue a HEAD request (following redirects) and return the final status code.
    fn check(&self, url: &str) -> impl Future<Output = Result<u16, AppError>> + Send;
}

/// Persists sessions.
///
/// Reads are scoped to the owning user; a session of another owner is
/// indistinguishable from a missing one.
pub trait SessionStore: Send + Sync + Clone {
    fn create_session(
        &self,
        session: &NewSession,
    ) -> impl Future<Output = Result<Session, AppError>> + Send;

    fn get_session(
        &self,
        session_id: Uuid,
        owner_id: Uuid,
    ) -> impl Future<Output = Result<Option<Session>, AppError>> + Send;

    /// Set the status; `completed_at` is written only when `Some`.
    fn update_status(
        &self,
        session_id: Uuid,
        status: SessionStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    fn set_total_records(
        &self,
        session_id: Uuid,
        total_records: u32,
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    fn set_processing_status(
        &self,
        session_id: Uuid,
        status: ProcessingStatus,
    ) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// Persists raw and processed listings.
pub trait ListingStore: Send + Sync + Clone {
    fn insert_raw(
        &self,
        listing: &NewRawListing,
    ) -> impl Future<Output = Result<RawListing, AppError>> + Send;

    /// All raw listings of a session, in ingestion order.
    fn raw_listings(
        &self,
        session_id: Uuid,
    ) -> impl Future<Output = Result<Vec<RawListing>, AppError>> + Send;

    /// Insert a batch atomically. Returns the number of rows written.
    fn insert_processed(
        &self,
        listings: &[NewProcessedListing],
    ) -> impl Future<Output = Result<u64, AppError>> + Send;

    /// All processed listings of a session, in ingestion order.
    fn processed_listings(
        &self,
        session_id: Uuid,
    ) -> impl Future<Output = Result<Vec<ProcessedListing>, AppError>> + Send;
}

/// Persists query cache entries.
pub trait CacheStore: Send + Sync + Clone {
    /// The most recent entry for `(owner, search_query)` with `expires_at > now`.
    fn find_valid(
        &self,
        owner_id: Uuid,
        search_query: &str,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<Option<CacheEntry>, AppError>> + Send;

    fn insert_entry(
        &self,
        entry: &NewCacheEntry,
    ) -> impl Future<Output = Result<CacheEntry, AppError>> + Send;
}

/// Append-only search activity log.
pub trait SearchLogStore: Send + Sync + Clone {
    fn append(
        &self,
        entry: &NewSearchLogEntry,
    ) -> impl Future<Output = Result<Uuid, AppError>> + Send;
}

/// Everything the search pipeline needs from persistence.
pub trait Store: SessionStore + ListingStore + CacheStore + SearchLogStore {}

impl<T> Store for T where T: SessionStore + ListingStore + CacheStore + SearchLogStore {}
