pub mod activity;
pub mod cache;
pub mod config;
pub mod control;
pub mod dedup;
pub mod error;
pub mod ingest;
pub mod listing;
pub mod manager;
pub mod models;
pub mod query;
pub mod search;
pub mod session;
pub mod traits;

#[cfg(test)]
pub(crate) mod testutil;

pub use activity::ActivityLogger;
pub use cache::{CacheHit, QueryCache};
pub use config::PipelineConfig;
pub use control::{Checkpoint, SessionControl};
pub use dedup::DedupEngine;
pub use error::AppError;
pub use ingest::{IngestEvent, IngestOutcome, IngestReporter, IngestionService, TracingIngestReporter};
pub use listing::{Listing, OpeningHours};
pub use manager::SessionManager;
pub use models::{
    CacheEntry, NewCacheEntry, NewProcessedListing, NewRawListing, NewSearchLogEntry,
    ProcessedListing, ProcessingSummary, RawListing, SearchLogEntry,
};
pub use query::normalize_query;
pub use search::{SearchService, SearchStart};
pub use session::{NewSession, ProcessingStatus, Session, SessionAction, SessionStatus};
pub use traits::{
    CacheStore, ListingSource, ListingStore, SearchLogStore, SessionStore, Store, WebsiteVerifier,
};
