//! Test utilities: mock implementations of all core traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::control::SessionControl;
use crate::error::AppError;
use crate::ingest::{IngestEvent, IngestReporter};
use crate::listing::Listing;
use crate::models::{
    CacheEntry, NewCacheEntry, NewProcessedListing, NewRawListing, NewSearchLogEntry,
    ProcessedListing, RawListing, SearchLogEntry,
};
use crate::session::{NewSession, ProcessingStatus, Session, SessionStatus};
use crate::traits::{
    CacheStore, ListingSource, ListingStore, SearchLogStore, SessionStore, WebsiteVerifier,
};

// ---------------------------------------------------------------------------
// MockListingSource
// ---------------------------------------------------------------------------

/// Mock listing source returning queued responses.
#[derive(Clone)]
pub struct MockListingSource {
    /// Each call pops the first element. If empty, returns no listings.
    responses: Arc<Mutex<Vec<Result<Vec<Listing>, AppError>>>>,
    pub calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockListingSource {
    pub fn new(listings: Vec<Listing>) -> Self {
        Self::with_responses(vec![Ok(listings)])
    }

    pub fn with_error(error: AppError) -> Self {
        Self::with_responses(vec![Err(error)])
    }

    pub fn with_responses(responses: Vec<Result<Vec<Listing>, AppError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl ListingSource for MockListingSource {
    async fn search(&self, business_type: &str, location: &str) -> Result<Vec<Listing>, AppError> {
        self.calls
            .lock()
            .unwrap()
            .push((business_type.to_string(), location.to_string()));
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(Vec::new())
        } else {
            responses.remove(0)
        }
    }
}

// ---------------------------------------------------------------------------
// MockVerifier
// ---------------------------------------------------------------------------

#[derive(Clone)]
enum Behavior {
    Status(u16),
    Error(String),
    Hang,
}

/// Mock website verifier. Unknown URLs answer 200.
#[derive(Clone, Default)]
pub struct MockVerifier {
    behaviors: Arc<Mutex<HashMap<String, Behavior>>>,
    pub checked: Arc<Mutex<Vec<String>>>,
}

impl MockVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(self, url: &str, status: u16) -> Self {
        self.set(url, Behavior::Status(status))
    }

    pub fn with_error(self, url: &str, message: &str) -> Self {
        self.set(url, Behavior::Error(message.to_string()))
    }

    /// The check for `url` never resolves.
    pub fn hanging(self, url: &str) -> Self {
        self.set(url, Behavior::Hang)
    }

    fn set(self, url: &str, behavior: Behavior) -> Self {
        self.behaviors
            .lock()
            .unwrap()
            .insert(url.to_string(), behavior);
        self
    }

    pub fn checked_urls(&self) -> Vec<String> {
        let mut urls = self.checked.lock().unwrap().clone();
        urls.sort();
        urls
    }
}

impl WebsiteVerifier for MockVerifier {
    async fn check(&self, url: &str) -> Result<u16, AppError> {
        self.checked.lock().unwrap().push(url.to_string());
        let behavior = self.behaviors.lock().unwrap().get(url).cloned();
        match behavior {
            None => Ok(200),
            Some(Behavior::Status(code)) => Ok(code),
            Some(Behavior::Error(message)) => Err(AppError::VerificationError(message)),
            Some(Behavior::Hang) => std::future::pending().await,
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Faults {
    session_create: bool,
    status_updates: bool,
    raw_positions: HashSet<u32>,
    raw_read: bool,
    processed_insert: bool,
    cache_lookup: bool,
    cache_insert: bool,
    log_append: bool,
}

#[derive(Default)]
struct MemoryState {
    sessions: Vec<Session>,
    progress_writes: HashMap<Uuid, Vec<u32>>,
    raw: Vec<RawListing>,
    processed: Vec<ProcessedListing>,
    cache: Vec<CacheEntry>,
    log: Vec<SearchLogEntry>,
    faults: Faults,
}

/// In-memory store implementing every store trait, with injectable failures.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

fn injected(what: &str) -> AppError {
    AppError::PersistenceError(format!("injected failure: {what}"))
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_session_create(self) -> Self {
        self.state.lock().unwrap().faults.session_create = true;
        self
    }

    /// `insert_raw` fails for the record at this ingestion position.
    pub fn failing_raw_at(self, position: u32) -> Self {
        self.state
            .lock()
            .unwrap()
            .faults
            .raw_positions
            .insert(position);
        self
    }

    pub fn failing_raw_read(self) -> Self {
        self.state.lock().unwrap().faults.raw_read = true;
        self
    }

    pub fn failing_processed_insert(self) -> Self {
        self.state.lock().unwrap().faults.processed_insert = true;
        self
    }

    pub fn failing_cache_lookup(self) -> Self {
        self.state.lock().unwrap().faults.cache_lookup = true;
        self
    }

    pub fn failing_cache_insert(self) -> Self {
        self.state.lock().unwrap().faults.cache_insert = true;
        self
    }

    pub fn failing_log(self) -> Self {
        self.state.lock().unwrap().faults.log_append = true;
        self
    }

    /// From now on every `update_status` fails.
    pub fn fail_status_updates(&self) {
        self.state.lock().unwrap().faults.status_updates = true;
    }

    pub fn session(&self, session_id: Uuid) -> Option<Session> {
        let state = self.state.lock().unwrap();
        state.sessions.iter().find(|s| s.id == session_id).cloned()
    }

    pub fn raw(&self, session_id: Uuid) -> Vec<RawListing> {
        let state = self.state.lock().unwrap();
        state
            .raw
            .iter()
            .filter(|r| r.session_id == session_id)
            .cloned()
            .collect()
    }

    pub fn processed(&self, session_id: Uuid) -> Vec<ProcessedListing> {
        let state = self.state.lock().unwrap();
        state
            .processed
            .iter()
            .filter(|p| p.session_id == session_id)
            .cloned()
            .collect()
    }

    pub fn cache_entries(&self) -> Vec<CacheEntry> {
        self.state.lock().unwrap().cache.clone()
    }

    pub fn log_entries(&self) -> Vec<SearchLogEntry> {
        self.state.lock().unwrap().log.clone()
    }

    /// Every value written through `set_total_records`, in order.
    pub fn progress_writes(&self, session_id: Uuid) -> Vec<u32> {
        let state = self.state.lock().unwrap();
        state
            .progress_writes
            .get(&session_id)
            .cloned()
            .unwrap_or_default()
    }
}

impl SessionStore for MemoryStore {
    async fn create_session(&self, session: &NewSession) -> Result<Session, AppError> {
        let mut state = self.state.lock().unwrap();
        if state.faults.session_create {
            return Err(injected("create_session"));
        }
        let created = Session {
            id: Uuid::new_v4(),
            owner_id: session.owner_id,
            business_type: session.business_type.clone(),
            location: session.location.clone(),
            search_query: session.search_query.clone(),
            status: SessionStatus::Running,
            total_records: 0,
            processing_status: ProcessingStatus::Pending,
            created_at: Utc::now(),
            completed_at: None,
        };
        state.sessions.push(created.clone());
        Ok(created)
    }

    async fn get_session(
        &self,
        session_id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<Session>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .sessions
            .iter()
            .find(|s| s.id == session_id && s.owner_id == owner_id)
            .cloned())
    }

    async fn update_status(
        &self,
        session_id: Uuid,
        status: SessionStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<(), AppError> {
        let mut state = self.state.lock().unwrap();
        if state.faults.status_updates {
            return Err(injected("update_status"));
        }
        // Terminal sessions are never rewritten.
        if let Some(session) = state
            .sessions
            .iter_mut()
            .find(|s| s.id == session_id && !s.status.is_terminal())
        {
            session.status = status;
            if completed_at.is_some() {
                session.completed_at = completed_at;
            }
        }
        Ok(())
    }

    async fn set_total_records(&self, session_id: Uuid, total_records: u32) -> Result<(), AppError> {
        let mut state = self.state.lock().unwrap();
        state
            .progress_writes
            .entry(session_id)
            .or_default()
            .push(total_records);
        if let Some(session) = state.sessions.iter_mut().find(|s| s.id == session_id) {
            session.total_records = total_records;
        }
        Ok(())
    }

    async fn set_processing_status(
        &self,
        session_id: Uuid,
        status: ProcessingStatus,
    ) -> Result<(), AppError> {
        let mut state = self.state.lock().unwrap();
        if let Some(session) = state.sessions.iter_mut().find(|s| s.id == session_id) {
            session.processing_status = status;
        }
        Ok(())
    }
}

impl ListingStore for MemoryStore {
    async fn insert_raw(&self, listing: &NewRawListing) -> Result<RawListing, AppError> {
        let mut state = self.state.lock().unwrap();
        if state.faults.raw_positions.contains(&listing.position) {
            return Err(injected("insert_raw"));
        }
        let raw = RawListing {
            id: Uuid::new_v4(),
            session_id: listing.session_id,
            position: listing.position,
            listing: listing.listing.clone(),
            created_at: Utc::now(),
        };
        state.raw.push(raw.clone());
        Ok(raw)
    }

    async fn raw_listings(&self, session_id: Uuid) -> Result<Vec<RawListing>, AppError> {
        if self.state.lock().unwrap().faults.raw_read {
            return Err(injected("raw_listings"));
        }
        let mut rows = self.raw(session_id);
        rows.sort_by_key(|r| r.position);
        Ok(rows)
    }

    async fn insert_processed(&self, listings: &[NewProcessedListing]) -> Result<u64, AppError> {
        let mut state = self.state.lock().unwrap();
        if state.faults.processed_insert {
            return Err(injected("insert_processed"));
        }
        for listing in listings {
            state.processed.push(ProcessedListing {
                id: Uuid::new_v4(),
                session_id: listing.session_id,
                raw_listing_id: listing.raw_listing_id,
                position: listing.position,
                listing: listing.listing.clone(),
                is_duplicate: listing.is_duplicate,
                is_website_verified: listing.is_website_verified,
                website_status_code: listing.website_status_code,
                created_at: Utc::now(),
            });
        }
        Ok(listings.len() as u64)
    }

    async fn processed_listings(&self, session_id: Uuid) -> Result<Vec<ProcessedListing>, AppError> {
        let mut rows = self.processed(session_id);
        rows.sort_by_key(|p| p.position);
        Ok(rows)
    }
}

impl CacheStore for MemoryStore {
    async fn find_valid(
        &self,
        owner_id: Uuid,
        search_query: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<CacheEntry>, AppError> {
        let state = self.state.lock().unwrap();
        if state.faults.cache_lookup {
            return Err(AppError::CacheLookupError("injected failure".into()));
        }
        Ok(state
            .cache
            .iter()
            .filter(|e| e.owner_id == owner_id && e.search_query == search_query)
            .filter(|e| e.is_valid_at(now))
            .max_by_key(|e| e.cached_at)
            .cloned())
    }

    async fn insert_entry(&self, entry: &NewCacheEntry) -> Result<CacheEntry, AppError> {
        let mut state = self.state.lock().unwrap();
        if state.faults.cache_insert {
            return Err(injected("insert_entry"));
        }
        let created = CacheEntry {
            id: Uuid::new_v4(),
            owner_id: entry.owner_id,
            search_query: entry.search_query.clone(),
            session_id: entry.session_id,
            business_type: entry.business_type.clone(),
            location: entry.location.clone(),
            result_count: entry.result_count,
            cached_at: entry.cached_at,
            expires_at: entry.expires_at,
        };
        state.cache.push(created.clone());
        Ok(created)
    }
}

impl SearchLogStore for MemoryStore {
    async fn append(&self, entry: &NewSearchLogEntry) -> Result<Uuid, AppError> {
        let mut state = self.state.lock().unwrap();
        if state.faults.log_append {
            return Err(injected("append"));
        }
        let id = Uuid::new_v4();
        state.log.push(SearchLogEntry {
            id,
            owner_id: entry.owner_id,
            business_type: entry.business_type.clone(),
            location: entry.location.clone(),
            result_count: entry.result_count,
            was_cached: entry.was_cached,
            created_at: Utc::now(),
        });
        Ok(id)
    }
}

// ---------------------------------------------------------------------------
// MockReporter
// ---------------------------------------------------------------------------

/// Mock ingestion reporter that records events.
///
/// Optionally pauses or stops a session control at a known point of the
/// run, to freeze or end the loop there.
#[derive(Default)]
pub struct MockReporter {
    pub events: Arc<Mutex<Vec<String>>>,
    pub persisted: Arc<Mutex<Vec<u32>>>,
    pause_after: Option<(u32, SessionControl)>,
    stop_after: Option<(u32, SessionControl)>,
    stop_on_completed: Option<SessionControl>,
}

impl MockReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pausing_after(records: u32, control: SessionControl) -> Self {
        Self {
            pause_after: Some((records, control)),
            ..Self::default()
        }
    }

    pub fn stopping_after(records: u32, control: SessionControl) -> Self {
        Self {
            stop_after: Some((records, control)),
            ..Self::default()
        }
    }

    /// Signals stop as soon as the session has been marked completed.
    pub fn stopping_on_completed(control: SessionControl) -> Self {
        Self {
            stop_on_completed: Some(control),
            ..Self::default()
        }
    }

    pub fn labels(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    /// Positions of persisted records, in the order they were reported.
    pub fn persisted_positions(&self) -> Vec<u32> {
        self.persisted.lock().unwrap().clone()
    }
}

impl IngestReporter for MockReporter {
    fn report(&self, event: IngestEvent<'_>) {
        let label = match &event {
            IngestEvent::Started { .. } => "Started",
            IngestEvent::Fetched { .. } => "Fetched",
            IngestEvent::Paused { .. } => "Paused",
            IngestEvent::Resumed { .. } => "Resumed",
            IngestEvent::RecordPersisted { .. } => "RecordPersisted",
            IngestEvent::RecordFailed { .. } => "RecordFailed",
            IngestEvent::Cancelled { .. } => "Cancelled",
            IngestEvent::Completed { .. } => "Completed",
            IngestEvent::Processed { .. } => "Processed",
        };
        self.events.lock().unwrap().push(label.to_string());

        if let (IngestEvent::Completed { .. }, Some(control)) = (&event, &self.stop_on_completed) {
            control.cancel();
        }

        if let IngestEvent::RecordPersisted {
            record,
            total_records,
            ..
        } = event
        {
            self.persisted.lock().unwrap().push(record.position);
            if let Some((after, control)) = &self.pause_after {
                if total_records == *after {
                    control.pause();
                }
            }
            if let Some((after, control)) = &self.stop_after {
                if total_records == *after {
                    control.cancel();
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

/// A listing with a name, address and website.
pub fn make_listing(name: &str, address: &str, website: Option<&str>) -> Listing {
    let listing = Listing::new(name).with_address(address);
    match website {
        Some(w) => listing.with_website(w),
        None => listing,
    }
}
