//! The ingestion loop: source listings in, raw listing rows out.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::cache::QueryCache;
use crate::config::PipelineConfig;
use crate::control::{Checkpoint, SessionControl};
use crate::dedup::DedupEngine;
use crate::error::AppError;
use crate::manager::SessionManager;
use crate::models::{NewRawListing, ProcessingSummary, RawListing};
use crate::session::Session;
use crate::traits::{ListingSource, Store, WebsiteVerifier};

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Lifecycle events emitted by [`IngestionService::run`].
#[derive(Debug)]
pub enum IngestEvent<'a> {
    Started {
        session_id: Uuid,
        query: &'a str,
    },
    Fetched {
        session_id: Uuid,
        count: usize,
    },
    Paused {
        session_id: Uuid,
    },
    Resumed {
        session_id: Uuid,
    },
    /// Emitted once per committed record, in ingestion order.
    RecordPersisted {
        session_id: Uuid,
        record: &'a RawListing,
        total_records: u32,
    },
    RecordFailed {
        session_id: Uuid,
        position: u32,
        error: &'a str,
    },
    Cancelled {
        session_id: Uuid,
        total_records: u32,
    },
    Completed {
        session_id: Uuid,
        total_records: u32,
    },
    Processed {
        session_id: Uuid,
        summary: &'a ProcessingSummary,
    },
}

/// Trait for receiving ingestion lifecycle events.
///
/// The default implementation is a no-op. Use [`TracingIngestReporter`]
/// for structured logging.
pub trait IngestReporter: Send + Sync {
    fn report(&self, event: IngestEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingIngestReporter;

impl IngestReporter for TracingIngestReporter {
    fn report(&self, event: IngestEvent<'_>) {
        match event {
            IngestEvent::Started { session_id, query } => {
                tracing::info!(%session_id, %query, "Ingestion started");
            }
            IngestEvent::Fetched { session_id, count } => {
                tracing::info!(%session_id, count, "Listings fetched from source");
            }
            IngestEvent::Paused { session_id } => {
                tracing::info!(%session_id, "Ingestion paused");
            }
            IngestEvent::Resumed { session_id } => {
                tracing::info!(%session_id, "Ingestion resumed");
            }
            IngestEvent::RecordPersisted {
                session_id,
                record,
                total_records,
            } => {
                tracing::debug!(
                    %session_id,
                    position = record.position,
                    name = %record.listing.name,
                    total_records,
                    "Record persisted"
                );
            }
            IngestEvent::RecordFailed {
                session_id,
                position,
                error,
            } => {
                tracing::warn!(%session_id, position, %error, "Record skipped");
            }
            IngestEvent::Cancelled {
                session_id,
                total_records,
            } => {
                tracing::info!(%session_id, total_records, "Ingestion stopped");
            }
            IngestEvent::Completed {
                session_id,
                total_records,
            } => {
                tracing::info!(%session_id, total_records, "Ingestion completed");
            }
            IngestEvent::Processed {
                session_id,
                summary,
            } => {
                tracing::info!(
                    %session_id,
                    processed = summary.processed,
                    total_raw = summary.total_raw,
                    duplicates_removed = summary.duplicates_removed,
                    "Dedup and verification finished"
                );
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// How an ingestion run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The source list was exhausted; the session is completed, cached and
    /// processed.
    Completed {
        total_records: u32,
        summary: ProcessingSummary,
    },
    /// Stop was observed at a suspension point.
    Cancelled { total_records: u32 },
}

impl IngestOutcome {
    pub fn total_records(&self) -> u32 {
        match self {
            IngestOutcome::Completed { total_records, .. }
            | IngestOutcome::Cancelled { total_records } => *total_records,
        }
    }
}

/// Drives one session from source fetch to processed listings.
#[derive(Clone)]
pub struct IngestionService<L, S, V>
where
    L: ListingSource,
    S: Store,
    V: WebsiteVerifier,
{
    source: L,
    store: S,
    manager: SessionManager<S>,
    cache: QueryCache<S>,
    engine: Arc<DedupEngine<S, V>>,
    record_delay: Duration,
}

impl<L, S, V> IngestionService<L, S, V>
where
    L: ListingSource,
    S: Store,
    V: WebsiteVerifier,
{
    pub fn new(source: L, store: S, verifier: V, config: &PipelineConfig) -> Self {
        Self {
            source,
            manager: SessionManager::new(store.clone()),
            cache: QueryCache::new(store.clone(), config.cache_ttl),
            engine: Arc::new(DedupEngine::new(store.clone(), verifier, config)),
            store,
            record_delay: config.record_delay,
        }
    }

    pub fn manager(&self) -> &SessionManager<S> {
        &self.manager
    }

    pub fn cache(&self) -> &QueryCache<S> {
        &self.cache
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Ingest every listing the source returns for the session's query.
    ///
    /// A source failure is returned as `SourceFetchError` and leaves the
    /// session status untouched. Per-record write failures are skipped.
    pub async fn run<R: IngestReporter>(
        &self,
        session: &Session,
        control: &SessionControl,
        reporter: &R,
    ) -> Result<IngestOutcome, AppError> {
        let session_id = session.id;
        reporter.report(IngestEvent::Started {
            session_id,
            query: &session.search_query,
        });

        if control.is_cancelled() {
            return Ok(cancelled(session_id, 0, reporter));
        }

        let listings = self
            .source
            .search(&session.business_type, &session.location)
            .await
            .map_err(|e| {
                if matches!(e, AppError::SourceFetchError { .. }) {
                    e
                } else {
                    AppError::source(e.to_string())
                }
            })?;
        reporter.report(IngestEvent::Fetched {
            session_id,
            count: listings.len(),
        });

        let mut total_records: u32 = 0;
        for (position, listing) in listings.into_iter().enumerate() {
            let position = position as u32;

            if checkpoint(session_id, control, reporter).await.is_cancelled()
                || control.sleep(self.record_delay).await.is_cancelled()
                || checkpoint(session_id, control, reporter).await.is_cancelled()
            {
                return Ok(cancelled(session_id, total_records, reporter));
            }

            let request = NewRawListing {
                session_id,
                position,
                listing,
            };
            match self.store.insert_raw(&request).await {
                Ok(record) => {
                    total_records += 1;
                    if let Err(e) = self.manager.record_progress(session_id, total_records).await {
                        tracing::warn!(%session_id, total_records, error = %e, "Failed to write progress");
                    }
                    reporter.report(IngestEvent::RecordPersisted {
                        session_id,
                        record: &record,
                        total_records,
                    });
                }
                Err(e) => {
                    if !e.is_record_scoped() {
                        tracing::error!(%session_id, position, error = %e, "Unexpected error persisting record");
                    }
                    reporter.report(IngestEvent::RecordFailed {
                        session_id,
                        position,
                        error: &e.to_string(),
                    });
                }
            }
        }

        // A pause after the last record still holds completion back.
        // Past `finish`, stop and pause no longer reach this run.
        if checkpoint(session_id, control, reporter).await.is_cancelled() || !control.finish() {
            return Ok(cancelled(session_id, total_records, reporter));
        }

        self.manager.complete(session_id).await?;
        reporter.report(IngestEvent::Completed {
            session_id,
            total_records,
        });

        if let Err(e) = self.cache.record(session, total_records).await {
            tracing::warn!(%session_id, error = %e, "Failed to write cache entry");
        }

        let summary = self.engine.process(session_id).await?;
        reporter.report(IngestEvent::Processed {
            session_id,
            summary: &summary,
        });

        Ok(IngestOutcome::Completed {
            total_records,
            summary,
        })
    }
}

/// Observe stop, then block while paused.
async fn checkpoint<R: IngestReporter>(
    session_id: Uuid,
    control: &SessionControl,
    reporter: &R,
) -> Checkpoint {
    if control.is_cancelled() {
        return Checkpoint::Cancelled;
    }
    if control.is_paused() {
        reporter.report(IngestEvent::Paused { session_id });
        if control.wait_if_paused().await.is_cancelled() {
            return Checkpoint::Cancelled;
        }
        reporter.report(IngestEvent::Resumed { session_id });
    }
    Checkpoint::Continue
}

fn cancelled<R: IngestReporter>(session_id: Uuid, total_records: u32, reporter: &R) -> IngestOutcome {
    reporter.report(IngestEvent::Cancelled {
        session_id,
        total_records,
    });
    IngestOutcome::Cancelled { total_records }
}
