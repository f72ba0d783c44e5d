//! The search pipeline end to end: cache check, session, ingestion, log.

use uuid::Uuid;

use crate::activity::ActivityLogger;
use crate::cache::QueryCache;
use crate::config::PipelineConfig;
use crate::control::SessionControl;
use crate::error::AppError;
use crate::ingest::{IngestOutcome, IngestReporter, IngestionService};
use crate::manager::SessionManager;
use crate::session::Session;
use crate::traits::{ListingSource, Store, WebsiteVerifier};

/// What [`SearchService::start`] decided.
#[derive(Debug)]
pub enum SearchStart {
    /// A non-expired cache entry answered the query.
    Cached { session_id: Uuid, result_count: u32 },
    /// A new running session; hand it to [`SearchService::run`].
    Started {
        session: Session,
        control: SessionControl,
    },
}

#[derive(Clone)]
pub struct SearchService<L, S, V>
where
    L: ListingSource,
    S: Store,
    V: WebsiteVerifier,
{
    ingest: IngestionService<L, S, V>,
    activity: ActivityLogger<S>,
}

impl<L, S, V> SearchService<L, S, V>
where
    L: ListingSource,
    S: Store,
    V: WebsiteVerifier,
{
    pub fn new(source: L, store: S, verifier: V, config: &PipelineConfig) -> Self {
        Self {
            activity: ActivityLogger::new(store.clone()),
            ingest: IngestionService::new(source, store, verifier, config),
        }
    }

    pub fn manager(&self) -> &SessionManager<S> {
        self.ingest.manager()
    }

    pub fn cache(&self) -> &QueryCache<S> {
        self.ingest.cache()
    }

    pub fn store(&self) -> &S {
        self.ingest.store()
    }

    /// Answer from the cache, or create a session to ingest into.
    pub async fn start(
        &self,
        owner_id: Uuid,
        business_type: &str,
        location: &str,
    ) -> Result<SearchStart, AppError> {
        if let Some(hit) = self
            .cache()
            .lookup_hit(business_type, location, owner_id)
            .await
        {
            self.log(owner_id, business_type, location, hit.result_count, true)
                .await;
            tracing::info!(session_id = %hit.session_id, "Search answered from cache");
            return Ok(SearchStart::Cached {
                session_id: hit.session_id,
                result_count: hit.result_count,
            });
        }

        let (session, control) = self
            .manager()
            .create(business_type, location, owner_id)
            .await?;
        Ok(SearchStart::Started { session, control })
    }

    /// Run ingestion for a started session and settle its bookkeeping.
    ///
    /// A source failure moves the session to `failed` before it is returned.
    /// The session's control is released in every case.
    pub async fn run<R: IngestReporter>(
        &self,
        session: &Session,
        control: &SessionControl,
        reporter: &R,
    ) -> Result<IngestOutcome, AppError> {
        let result = self.ingest.run(session, control, reporter).await;

        match &result {
            Ok(IngestOutcome::Completed { total_records, .. }) => {
                self.log(
                    session.owner_id,
                    &session.business_type,
                    &session.location,
                    *total_records,
                    false,
                )
                .await;
            }
            Ok(IngestOutcome::Cancelled { .. }) => {}
            Err(e @ AppError::SourceFetchError { .. }) => {
                tracing::error!(session_id = %session.id, error = %e, "Listing source failed");
                if let Err(fail_err) = self.manager().fail(session.id).await {
                    tracing::warn!(session_id = %session.id, error = %fail_err, "Could not mark session failed");
                }
            }
            Err(e) => {
                tracing::error!(session_id = %session.id, error = %e, "Search pipeline failed");
            }
        }

        self.manager().release(session.id);
        result
    }

    async fn log(
        &self,
        owner_id: Uuid,
        business_type: &str,
        location: &str,
        result_count: u32,
        was_cached: bool,
    ) {
        if let Err(e) = self
            .activity
            .log(owner_id, business_type, location, result_count, was_cached)
            .await
        {
            tracing::warn!(%owner_id, error = %e, "Failed to log search");
        }
    }
}
