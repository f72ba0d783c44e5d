use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use uuid::Uuid;

use crate::control::SessionControl;
use crate::error::AppError;
use crate::query::normalize_query;
use crate::session::{NewSession, Session, SessionAction, SessionStatus};
use crate::traits::SessionStore;

/// Owns the lifecycle of scraping sessions.
///
/// Status changes are written to the store, and the in-memory
/// [`SessionControl`] of every live ingestion is kept in a registry so
/// pause/resume/stop issued from another task reach the running loop.
#[derive(Clone)]
pub struct SessionManager<S: SessionStore> {
    store: S,
    live: Arc<Mutex<HashMap<Uuid, SessionControl>>>,
}

impl<S: SessionStore> SessionManager<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            live: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn lock_live(&self) -> MutexGuard<'_, HashMap<Uuid, SessionControl>> {
        self.live.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("Recovered from poisoned session registry");
            poisoned.into_inner()
        })
    }

    /// Persist a new running session and register its control.
    pub async fn create(
        &self,
        business_type: &str,
        location: &str,
        owner_id: Uuid,
    ) -> Result<(Session, SessionControl), AppError> {
        let request = NewSession {
            owner_id,
            business_type: business_type.trim().to_string(),
            location: location.trim().to_string(),
            search_query: normalize_query(business_type, location),
        };

        let session = self.store.create_session(&request).await?;
        let control = SessionControl::new();
        self.lock_live().insert(session.id, control.clone());

        tracing::info!(session_id = %session.id, query = %session.search_query, "Session created");
        Ok((session, control))
    }

    /// The control of a session whose ingestion is running in this process.
    pub fn control(&self, session_id: Uuid) -> Option<SessionControl> {
        self.lock_live().get(&session_id).cloned()
    }

    /// Forget the control once the ingestion task has returned.
    pub fn release(&self, session_id: Uuid) {
        self.lock_live().remove(&session_id);
    }

    pub fn live_sessions(&self) -> usize {
        self.lock_live().len()
    }

    fn live_control(&self, session: &Session, action: SessionAction) -> Result<SessionControl, AppError> {
        match self.control(session.id) {
            Some(control) => {
                control.status().apply(action)?;
                Ok(control)
            }
            None => {
                // Surfaces InvalidTransition for terminal sessions.
                session.status.apply(action)?;
                Err(AppError::NotFound(format!(
                    "No live ingestion for session {}",
                    session.id
                )))
            }
        }
    }

    /// Ask the ingestion loop to suspend at its next checkpoint.
    pub async fn pause(&self, session: &Session) -> Result<(), AppError> {
        let control = self.live_control(session, SessionAction::Pause)?;
        control.pause();
        self.store
            .update_status(session.id, SessionStatus::Paused, None)
            .await?;
        tracing::info!(session_id = %session.id, "Session paused");
        Ok(())
    }

    pub async fn resume(&self, session: &Session) -> Result<(), AppError> {
        let control = self.live_control(session, SessionAction::Resume)?;
        self.store
            .update_status(session.id, SessionStatus::Running, None)
            .await?;
        control.resume();
        tracing::info!(session_id = %session.id, "Session resumed");
        Ok(())
    }

    /// Signal cancellation and mark the session completed.
    ///
    /// Never fails from the caller's point of view: a failed status write is
    /// logged, and stopping a session that is already terminal, or whose
    /// ingestion already finished, is a no-op.
    pub async fn stop(&self, session: &Session) {
        match self.control(session.id) {
            Some(control) => {
                if !control.cancel() {
                    tracing::debug!(session_id = %session.id, "Stop ignored, ingestion already finished");
                    return;
                }
            }
            None if session.status.is_terminal() => {
                tracing::debug!(session_id = %session.id, status = %session.status, "Stop ignored, session already terminal");
                return;
            }
            None => {}
        }

        if let Err(e) = self
            .store
            .update_status(
                session.id,
                SessionStatus::Completed,
                Some(Utc::now()),
            )
            .await
        {
            tracing::error!(session_id = %session.id, error = %e, "Failed to mark stopped session completed");
            return;
        }
        tracing::info!(session_id = %session.id, "Session stopped");
    }

    /// Natural end of ingestion.
    pub async fn complete(&self, session_id: Uuid) -> Result<(), AppError> {
        self.store
            .update_status(
                session_id,
                SessionStatus::Completed,
                Some(Utc::now()),
            )
            .await
    }

    /// Move a non-terminal session to `failed`.
    pub async fn fail(&self, session_id: Uuid) -> Result<(), AppError> {
        if let Some(control) = self.control(session_id) {
            control.status().apply(SessionAction::Fail)?;
        }
        self.store
            .update_status(session_id, SessionStatus::Failed, None)
            .await
    }

    /// Idempotent: writes the absolute count of committed records.
    pub async fn record_progress(&self, session_id: Uuid, count: u32) -> Result<(), AppError> {
        self.store.set_total_records(session_id, count).await
    }
}
