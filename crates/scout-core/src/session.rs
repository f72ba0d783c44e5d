use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Lifecycle status of a scraping session.
///
/// ```text
/// running --pause--> paused --resume--> running
/// running/paused --stop--> completed
/// running --natural end--> completed
/// running/paused --fail--> failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Running,
    Paused,
    Completed,
    Failed,
}

/// Caller-driven actions on a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    Pause,
    Resume,
    Stop,
    Complete,
    Fail,
}

impl SessionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionAction::Pause => "pause",
            SessionAction::Resume => "resume",
            SessionAction::Stop => "stop",
            SessionAction::Complete => "complete",
            SessionAction::Fail => "fail",
        }
    }
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Running => "running",
            SessionStatus::Paused => "paused",
            SessionStatus::Completed => "completed",
            SessionStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Failed)
    }

    /// The status reached by applying `action`, or `InvalidTransition`.
    pub fn apply(self, action: SessionAction) -> Result<SessionStatus, AppError> {
        use SessionAction as A;
        use SessionStatus as S;

        match (self, action) {
            (S::Running, A::Pause) => Ok(S::Paused),
            (S::Paused, A::Resume) => Ok(S::Running),
            (S::Running | S::Paused, A::Stop) => Ok(S::Completed),
            (S::Running, A::Complete) => Ok(S::Completed),
            (S::Running | S::Paused, A::Fail) => Ok(S::Failed),
            (from, action) => Err(AppError::InvalidTransition {
                from: from.to_string(),
                action: action.as_str().to_string(),
            }),
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "running" => Ok(SessionStatus::Running),
            "paused" => Ok(SessionStatus::Paused),
            "completed" => Ok(SessionStatus::Completed),
            "failed" => Ok(SessionStatus::Failed),
            _ => Err(format!("Unknown session status: {}", s)),
        }
    }
}

/// Whether the dedup + verification pass has run for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Pending,
    Completed,
}

impl ProcessingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::Pending => "pending",
            ProcessingStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProcessingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(ProcessingStatus::Pending),
            "completed" => Ok(ProcessingStatus::Completed),
            _ => Err(format!("Unknown processing status: {}", s)),
        }
    }
}

/// One user-initiated scrape run for a business type + location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub business_type: String,
    pub location: String,
    /// Normalized `business_type|location`, the cache key.
    pub search_query: String,
    pub status: SessionStatus,
    pub total_records: u32,
    pub processing_status: ProcessingStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Request to create a new session.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub owner_id: Uuid,
    pub business_type: String,
    pub location: String,
    pub search_query: String,
}
