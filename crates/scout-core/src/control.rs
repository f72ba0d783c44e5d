//! In-memory pause/stop signalling for a running ingestion.
//!
//! The session row in the store is what callers display; the control is
//! what the ingestion loop itself obeys. Stop is level-triggered through a
//! [`CancellationToken`], pause through a `watch` channel so a paused loop
//! sleeps until resumed instead of polling.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::session::SessionStatus;

/// Result of passing a suspension point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checkpoint {
    Continue,
    Cancelled,
}

impl Checkpoint {
    pub fn is_cancelled(self) -> bool {
        self == Checkpoint::Cancelled
    }
}

/// Shared handle to one session's cooperative pause/stop state.
///
/// Cloning is cheap; all clones observe the same state.
#[derive(Debug, Clone)]
pub struct SessionControl {
    cancel: CancellationToken,
    paused: Arc<watch::Sender<bool>>,
    /// Set once the loop has left its last checkpoint. Guards `cancel`
    /// and `finish` so exactly one of them wins.
    finished: Arc<Mutex<bool>>,
}

impl Default for SessionControl {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionControl {
    pub fn new() -> Self {
        let (paused, _) = watch::channel(false);
        Self {
            cancel: CancellationToken::new(),
            paused: Arc::new(paused),
            finished: Arc::new(Mutex::new(false)),
        }
    }

    fn lock_finished(&self) -> MutexGuard<'_, bool> {
        self.finished
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn pause(&self) {
        if !self.is_cancelled() && !self.is_finished() {
            self.paused.send_replace(true);
        }
    }

    pub fn resume(&self) {
        self.paused.send_replace(false);
    }

    /// Signal stop. Every later suspension point returns `Cancelled`.
    ///
    /// Returns false, and signals nothing, once the loop has finished.
    pub fn cancel(&self) -> bool {
        let finished = self.lock_finished();
        if *finished {
            return false;
        }
        self.cancel.cancel();
        true
    }

    /// Mark the ingestion as past its last suspension point.
    ///
    /// Returns false when stop was signalled first; the loop must then
    /// treat the run as cancelled.
    pub fn finish(&self) -> bool {
        let mut finished = self.lock_finished();
        if self.cancel.is_cancelled() {
            return false;
        }
        *finished = true;
        true
    }

    pub fn is_finished(&self) -> bool {
        *self.lock_finished()
    }

    pub fn is_paused(&self) -> bool {
        *self.paused.borrow()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// The status the loop is in from its own point of view.
    pub fn status(&self) -> SessionStatus {
        if self.is_cancelled() || self.is_finished() {
            SessionStatus::Completed
        } else if self.is_paused() {
            SessionStatus::Paused
        } else {
            SessionStatus::Running
        }
    }

    /// Resolves once stop has been signalled.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await;
    }

    /// Block while paused. Returns immediately when running.
    pub async fn wait_if_paused(&self) -> Checkpoint {
        if self.is_cancelled() {
            return Checkpoint::Cancelled;
        }

        let mut rx = self.paused.subscribe();
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Checkpoint::Cancelled,
            resumed = async { rx.wait_for(|paused| !*paused).await.map(|_| ()) } => {
                match resumed {
                    Ok(()) => Checkpoint::Continue,
                    Err(_) => Checkpoint::Cancelled,
                }
            }
        }
    }

    /// Sleep for `duration` unless stop is signalled first.
    pub async fn sleep(&self, duration: Duration) -> Checkpoint {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Checkpoint::Cancelled,
            () = tokio::time::sleep(duration) => Checkpoint::Continue,
        }
    }
}
