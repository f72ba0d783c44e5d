//! Dedup & verification pass over the raw listings of a finished session.

use std::collections::HashSet;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::error::AppError;
use crate::models::{NewProcessedListing, ProcessingSummary, RawListing};
use crate::query::{dedup_key, with_scheme};
use crate::session::ProcessingStatus;
use crate::traits::{ListingStore, SessionStore, WebsiteVerifier};

/// Outcome of one website check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Verdict {
    status_code: Option<u16>,
    verified: bool,
}

impl Verdict {
    const UNVERIFIED: Verdict = Verdict {
        status_code: None,
        verified: false,
    };
}

/// Keep the first record of every dedup key, in ingestion order.
///
/// Input must already be sorted by position. Returns the candidates and the
/// number of records skipped as duplicates.
pub fn first_occurrences(raw: &[RawListing]) -> (Vec<&RawListing>, usize) {
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();
    let mut skipped = 0;

    for record in raw {
        let key = dedup_key(&record.listing.name, record.listing.address.as_deref());
        if seen.insert(key) {
            candidates.push(record);
        } else {
            skipped += 1;
        }
    }

    (candidates, skipped)
}

pub struct DedupEngine<S, V>
where
    S: ListingStore + SessionStore,
    V: WebsiteVerifier,
{
    store: S,
    verifier: V,
    timeout: Duration,
    concurrency: usize,
}

impl<S, V> DedupEngine<S, V>
where
    S: ListingStore + SessionStore,
    V: WebsiteVerifier,
{
    pub fn new(store: S, verifier: V, config: &PipelineConfig) -> Self {
        Self {
            store,
            verifier,
            timeout: config.verify_timeout,
            concurrency: config.verify_concurrency.max(1),
        }
    }

    /// Dedup, verify and persist the session's raw listings.
    ///
    /// `processing_status` is set to completed even when the processed batch
    /// cannot be written; the write error is returned afterwards.
    pub async fn process(&self, session_id: Uuid) -> Result<ProcessingSummary, AppError> {
        let mut raw = self.store.raw_listings(session_id).await?;
        raw.sort_by_key(|r| r.position);

        let (processed, summary) = self.evaluate(&raw).await;

        let persisted = if processed.is_empty() {
            Ok(0)
        } else {
            self.store.insert_processed(&processed).await
        };

        let marked = self
            .store
            .set_processing_status(session_id, ProcessingStatus::Completed)
            .await;

        let written = persisted.inspect_err(|e| {
            tracing::error!(%session_id, error = %e, "Failed to persist processed listings");
        })?;
        marked?;

        tracing::info!(
            %session_id,
            written,
            total_raw = summary.total_raw,
            duplicates_skipped = summary.duplicates_skipped,
            unverified_dropped = summary.unverified_dropped,
            "Session processed"
        );
        Ok(summary)
    }

    /// The processed rows a pass over `raw` would write, without writing them.
    ///
    /// `raw` must be sorted by position.
    pub async fn evaluate(&self, raw: &[RawListing]) -> (Vec<NewProcessedListing>, ProcessingSummary) {
        let (candidates, duplicates_skipped) = first_occurrences(raw);

        let mut verdicts = vec![Verdict::UNVERIFIED; candidates.len()];
        let urls: Vec<(usize, String)> = candidates
            .iter()
            .enumerate()
            .filter_map(|(i, record)| record.listing.website_url().map(|url| (i, with_scheme(url))))
            .collect();
        let checks: Vec<(usize, Verdict)> = stream::iter(urls)
        .map(|(i, url)| async move { (i, self.verify(&url).await) })
        .buffer_unordered(self.concurrency)
        .collect()
        .await;
        for (i, verdict) in checks {
            verdicts[i] = verdict;
        }

        let processed: Vec<NewProcessedListing> = candidates
            .iter()
            .zip(&verdicts)
            .filter(|(_, verdict)| verdict.verified)
            .map(|(record, verdict)| NewProcessedListing {
                session_id: record.session_id,
                raw_listing_id: record.id,
                position: record.position,
                listing: record.listing.clone(),
                is_duplicate: false,
                is_website_verified: true,
                website_status_code: verdict.status_code,
            })
            .collect();

        let summary = ProcessingSummary {
            processed: processed.len(),
            total_raw: raw.len(),
            duplicates_removed: raw.len() - processed.len(),
            duplicates_skipped,
            unverified_dropped: candidates.len() - processed.len(),
        };
        (processed, summary)
    }

    async fn verify(&self, url: &str) -> Verdict {
        match tokio::time::timeout(self.timeout, self.verifier.check(url)).await {
            Ok(Ok(code)) if (200..400).contains(&code) => Verdict {
                status_code: Some(code),
                verified: true,
            },
            Ok(Ok(code)) => {
                tracing::warn!(%url, status = code, "Website answered with a non-success status");
                Verdict {
                    status_code: Some(code),
                    verified: false,
                }
            }
            Ok(Err(e)) => {
                tracing::warn!(%url, error = %e, "Website check failed");
                Verdict::UNVERIFIED
            }
            Err(_) => {
                tracing::warn!(%url, timeout_secs = self.timeout.as_secs(), "Website check timed out");
                Verdict::UNVERIFIED
            }
        }
    }
}
