use uuid::Uuid;

use crate::error::AppError;
use crate::models::NewSearchLogEntry;
use crate::traits::SearchLogStore;

/// Append-only audit trail of searches.
#[derive(Clone)]
pub struct ActivityLogger<L: SearchLogStore> {
    store: L,
}

impl<L: SearchLogStore> ActivityLogger<L> {
    pub fn new(store: L) -> Self {
        Self { store }
    }

    /// Append one entry. Callers log the error and carry on.
    pub async fn log(
        &self,
        owner_id: Uuid,
        business_type: &str,
        location: &str,
        result_count: u32,
        was_cached: bool,
    ) -> Result<Uuid, AppError> {
        let entry = NewSearchLogEntry {
            owner_id,
            business_type: business_type.to_string(),
            location: location.to_string(),
            result_count,
            was_cached,
        };
        let id = self.store.append(&entry).await?;
        tracing::debug!(log_id = %id, %owner_id, was_cached, result_count, "Search logged");
        Ok(id)
    }
}
