use scout_client::{HttpListingSource, ReqwestVerifier};
use scout_core::SearchService;
use scout_db::{Database, PgStore};

/// The search pipeline as wired for the server.
pub type PipelineService = SearchService<HttpListingSource, PgStore, ReqwestVerifier>;

/// Shared application state, available to all route handlers via `State<Arc<AppState>>`.
pub struct AppState {
    pub db: Database,
    pub search: PipelineService,
    /// Bearer token required on every `/v1` route.
    pub api_key: String,
}
