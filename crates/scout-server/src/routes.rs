use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use scout_core::error::AppError;
use scout_core::session::Session;
use scout_core::traits::{ListingStore, SessionStore};
use scout_core::{SearchStart, TracingIngestReporter};

use crate::auth::{Owner, require_api_key};
use crate::dto::{
    HealthResponse, ListingListResponse, ListingResponse, SearchResponse, SessionResponse,
    StartSearchRequest,
};
use crate::error::ApiError;
use crate::openapi::ApiDoc;
use crate::state::AppState;

/// Build the full router with all routes and middleware.
pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/v1/searches", post(start_search))
        .route("/v1/sessions/{id}", get(get_session))
        .route("/v1/sessions/{id}/pause", post(pause_session))
        .route("/v1/sessions/{id}/resume", post(resume_session))
        .route("/v1/sessions/{id}/stop", post(stop_session))
        .route("/v1/sessions/{id}/listings", get(raw_listings))
        .route("/v1/sessions/{id}/processed", get(processed_listings))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ));

    let public = Router::new()
        .route("/health", get(health))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    public.merge(api).with_state(state)
}

/// Fetch a session of this owner, 404 otherwise.
async fn owned_session(state: &AppState, id: Uuid, owner: Owner) -> Result<Session, ApiError> {
    state
        .search
        .store()
        .get_session(id, owner.0)
        .await?
        .ok_or_else(|| ApiError(AppError::NotFound(format!("Session {id} not found"))))
}

// ---------------------------------------------------------------------------
// Searches
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/v1/searches",
    request_body = StartSearchRequest,
    params(("x-owner-id" = Uuid, Header, description = "Owner of the search")),
    responses(
        (status = 200, description = "Answered from cache", body = SearchResponse),
        (status = 202, description = "Session started, ingesting in background", body = SearchResponse),
        (status = 400, description = "Bad request", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "searches"
)]
pub async fn start_search(
    State(state): State<Arc<AppState>>,
    owner: Owner,
    axum::Json(body): axum::Json<StartSearchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let business_type = body.business_type.trim();
    let location = body.location.trim();
    if business_type.is_empty() || location.is_empty() {
        return Err(ApiError::validation(
            "business_type and location must not be empty",
        ));
    }

    match state.search.start(owner.0, business_type, location).await? {
        SearchStart::Cached {
            session_id,
            result_count,
        } => Ok((
            StatusCode::OK,
            axum::Json(SearchResponse {
                session_id,
                cached: true,
                result_count: Some(result_count),
            }),
        )),
        SearchStart::Started { session, control } => {
            let session_id = session.id;
            let search = state.search.clone();
            tokio::spawn(async move {
                // run() logs and settles its own failures.
                let _ = search.run(&session, &control, &TracingIngestReporter).await;
            });

            Ok((
                StatusCode::ACCEPTED,
                axum::Json(SearchResponse {
                    session_id,
                    cached: false,
                    result_count: None,
                }),
            ))
        }
    }
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/v1/sessions/{id}",
    params(
        ("id" = Uuid, Path, description = "Session ID"),
        ("x-owner-id" = Uuid, Header, description = "Owner of the session"),
    ),
    responses(
        (status = 200, description = "Session details", body = SessionResponse),
        (status = 404, description = "Session not found", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "sessions"
)]
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    owner: Owner,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let session = owned_session(&state, id, owner).await?;
    Ok(axum::Json(SessionResponse::from(session)))
}

#[utoipa::path(
    post,
    path = "/v1/sessions/{id}/pause",
    params(
        ("id" = Uuid, Path, description = "Session ID"),
        ("x-owner-id" = Uuid, Header, description = "Owner of the session"),
    ),
    responses(
        (status = 200, description = "Session paused", body = SessionResponse),
        (status = 404, description = "Session not found or not ingesting", body = crate::dto::ErrorResponse),
        (status = 409, description = "Session is not running", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "sessions"
)]
pub async fn pause_session(
    State(state): State<Arc<AppState>>,
    owner: Owner,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let session = owned_session(&state, id, owner).await?;
    state.search.manager().pause(&session).await?;
    let session = owned_session(&state, id, owner).await?;
    Ok(axum::Json(SessionResponse::from(session)))
}

#[utoipa::path(
    post,
    path = "/v1/sessions/{id}/resume",
    params(
        ("id" = Uuid, Path, description = "Session ID"),
        ("x-owner-id" = Uuid, Header, description = "Owner of the session"),
    ),
    responses(
        (status = 200, description = "Session resumed", body = SessionResponse),
        (status = 404, description = "Session not found or not ingesting", body = crate::dto::ErrorResponse),
        (status = 409, description = "Session is not paused", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "sessions"
)]
pub async fn resume_session(
    State(state): State<Arc<AppState>>,
    owner: Owner,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let session = owned_session(&state, id, owner).await?;
    state.search.manager().resume(&session).await?;
    let session = owned_session(&state, id, owner).await?;
    Ok(axum::Json(SessionResponse::from(session)))
}

/// Stop never fails once the session is found; stopping a finished
/// session is a no-op.
#[utoipa::path(
    post,
    path = "/v1/sessions/{id}/stop",
    params(
        ("id" = Uuid, Path, description = "Session ID"),
        ("x-owner-id" = Uuid, Header, description = "Owner of the session"),
    ),
    responses(
        (status = 202, description = "Stop requested", body = SessionResponse),
        (status = 404, description = "Session not found", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "sessions"
)]
pub async fn stop_session(
    State(state): State<Arc<AppState>>,
    owner: Owner,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let session = owned_session(&state, id, owner).await?;
    state.search.manager().stop(&session).await;
    let session = owned_session(&state, id, owner).await?;
    Ok((StatusCode::ACCEPTED, axum::Json(SessionResponse::from(session))))
}

// ---------------------------------------------------------------------------
// Listings
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/v1/sessions/{id}/listings",
    params(
        ("id" = Uuid, Path, description = "Session ID"),
        ("x-owner-id" = Uuid, Header, description = "Owner of the session"),
    ),
    responses(
        (status = 200, description = "Raw listings in source order", body = ListingListResponse),
        (status = 404, description = "Session not found", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "listings"
)]
pub async fn raw_listings(
    State(state): State<Arc<AppState>>,
    owner: Owner,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let session = owned_session(&state, id, owner).await?;
    let listings: Vec<ListingResponse> = state
        .search
        .store()
        .raw_listings(session.id)
        .await?
        .into_iter()
        .map(ListingResponse::from)
        .collect();

    Ok(axum::Json(ListingListResponse {
        session_id: session.id,
        total: listings.len(),
        listings,
    }))
}

#[utoipa::path(
    get,
    path = "/v1/sessions/{id}/processed",
    params(
        ("id" = Uuid, Path, description = "Session ID"),
        ("x-owner-id" = Uuid, Header, description = "Owner of the session"),
    ),
    responses(
        (status = 200, description = "Deduplicated, verified listings", body = ListingListResponse),
        (status = 404, description = "Session not found", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "listings"
)]
pub async fn processed_listings(
    State(state): State<Arc<AppState>>,
    owner: Owner,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let session = owned_session(&state, id, owner).await?;
    let listings: Vec<ListingResponse> = state
        .search
        .store()
        .processed_listings(session.id)
        .await?
        .into_iter()
        .map(ListingResponse::from)
        .collect();

    Ok(axum::Json(ListingListResponse {
        session_id: session.id,
        total: listings.len(),
        listings,
    }))
}

// ---------------------------------------------------------------------------
// System
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse),
        (status = 503, description = "Service unhealthy", body = HealthResponse),
    ),
    tag = "system"
)]
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let db_ok = state.db.health_check().await.is_ok();

    let (status, response) = if db_ok {
        (
            StatusCode::OK,
            HealthResponse {
                status: "healthy",
                database: "ok",
            },
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            HealthResponse {
                status: "unhealthy",
                database: "error",
            },
        )
    };

    (status, axum::Json(response))
}
