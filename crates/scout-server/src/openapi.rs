use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Scout API",
        version = "0.3.0",
        description = "Business listing searches with session control, deduplication and website verification."
    ),
    paths(
        crate::routes::start_search,
        crate::routes::get_session,
        crate::routes::pause_session,
        crate::routes::resume_session,
        crate::routes::stop_session,
        crate::routes::raw_listings,
        crate::routes::processed_listings,
        crate::routes::health,
    ),
    components(schemas(
        crate::dto::StartSearchRequest,
        crate::dto::SearchResponse,
        crate::dto::SessionResponse,
        crate::dto::ListingResponse,
        crate::dto::ListingListResponse,
        crate::dto::HealthResponse,
        crate::dto::ErrorResponse,
    )),
    tags(
        (name = "searches", description = "Start cached or fresh listing searches"),
        (name = "sessions", description = "Session status and pause/resume/stop"),
        (name = "listings", description = "Raw and processed listings of a session"),
        (name = "system", description = "Health and system status"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Adds the Bearer token security scheme to the OpenAPI document.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("token")
                        .description(Some(
                            "Server API key. Set via SCOUT_SERVER_API_KEY environment variable.",
                        ))
                        .build(),
                ),
            );
        }
    }
}
