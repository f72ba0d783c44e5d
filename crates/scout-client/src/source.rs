use std::time::Duration;

use reqwest::Client;
use scout_core::error::AppError;
use scout_core::listing::Listing;
use scout_core::traits::ListingSource;
use serde::{Deserialize, Serialize};

const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(120);

/// Listing source backed by an HTTP search endpoint.
///
/// Sends `{business_type, location}` as JSON and expects
/// `{success, listings, error?}` back. Any non-2xx status or
/// `success: false` is a [`AppError::SourceFetchError`].
#[derive(Clone)]
pub struct HttpListingSource {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    timeout_secs: u64,
}

impl HttpListingSource {
    pub fn new(endpoint: &str) -> Result<Self, AppError> {
        Self::build(endpoint, None, DEFAULT_SOURCE_TIMEOUT)
    }

    /// Build from environment variables.
    ///
    /// - `SCOUT_SOURCE_URL` (required)
    /// - `SCOUT_SOURCE_API_KEY` (optional bearer token)
    pub fn from_env() -> Result<Self, AppError> {
        let endpoint = std::env::var("SCOUT_SOURCE_URL").map_err(|_| {
            AppError::ConfigError("SCOUT_SOURCE_URL not set. Required for listing searches.".into())
        })?;
        let source = Self::new(&endpoint)?;
        Ok(match std::env::var("SCOUT_SOURCE_API_KEY") {
            Ok(key) if !key.trim().is_empty() => source.with_api_key(key.trim()),
            _ => source,
        })
    }

    /// Send the key as a bearer token on every request.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Result<Self, AppError> {
        Self::build(&self.endpoint, self.api_key, timeout)
    }

    fn build(endpoint: &str, api_key: Option<String>, timeout: Duration) -> Result<Self, AppError> {
        url::Url::parse(endpoint)
            .map_err(|e| AppError::ConfigError(format!("Invalid listing source URL: {e}")))?;

        let client = Client::builder()
            .user_agent("Scout/0.3")
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_key,
            timeout_secs: timeout.as_secs(),
        })
    }
}

// ---- Wire types ----

#[derive(Serialize)]
struct SearchRequest<'a> {
    business_type: &'a str,
    location: &'a str,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    listings: Vec<Listing>,
    error: Option<String>,
}

impl ListingSource for HttpListingSource {
    async fn search(&self, business_type: &str, location: &str) -> Result<Vec<Listing>, AppError> {
        let mut request = self.client.post(&self.endpoint).json(&SearchRequest {
            business_type,
            location,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::source(format!("Request timed out after {} seconds", self.timeout_secs))
            } else if e.is_connect() {
                AppError::source(format!("Connection failed: {e}"))
            } else {
                AppError::source(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::source(format!("Failed to read response body: {e}")))?;

        parse_response(status, &body)
    }
}

fn parse_response(status: u16, body: &str) -> Result<Vec<Listing>, AppError> {
    if !(200..300).contains(&status) {
        let message = serde_json::from_str::<SearchResponse>(body)
            .ok()
            .and_then(|r| r.error)
            .unwrap_or_else(|| format!("HTTP {status}: {body}"));
        return Err(AppError::SourceFetchError {
            message,
            status_code: Some(status),
        });
    }

    let parsed: SearchResponse = serde_json::from_str(body).map_err(|e| AppError::SourceFetchError {
        message: format!("Malformed listing response: {e}"),
        status_code: Some(status),
    })?;

    if !parsed.success {
        return Err(AppError::SourceFetchError {
            message: parsed
                .error
                .unwrap_or_else(|| "Listing source reported failure".to_string()),
            status_code: Some(status),
        });
    }

    let total = parsed.listings.len();
    let listings: Vec<Listing> = parsed
        .listings
        .into_iter()
        .filter(|l| !l.name.trim().is_empty())
        .collect();
    if listings.len() < total {
        tracing::warn!(dropped = total - listings.len(), "Dropped unnamed listings from source");
    }
    Ok(listings)
}
