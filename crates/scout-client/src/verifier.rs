use std::future::Future;
use std::net::IpAddr;
use std::time::Duration;

use reqwest::Client;
use reqwest::header::LOCATION;
use reqwest::redirect::Policy;
use scout_core::error::AppError;
use scout_core::traits::WebsiteVerifier;
use url::Url;

const MAX_REDIRECTS: usize = 10;

/// Website liveness check: a `HEAD` request, redirects followed by hand
/// up to a fixed number of hops.
///
/// Listing websites come from a third party, so SSRF protection is
/// **enabled** by default: the first target and every redirect hop are
/// refused when they resolve to private/reserved IPs. Use [`allow_private_urls`](Self::allow_private_urls) to disable
/// this for CLI usage where the user controls the machine.
#[derive(Clone)]
pub struct ReqwestVerifier {
    client: Client,
    timeout_secs: u64,
    ssrf_protection: bool,
}

impl ReqwestVerifier {
    pub fn new() -> Result<Self, AppError> {
        Self::with_timeout(Duration::from_secs(5))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent("Scout/0.3 (website check)")
            .timeout(timeout)
            .redirect(Policy::none())
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;

        Ok(Self {
            client,
            timeout_secs: timeout.as_secs(),
            ssrf_protection: true,
        })
    }

    /// Disable SSRF protection, allowing checks against private/reserved IPs.
    pub fn allow_private_urls(mut self) -> Self {
        self.ssrf_protection = false;
        self
    }
}

impl WebsiteVerifier for ReqwestVerifier {
    async fn check(&self, url: &str) -> Result<u16, AppError> {
        let url =
            Url::parse(url).map_err(|e| AppError::VerificationError(format!("Invalid URL: {e}")))?;
        let protect = self.ssrf_protection;

        self.follow(url, |hop| async move {
            if protect {
                validate_url(hop.as_str()).await
            } else {
                Ok(())
            }
        })
        .await
    }
}

impl ReqwestVerifier {
    /// Walk the redirect chain, running `guard` on each target before it is
    /// requested. Returns the status of the first non-redirect response.
    async fn follow<F, Fut>(&self, start: Url, guard: F) -> Result<u16, AppError>
    where
        F: Fn(Url) -> Fut,
        Fut: Future<Output = Result<(), AppError>>,
    {
        let mut current = start;

        for _ in 0..=MAX_REDIRECTS {
            guard(current.clone()).await?;

            let response = self
                .client
                .head(current.clone())
                .send()
                .await
                .map_err(|e| self.request_error(e))?;
            let status = response.status();
            if !status.is_redirection() {
                return Ok(status.as_u16());
            }

            // A redirect status without a target is the final answer.
            let Some(location) = response.headers().get(LOCATION) else {
                return Ok(status.as_u16());
            };
            let location = location.to_str().map_err(|_| {
                AppError::VerificationError("Redirect location is not valid UTF-8".to_string())
            })?;
            current = current.join(location).map_err(|e| {
                AppError::VerificationError(format!("Invalid redirect location '{location}': {e}"))
            })?;
            tracing::debug!(to = %current, status = status.as_u16(), "Following redirect");
        }

        Err(AppError::VerificationError(format!(
            "Too many redirects (more than {MAX_REDIRECTS})"
        )))
    }

    fn request_error(&self, e: reqwest::Error) -> AppError {
        if e.is_timeout() {
            AppError::Timeout(self.timeout_secs)
        } else if e.is_connect() {
            AppError::NetworkError(format!("Connection failed: {e}"))
        } else {
            AppError::HttpError(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// SSRF protection
// ---------------------------------------------------------------------------

/// Reject non-http(s) URLs and hosts resolving to private/reserved IPs.
async fn validate_url(url: &str) -> Result<(), AppError> {
    let parsed =
        Url::parse(url).map_err(|e| AppError::VerificationError(format!("Invalid URL: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(AppError::VerificationError(format!(
                "URL scheme '{scheme}' is not allowed (only http/https)"
            )));
        }
    }

    let host = parsed
        .host_str()
        .ok_or_else(|| AppError::VerificationError("URL has no host".to_string()))?;

    // IPv6 literals come back bracketed.
    let literal = host.trim_start_matches('[').trim_end_matches(']');
    if let Ok(ip) = literal.parse::<IpAddr>() {
        if is_private_ip(ip) {
            return Err(AppError::VerificationError(format!(
                "SSRF blocked: {host} is a private/reserved IP"
            )));
        }
        return Ok(());
    }

    let port = parsed.port_or_known_default().unwrap_or(443);
    let addrs: Vec<_> = tokio::net::lookup_host((host, port))
        .await
        .map_err(|e| AppError::NetworkError(format!("DNS resolution failed for {host}: {e}")))?
        .collect();

    if addrs.is_empty() {
        return Err(AppError::NetworkError(format!(
            "DNS resolution returned no addresses for {host}"
        )));
    }

    if let Some(blocked) = addrs.iter().find(|a| is_private_ip(a.ip())) {
        return Err(AppError::VerificationError(format!(
            "SSRF blocked: {host} resolves to private/reserved IP {}",
            blocked.ip()
        )));
    }

    Ok(())
}

fn is_private_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local() // 169.254.0.0/16, cloud metadata
                || v4.is_unspecified()
                || v4.is_broadcast()
                || v4.is_documentation()
                || v4.octets()[0] == 100 && (v4.octets()[1] & 0xC0) == 64 // 100.64.0.0/10
        }
        IpAddr::V6(v6) => {
            v6.is_loopback()
                || v6.is_unspecified()
                || (v6.segments()[0] & 0xFFC0) == 0xFE80 // fe80::/10
                || (v6.segments()[0] & 0xFE00) == 0xFC00 // fc00::/7
                || v6
                    .to_ipv4_mapped()
                    .is_some_and(|v4| is_private_ip(IpAddr::V4(v4)))
        }
    }
}
