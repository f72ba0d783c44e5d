use std::time::Duration;

use chrono::TimeDelta;

use crate::error::AppError;

/// Tunables of the scrape-cache-dedup-verify pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Pause between two persisted records. Also a pause/stop point.
    pub record_delay: Duration,
    /// Deadline for a single website HEAD check.
    pub verify_timeout: Duration,
    /// How many website checks run at once.
    pub verify_concurrency: usize,
    /// Lifetime of a cache entry.
    pub cache_ttl: TimeDelta,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            record_delay: Duration::from_millis(300),
            verify_timeout: Duration::from_secs(5),
            verify_concurrency: 8,
            cache_ttl: TimeDelta::days(7),
        }
    }
}

impl PipelineConfig {
    /// Read overrides from environment variables, falling back to defaults.
    ///
    /// - `SCOUT_RECORD_DELAY_MS`
    /// - `SCOUT_VERIFY_TIMEOUT_SECS`
    /// - `SCOUT_VERIFY_CONCURRENCY`
    pub fn from_env() -> Result<Self, AppError> {
        let mut config = Self::default();

        if let Some(ms) = read_u64("SCOUT_RECORD_DELAY_MS", true)? {
            config.record_delay = Duration::from_millis(ms);
        }
        if let Some(secs) = read_u64("SCOUT_VERIFY_TIMEOUT_SECS", false)? {
            config.verify_timeout = Duration::from_secs(secs);
        }
        if let Some(n) = read_u64("SCOUT_VERIFY_CONCURRENCY", false)? {
            config.verify_concurrency = n as usize;
        }

        Ok(config)
    }

    pub fn with_record_delay(mut self, delay: Duration) -> Self {
        self.record_delay = delay;
        self
    }

    pub fn with_verify_timeout(mut self, timeout: Duration) -> Self {
        self.verify_timeout = timeout;
        self
    }

    pub fn with_verify_concurrency(mut self, n: usize) -> Self {
        self.verify_concurrency = n.max(1);
        self
    }

    pub fn with_cache_ttl(mut self, ttl: TimeDelta) -> Self {
        self.cache_ttl = ttl;
        self
    }
}

fn read_u64(var: &str, allow_zero: bool) -> Result<Option<u64>, AppError> {
    let Ok(raw) = std::env::var(var) else {
        return Ok(None);
    };
    let parsed: u64 = raw.trim().parse().map_err(|_| {
        AppError::ConfigError(format!("Invalid {var} '{raw}': must be a non-negative integer"))
    })?;
    if parsed == 0 && !allow_zero {
        return Err(AppError::ConfigError(format!("{var} must be at least 1")));
    }
    Ok(Some(parsed))
}
