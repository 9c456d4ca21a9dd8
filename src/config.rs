use std::env;
use std::time::Duration;

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Base URL of the notification backend.
    pub api_url: String,
    /// TTL for cached list responses.
    pub list_ttl: Duration,
    /// Background refresh interval.
    pub refresh_interval: Duration,
    /// Default page size for list fetches (max 100).
    pub page_size: i64,
    /// Roll back optimistic mutations when the remote call fails.
    ///
    /// Off by default: the shipped behavior keeps the optimistic state and
    /// lets the next fetch reconcile, since the list caches are invalidated
    /// on every mutation anyway.
    pub rollback_on_failure: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3001/api".to_string(),
            list_ttl: Duration::from_secs(30),
            refresh_interval: Duration::from_secs(60),
            page_size: 20,
            rollback_on_failure: false,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let api_url = env::var("NOTIFICATIONS_API_URL").unwrap_or(defaults.api_url);

        let list_ttl = env::var("NOTIFICATIONS_CACHE_TTL_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.list_ttl);

        let refresh_interval = env::var("NOTIFICATIONS_REFRESH_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.refresh_interval);

        let page_size: i64 = env::var("NOTIFICATIONS_PAGE_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.page_size);

        let rollback_on_failure = env::var("NOTIFICATIONS_ROLLBACK_ON_FAILURE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.rollback_on_failure);

        Self {
            api_url,
            list_ttl,
            refresh_interval,
            page_size: page_size.clamp(1, 100),
            rollback_on_failure,
        }
    }
}
