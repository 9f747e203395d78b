//! Client configuration.
//!
//! One immutable snapshot per client instance. The caller's composition
//! root owns the defaults; `ClientConfig::default()` plus struct-update
//! syntax replaces the process-wide mutable registry the wire protocol's
//! older clients used, so later default changes never reach existing
//! instances.

use std::time::Duration;

use taskforge_core::Credentials;

/// Options for one client instance. Immutable after construction.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL for REST entries; `None` falls back to the API
    /// description's own `baseUrl`.
    pub base_url: Option<String>,
    /// Exchange prefix for topic entries; `None` falls back to the API
    /// description's `exchangePrefix`.
    pub exchange_prefix: Option<String>,
    /// Credentials for signing. `None` (or unusable empty credentials)
    /// means unauthenticated calls.
    pub credentials: Option<Credentials>,
    /// Restrict signed calls to this scope set, independent of what the
    /// credentials could otherwise do.
    pub authorized_scopes: Option<Vec<String>>,
    /// Retries after the initial attempt; total attempts = max_retries + 1.
    pub max_retries: u32,
    /// Base unit of the exponential backoff.
    pub retry_delay_factor: Duration,
    /// Random jitter applied to each backoff delay, as a fraction of it.
    pub retry_randomization: f64,
    /// Upper bound on any single backoff delay.
    pub max_retry_delay: Duration,
    /// Per-request timeout handed to the HTTP client.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            exchange_prefix: None,
            credentials: None,
            authorized_scopes: None,
            max_retries: 5,
            retry_delay_factor: Duration::from_millis(100),
            retry_randomization: 0.25,
            max_retry_delay: Duration::from_secs(30),
            timeout: Duration::from_secs(30),
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_authorized_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.authorized_scopes = Some(scopes.into_iter().map(Into::into).collect());
        self
    }
}
