//! Rate-limited HTTP fetch client.
//!
//! Every outbound request in the aggregator goes through [`FetchClient`]:
//! it paces requests per destination host, retries transient and throttling
//! failures with exponential backoff, and classifies HTTP statuses into
//! typed errors. Callers choose between a decoded text body and raw bytes;
//! the same pacing and retry machinery underlies both.

mod host_gate;

use std::sync::Arc;
use std::time::Duration;

use rand::seq::IndexedRandom;
use rand::Rng;
use reqwest::Client;

use crate::error::FetchError;
use crate::rate_limit::retry_with_backoff;
use host_gate::HostGate;

/// Accept-Language values rotated through occasionally to reduce
/// fingerprinting; the first entry is the default.
const ACCEPT_LANGUAGE_POOL: &[&str] = &["en-US,en;q=0.9", "en-AU,en;q=0.9"];
const ACCEPT_LANGUAGE_ROTATE_P: f64 = 0.25;

/// Construction parameters for [`FetchClient`].
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Retries after the first attempt for retriable errors. `0` disables.
    pub max_retries: u32,
    /// Base of the backoff schedule: `base ^ attempt` seconds plus jitter.
    pub backoff_base: f64,
    /// Minimum gap between requests to the same host, unless the host has
    /// a stricter built-in override.
    pub default_gap_ms: u64,
    pub proxy_url: Option<String>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 20,
            user_agent: "propfeed/0.1 (listing-aggregator)".to_owned(),
            max_retries: 5,
            backoff_base: 1.8,
            default_gap_ms: 1500,
            proxy_url: None,
        }
    }
}

/// Per-call request overrides.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    pub referer: Option<String>,
    /// Overrides the client-wide retry budget for this call. `Some(0)` lets
    /// a caller observe throttling directly and run its own retry policy.
    pub max_retries: Option<u32>,
}

/// Rate-limited HTTP GET client with retry and typed status classification.
///
/// Cheap to clone; clones share the underlying connection pool and the
/// per-host pacing state, so no caller can bypass the host gate by
/// cloning.
#[derive(Debug, Clone)]
pub struct FetchClient {
    client: Client,
    gate: Arc<HostGate>,
    max_retries: u32,
    backoff_base: f64,
}

impl FetchClient {
    /// Creates a `FetchClient` with configured timeout, `User-Agent`,
    /// retry policy, host pacing, and optional outbound proxy.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidUrl`] for an unparseable proxy URL and
    /// [`FetchError::Http`] if the underlying `reqwest::Client` cannot be
    /// constructed.
    pub fn new(settings: &FetchSettings) -> Result<Self, FetchError> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(&settings.user_agent);

        if let Some(proxy_url) = &settings.proxy_url {
            let proxy = reqwest::Proxy::all(proxy_url).map_err(|e| FetchError::InvalidUrl {
                url: proxy_url.clone(),
                reason: format!("not a valid proxy URL: {e}"),
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build()?;
        Ok(Self {
            client,
            gate: Arc::new(HostGate::new(settings.default_gap_ms)),
            max_retries: settings.max_retries,
            backoff_base: settings.backoff_base,
        })
    }

    /// Creates a `FetchClient` from the application configuration.
    ///
    /// # Errors
    ///
    /// Same as [`FetchClient::new`].
    pub fn from_config(config: &propfeed_core::AppConfig) -> Result<Self, FetchError> {
        Self::new(&FetchSettings {
            timeout_secs: config.request_timeout_secs,
            user_agent: config.user_agent.clone(),
            max_retries: config.max_retries,
            backoff_base: config.backoff_base,
            default_gap_ms: config.rate_gap_default_ms,
            proxy_url: config.proxy_url.clone(),
        })
    }

    /// Fetches `url` and decodes the response body as text.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Throttled`] — 429/403/503 after all retries exhausted.
    /// - [`FetchError::NotFound`] — HTTP 404 (not retried).
    /// - [`FetchError::UnexpectedStatus`] — any other non-2xx status (not retried).
    /// - [`FetchError::Http`] — transport failure after all retries exhausted.
    /// - [`FetchError::InvalidUrl`] — the URL has no parseable host.
    pub async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        self.get_text_with(url, &FetchOptions::default()).await
    }

    /// [`FetchClient::get_text`] with per-call options.
    ///
    /// # Errors
    ///
    /// Same as [`FetchClient::get_text`].
    pub async fn get_text_with(
        &self,
        url: &str,
        options: &FetchOptions,
    ) -> Result<String, FetchError> {
        let host = host_of(url)?;
        let max_retries = options.max_retries.unwrap_or(self.max_retries);
        retry_with_backoff(max_retries, self.backoff_base, || async {
            let response = self
                .attempt(url, &host, options.referer.as_deref())
                .await?;
            Ok(response.text().await?)
        })
        .await
    }

    /// Fetches `url` and returns the undecoded response body.
    ///
    /// # Errors
    ///
    /// Same as [`FetchClient::get_text`].
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.get_bytes_with(url, &FetchOptions::default()).await
    }

    /// [`FetchClient::get_bytes`] with per-call options.
    ///
    /// # Errors
    ///
    /// Same as [`FetchClient::get_text`].
    pub async fn get_bytes_with(
        &self,
        url: &str,
        options: &FetchOptions,
    ) -> Result<Vec<u8>, FetchError> {
        let host = host_of(url)?;
        let max_retries = options.max_retries.unwrap_or(self.max_retries);
        retry_with_backoff(max_retries, self.backoff_base, || async {
            let response = self
                .attempt(url, &host, options.referer.as_deref())
                .await?;
            Ok(response.bytes().await?.to_vec())
        })
        .await
    }

    /// Clears per-host pacing state between logical runs. Pacing state only
    /// affects request spacing, never result correctness.
    pub async fn reset_pacing(&self) {
        self.gate.reset().await;
    }

    /// One paced dispatch with status classification. Cancellation during
    /// the pacing wait leaves the host's last-hit time unchanged.
    async fn attempt(
        &self,
        url: &str,
        host: &str,
        referer: Option<&str>,
    ) -> Result<reqwest::Response, FetchError> {
        self.gate.pace(host).await;

        let accept_language = {
            let mut rng = rand::rng();
            if rng.random_bool(ACCEPT_LANGUAGE_ROTATE_P) {
                ACCEPT_LANGUAGE_POOL
                    .choose(&mut rng)
                    .copied()
                    .unwrap_or(ACCEPT_LANGUAGE_POOL[0])
            } else {
                ACCEPT_LANGUAGE_POOL[0]
            }
        };

        let mut request = self
            .client
            .get(url)
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header(reqwest::header::ACCEPT_LANGUAGE, accept_language)
            .header(reqwest::header::CACHE_CONTROL, "no-cache");

        if let Some(referer) = referer {
            request = request.header(reqwest::header::REFERER, referer);
        }

        let response = request.send().await?;
        let status = response.status();

        if matches!(status.as_u16(), 429 | 403 | 503) {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok());
            return Err(FetchError::Throttled {
                host: host.to_owned(),
                retry_after_secs,
            });
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound {
                url: url.to_owned(),
            });
        }

        if !status.is_success() {
            return Err(FetchError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        Ok(response)
    }
}

/// Normalized (lowercased) host of a URL, for pacing and error messages.
fn host_of(url: &str) -> Result<String, FetchError> {
    let parsed = reqwest::Url::parse(url).map_err(|e| FetchError::InvalidUrl {
        url: url.to_owned(),
        reason: e.to_string(),
    })?;
    parsed
        .host_str()
        .map(str::to_lowercase)
        .ok_or_else(|| FetchError::InvalidUrl {
            url: url.to_owned(),
            reason: "URL has no host".to_owned(),
        })
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
