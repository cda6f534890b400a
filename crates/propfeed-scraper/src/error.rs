use thiserror::Error;

/// Errors from the rate-limited fetch client.
///
/// Retryability is a property of the variant: `Http` and `Throttled` are
/// transient and retried with backoff; everything else is surfaced
/// immediately.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure: connect/read timeout, connection reset,
    /// protocol error.
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP 429/403/503 — the host is throttling us. Carries the parsed
    /// `Retry-After` header when the server sent an integer one.
    #[error("throttled by {host} (retry after {retry_after_secs:?}s)")]
    Throttled {
        host: String,
        retry_after_secs: Option<u64>,
    },

    #[error("resource not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Errors from fetch-and-extract of a single listing page.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("unsupported listing site: {url}")]
    UnsupportedSite { url: String },

    #[error(transparent)]
    Fetch(#[from] FetchError),
}
