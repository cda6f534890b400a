/// Process configuration for the retrieval and extraction layer.
///
/// All values are read from `PROPFEED_*` environment variables with
/// defaults suitable for polite crawling; see `config.rs` for the
/// variable names.
#[derive(Clone)]
pub struct AppConfig {
    /// User-Agent sent on every outbound request.
    pub user_agent: String,
    /// Total per-request timeout, connect included.
    pub request_timeout_secs: u64,
    /// Retries after the first attempt for transient/throttled failures.
    pub max_retries: u32,
    /// Base of the exponential backoff schedule (`base ^ attempt` seconds).
    pub backoff_base: f64,
    /// Minimum gap between consecutive requests to the same host.
    /// Specific listing hosts carry stricter built-in overrides.
    pub rate_gap_default_ms: u64,
    /// Cap on candidate URLs returned per listing site by a search.
    pub max_results_per_site: usize,
    /// Region/locale code passed to the search provider (e.g. `au-en`).
    pub search_region: String,
    /// Orchestrator-level retries of the structured search call before
    /// falling back to the provider's HTML mirrors.
    pub search_max_retries: u32,
    /// Pacing delay between the two site-scoped queries of one variant.
    pub search_pacing_delay_ms: u64,
    /// Optional outbound proxy for all fetches.
    pub proxy_url: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("user_agent", &self.user_agent)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("backoff_base", &self.backoff_base)
            .field("rate_gap_default_ms", &self.rate_gap_default_ms)
            .field("max_results_per_site", &self.max_results_per_site)
            .field("search_region", &self.search_region)
            .field("search_max_retries", &self.search_max_retries)
            .field("search_pacing_delay_ms", &self.search_pacing_delay_ms)
            // Proxy URLs may embed credentials.
            .field("proxy_url", &self.proxy_url.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}
