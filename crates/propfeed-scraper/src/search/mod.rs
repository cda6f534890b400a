//! Address search against the upstream search provider.
//!
//! For each query variant and target site the orchestrator issues one
//! site-scoped structured query, retrying throttled calls with exponential
//! backoff; on exhaustion (or any other failure) it falls back to scraping
//! the provider's own HTML result mirrors in fixed priority order. A query
//! whose fallback also comes up empty degrades to zero candidates rather
//! than aborting the whole address lookup.

mod links;
mod variants;

pub use links::normalize_result_link;
pub use variants::query_variants;

use std::time::Duration;

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::client::{FetchClient, FetchOptions};
use crate::error::FetchError;
use crate::rate_limit::backoff_schedule;
use crate::sites::Site;

/// Structured result endpoint of the provider; returns a JS payload whose
/// result objects carry the destination URL in a `"u"` field.
const DEFAULT_STRUCTURED_ENDPOINT: &str = "https://links.duckduckgo.com/d.js";

/// Provider HTML mirrors, tried in priority order when the structured
/// endpoint is throttled out or fails.
const DEFAULT_MIRROR_ENDPOINTS: &[&str] = &[
    "https://html.duckduckgo.com/html/",
    "https://duckduckgo.com/html/",
    "https://lite.duckduckgo.com/lite/",
];

#[derive(Debug, Error)]
pub enum SearchError {
    /// Every structured attempt was throttled and the HTML fallback
    /// produced nothing; the caller should retry later.
    #[error("search provider rate-limited, retry later")]
    ProviderRateLimited,
}

/// Candidate listing URLs per target site: ordered, deduplicated, capped.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchResults {
    pub realestate: Vec<String>,
    pub domain: Vec<String>,
}

impl SearchResults {
    #[must_use]
    pub fn for_site(&self, site: Site) -> &[String] {
        match site {
            Site::Realestate => &self.realestate,
            Site::Domain => &self.domain,
        }
    }

    fn bucket_mut(&mut self, site: Site) -> &mut Vec<String> {
        match site {
            Site::Realestate => &mut self.realestate,
            Site::Domain => &mut self.domain,
        }
    }

    fn all_full(&self, cap: usize) -> bool {
        Site::ALL
            .iter()
            .all(|site| self.for_site(*site).len() >= cap)
    }
}

/// Construction parameters for [`SearchClient`]. Endpoints are injectable
/// so tests can point them at a local stub server.
#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub structured_endpoint: String,
    pub mirror_endpoints: Vec<String>,
    /// Provider region/locale code (`kl` parameter).
    pub region: String,
    /// Default cap on URLs per site when the caller passes no override.
    pub max_results_per_site: usize,
    /// Orchestrator-level retries of one structured query before fallback.
    pub max_retries: u32,
    /// Base of the orchestrator's backoff schedule, seconds.
    pub backoff_base: f64,
    /// Pacing delay between the two site-scoped queries of one variant.
    /// Independent of the fetch client's host gap: the provider has its
    /// own budget.
    pub pacing_delay_ms: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            structured_endpoint: DEFAULT_STRUCTURED_ENDPOINT.to_owned(),
            mirror_endpoints: DEFAULT_MIRROR_ENDPOINTS
                .iter()
                .map(|&m| m.to_owned())
                .collect(),
            region: "au-en".to_owned(),
            max_results_per_site: 2,
            max_retries: 3,
            backoff_base: 1.8,
            pacing_delay_ms: 1000,
        }
    }
}

/// Outcome of one site-scoped query after the structured/fallback chain.
struct QueryOutcome {
    links: Vec<String>,
    throttled: bool,
}

/// Search orchestrator: turns a free-text address into deduplicated
/// candidate listing URLs per supported site.
#[derive(Debug, Clone)]
pub struct SearchClient {
    fetch: FetchClient,
    settings: SearchSettings,
}

impl SearchClient {
    #[must_use]
    pub fn new(fetch: FetchClient, settings: SearchSettings) -> Self {
        Self { fetch, settings }
    }

    /// Builds a provider-default client from the application configuration.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the underlying fetch client cannot be
    /// constructed.
    pub fn from_config(config: &propfeed_core::AppConfig) -> Result<Self, FetchError> {
        Ok(Self::new(
            FetchClient::from_config(config)?,
            SearchSettings {
                region: config.search_region.clone(),
                max_results_per_site: config.max_results_per_site,
                max_retries: config.search_max_retries,
                backoff_base: config.backoff_base,
                pacing_delay_ms: config.search_pacing_delay_ms,
                ..SearchSettings::default()
            },
        ))
    }

    /// Searches the provider for listing URLs matching `address`.
    ///
    /// Variants are tried in generation order, sequentially; within one
    /// variant the two site-scoped queries run in fixed order with a
    /// pacing delay between them. The search stops early once every site
    /// has reached its cap.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::ProviderRateLimited`] only when the provider
    /// throttled structured attempts and the whole search yielded zero
    /// URLs; a partially degraded search still returns `Ok`.
    pub async fn search_address(
        &self,
        address: &str,
        max_results: Option<usize>,
    ) -> Result<SearchResults, SearchError> {
        let cap = max_results.unwrap_or(self.settings.max_results_per_site);
        let mut results = SearchResults::default();
        let mut throttled = false;

        for variant in query_variants(address) {
            let mut queried_this_variant = false;
            for site in Site::ALL {
                if results.for_site(site).len() >= cap {
                    continue;
                }
                if queried_this_variant {
                    tokio::time::sleep(Duration::from_millis(self.settings.pacing_delay_ms))
                        .await;
                }
                queried_this_variant = true;

                let query = format!("\"{variant}\" site:{}", site.domain());
                let outcome = self.site_query(&query).await;
                throttled |= outcome.throttled;

                let bucket = results.bucket_mut(site);
                for link in outcome.links {
                    if bucket.len() >= cap {
                        break;
                    }
                    let Some(normalized) = normalize_result_link(&link) else {
                        continue;
                    };
                    if !site.matches_url(&normalized) {
                        continue;
                    }
                    if bucket.iter().any(|seen| seen == &normalized) {
                        continue;
                    }
                    bucket.push(normalized);
                }
            }
            if results.all_full(cap) {
                break;
            }
        }

        if throttled && results.realestate.is_empty() && results.domain.is_empty() {
            return Err(SearchError::ProviderRateLimited);
        }
        Ok(results)
    }

    /// One site-scoped query: structured call with orchestrator-level
    /// backoff on throttling, then the HTML-mirror fallback. Failure is
    /// absorbed into an empty link list.
    async fn site_query(&self, query: &str) -> QueryOutcome {
        let mut throttled = false;
        let mut attempt = 0u32;

        loop {
            match self.structured_query(query).await {
                Ok(links) => return QueryOutcome { links, throttled },
                Err(FetchError::Throttled {
                    host,
                    retry_after_secs,
                }) => {
                    throttled = true;
                    if attempt >= self.settings.max_retries {
                        tracing::debug!(
                            query,
                            "structured search rate-limited after retries, falling back to HTML mirrors"
                        );
                        break;
                    }
                    let delay = retry_after_secs.map_or_else(
                        || backoff_schedule(self.settings.backoff_base, attempt),
                        Duration::from_secs,
                    );
                    tracing::warn!(
                        query,
                        attempt,
                        host = %host,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "search provider throttled, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    tracing::debug!(
                        query,
                        error = %err,
                        "structured search failed, falling back to HTML mirrors"
                    );
                    break;
                }
            }
        }

        QueryOutcome {
            links: self.mirror_query(query).await,
            throttled,
        }
    }

    /// Single structured call. The fetch retry budget is zeroed so the
    /// orchestrator observes throttling directly and owns the retry
    /// policy.
    async fn structured_query(&self, query: &str) -> Result<Vec<String>, FetchError> {
        let url = build_query_url(&self.settings.structured_endpoint, query, &self.settings.region);
        let options = FetchOptions {
            referer: None,
            max_retries: Some(0),
        };
        let body = self.fetch.get_text_with(&url, &options).await?;
        Ok(parse_structured_links(&body))
    }

    /// Tries the mirror endpoints in priority order, returning the first
    /// endpoint's links that yield at least one; all failures are absorbed
    /// into an empty result.
    async fn mirror_query(&self, query: &str) -> Vec<String> {
        for mirror in &self.settings.mirror_endpoints {
            let url = build_query_url(mirror, query, &self.settings.region);
            let options = FetchOptions {
                referer: Some(mirror.clone()),
                max_retries: None,
            };
            match self.fetch.get_text_with(&url, &options).await {
                Ok(html) => {
                    let found = links::extract_result_links(&html);
                    if found.is_empty() {
                        tracing::debug!(mirror = %mirror, "mirror returned no result links, trying next");
                    } else {
                        tracing::debug!(mirror = %mirror, count = found.len(), "mirror returned results");
                        return found;
                    }
                }
                Err(err) => {
                    tracing::debug!(mirror = %mirror, error = %err, "mirror fetch failed, trying next");
                }
            }
        }
        Vec::new()
    }
}

fn build_query_url(endpoint: &str, query: &str, region: &str) -> String {
    let q = utf8_percent_encode(query, NON_ALPHANUMERIC);
    let kl = utf8_percent_encode(region, NON_ALPHANUMERIC);
    format!("{endpoint}?q={q}&kl={kl}")
}

/// The structured endpoint returns a JS payload embedding result objects;
/// each result's `"u"` field carries the (backslash-escaped) destination
/// URL.
fn parse_structured_links(body: &str) -> Vec<String> {
    let url_re = Regex::new(r#""u"\s*:\s*"([^"]+)""#).expect("valid regex");
    url_re
        .captures_iter(body)
        .filter_map(|cap| cap.get(1))
        .map(|m| m.as_str().replace("\\/", "/"))
        .collect()
}
