//! Resilient retrieval and extraction layer for the listing aggregator.
//!
//! Three pieces, composed top-down: [`SearchClient`] turns a free-text
//! address into candidate listing URLs per upstream site (structured
//! provider query with HTML-mirror fallback); [`FetchClient`] issues every
//! outbound request with per-host pacing and retry/backoff;
//! [`extract_listing_data`] is a pure function turning listing-page HTML
//! into a normalized field set via JSON-LD blocks. The aggregator is
//! stateless apart from ephemeral per-host pacing bookkeeping.

pub mod client;
pub mod error;
pub mod extract;
pub mod images;
pub mod listings;
mod rate_limit;
pub mod search;
pub mod sites;

pub use client::{FetchClient, FetchOptions, FetchSettings};
pub use error::{FetchError, ScrapeError};
pub use extract::{extract_listing_data, ExtractedFields};
pub use images::{fetch_image_bytes, fetch_images};
pub use listings::{fetch_and_extract, fetch_listings};
pub use search::{
    normalize_result_link, query_variants, SearchClient, SearchError, SearchResults,
    SearchSettings,
};
pub use sites::{build_listing, Site};
