//! Listing-page retrieval and extraction.

use futures::future::join_all;
use propfeed_core::Listing;

use crate::client::FetchClient;
use crate::error::ScrapeError;
use crate::sites::{build_listing, Site};

/// Fetches one listing page and extracts its normalized record.
///
/// # Errors
///
/// - [`ScrapeError::UnsupportedSite`] — the URL belongs to no supported
///   listing site.
/// - [`ScrapeError::Fetch`] — the page could not be retrieved within the
///   retry budget.
pub async fn fetch_and_extract(client: &FetchClient, url: &str) -> Result<Listing, ScrapeError> {
    let site = Site::for_url(url).ok_or_else(|| ScrapeError::UnsupportedSite {
        url: url.to_owned(),
    })?;
    let html = client.get_text(url).await?;
    Ok(build_listing(site, url, &html))
}

/// Fetches many listing pages concurrently through the shared host gate.
///
/// Per-item failure is absorbed: a page that cannot be fetched, or that
/// belongs to no supported site, is dropped from the output without
/// aborting its siblings.
pub async fn fetch_listings(client: &FetchClient, urls: &[String]) -> Vec<Listing> {
    let fetched = join_all(urls.iter().map(|url| async move {
        match fetch_and_extract(client, url).await {
            Ok(listing) => Some(listing),
            Err(err) => {
                tracing::debug!(url = %url, error = %err, "skipping listing page");
                None
            }
        }
    }))
    .await;
    fetched.into_iter().flatten().collect()
}
