//! Image byte retrieval for the embedding collaborator.
//!
//! The embedding subsystem only needs raw bytes per image URL; it handles
//! decoding and inference itself. Failures are absorbed per image so one
//! dead URL never aborts a batch.

use futures::future::join_all;

use crate::client::FetchClient;

/// Fetches one image, yielding `None` on any failure.
pub async fn fetch_image_bytes(client: &FetchClient, url: &str) -> Option<Vec<u8>> {
    match client.get_bytes(url).await {
        Ok(bytes) => Some(bytes),
        Err(err) => {
            tracing::debug!(url = %url, error = %err, "image fetch failed");
            None
        }
    }
}

/// Fetches a batch of images concurrently through the shared host gate.
/// The output has one entry per input URL in input order; a failed image
/// yields `None` in its slot.
pub async fn fetch_images(client: &FetchClient, urls: &[String]) -> Vec<Option<Vec<u8>>> {
    join_all(urls.iter().map(|url| fetch_image_bytes(client, url))).await
}
