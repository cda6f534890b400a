pub mod app_config;
mod config;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A normalized listing record produced by the extraction layer.
///
/// Listing pages encode their structured data inconsistently, so every
/// descriptive field is optional: absence is a valid terminal state, not
/// an error. A `Listing` is created once per successful extraction and
/// never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    /// Site the listing came from: `"realestate"` or `"domain"`.
    pub source: String,
    pub url: String,
    /// Identifier parsed from the `/property-…-<id>` URL path pattern.
    pub listing_id: Option<String>,
    pub title: Option<String>,
    pub address: Option<String>,
    pub price: Option<String>,
    pub bedrooms: Option<f64>,
    pub bathrooms: Option<f64>,
    pub parking: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub description: Option<String>,
    /// Ordered, deduplicated, capped at the extractor's image ceiling.
    #[serde(default)]
    pub images: Vec<String>,
    /// The JSON-LD block the fields were resolved from, as parsed.
    #[serde(default)]
    pub raw: serde_json::Value,
    pub scraped_at: DateTime<Utc>,
}

/// Configuration failures: every variable has a default, so the only
/// failure mode is a present-but-unparseable value.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
