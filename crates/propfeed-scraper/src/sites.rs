//! Supported upstream listing sites.

use chrono::Utc;
use propfeed_core::Listing;
use regex::Regex;

use crate::extract::{extract_listing_data, value_to_string};

/// The fixed set of listing sites candidate URLs are gathered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Site {
    Realestate,
    Domain,
}

impl Site {
    /// Fixed query order: realestate.com.au first, then domain.com.au.
    pub const ALL: [Site; 2] = [Site::Realestate, Site::Domain];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Site::Realestate => "realestate",
            Site::Domain => "domain",
        }
    }

    /// Host domain used in `site:` scoped search queries.
    #[must_use]
    pub fn domain(self) -> &'static str {
        match self {
            Site::Realestate => "realestate.com.au",
            Site::Domain => "domain.com.au",
        }
    }

    fn url_pattern(self) -> &'static str {
        match self {
            Site::Realestate => r"(?i)^https?://(www\.)?realestate\.com\.au/\S+",
            Site::Domain => r"(?i)^https?://(www\.)?domain\.com\.au/\S+",
        }
    }

    /// Whether `url` points at this site.
    #[must_use]
    pub fn matches_url(self, url: &str) -> bool {
        Regex::new(self.url_pattern())
            .expect("valid regex")
            .is_match(url)
    }

    /// Which supported site, if any, `url` belongs to.
    #[must_use]
    pub fn for_url(url: &str) -> Option<Site> {
        Site::ALL.into_iter().find(|site| site.matches_url(url))
    }

    /// Listing identifier from the `/property-…-<id>` URL path pattern,
    /// e.g. `/property-apartment-qld-brisbane-146786996` → `146786996`.
    #[must_use]
    pub fn listing_id(self, url: &str) -> Option<String> {
        let id_re = Regex::new(r"(?i)/property-[^/?#]+-([a-z0-9]+)(?:[/?#]|$)")
            .expect("valid regex");
        id_re
            .captures(url)
            .and_then(|cap| cap.get(1))
            .map(|m| m.as_str().to_lowercase())
    }
}

/// Builds a [`Listing`] from a fetched page.
///
/// Field resolution is the generic JSON-LD extraction; the price is
/// refined from the raw offer object when one survived, since some pages
/// bury the display price there while the fallback chain landed on a
/// currency code.
#[must_use]
pub fn build_listing(site: Site, url: &str, html: &str) -> Listing {
    let fields = extract_listing_data(html);

    let price = fields
        .raw
        .get("offers")
        .and_then(|offers| offers.get("price"))
        .and_then(value_to_string)
        .or(fields.price);

    Listing {
        source: site.name().to_owned(),
        url: url.to_owned(),
        listing_id: site.listing_id(url),
        title: fields.title,
        address: fields.address,
        price,
        bedrooms: fields.bedrooms,
        bathrooms: fields.bathrooms,
        parking: fields.parking,
        latitude: fields.latitude,
        longitude: fields.longitude,
        description: fields.description,
        images: fields.images,
        raw: fields.raw,
        scraped_at: Utc::now(),
    }
}
