//! JSON-LD structured-data extraction from listing page HTML.
//!
//! Listing pages embed machine-readable data in
//! `<script type="application/ld+json">` blocks, with wildly inconsistent
//! quality: trailing commas, arrays of unrelated entities, alternate key
//! names per site. This module is a pure function of the HTML text: parse
//! every block (repairing what it can), pick the most relevant one by
//! declared `@type`, and resolve a normalized field set through ordered
//! fallback keys. One malformed block never aborts extraction of the
//! others, and any single unresolvable field yields absence for that field
//! only.

use regex::Regex;
use serde_json::Value;

/// JSON-LD `@type` tags treated as authoritative listing blocks.
const RECOGNIZED_LISTING_TYPES: &[&str] = &[
    "RealEstateListing",
    "Residence",
    "Apartment",
    "House",
    "SingleFamilyResidence",
];

// Alternate key names observed across listing sites, in fallback order.
const BEDROOM_KEYS: &[&str] = &["numberOfBedrooms", "bedrooms", "bed"];
const BATHROOM_KEYS: &[&str] = &[
    "numberOfBathroomsTotal",
    "numberOfBathrooms",
    "bathrooms",
    "bath",
];
const PARKING_KEYS: &[&str] = &["numberOfParkingSpaces", "parking", "carSpaces", "carports"];
const ADDRESS_PART_KEYS: &[&str] = &[
    "streetAddress",
    "addressLocality",
    "addressRegion",
    "postalCode",
    "addressCountry",
];

/// Ceiling on collected image URLs per listing.
const MAX_IMAGES: usize = 20;

/// Fields resolved from the selected JSON-LD block. Absence is a valid
/// terminal state for every field; `raw` retains the selected block (or an
/// empty object when the page had no usable block).
#[derive(Debug, Clone)]
pub struct ExtractedFields {
    pub title: Option<String>,
    pub address: Option<String>,
    pub price: Option<String>,
    pub bedrooms: Option<f64>,
    pub bathrooms: Option<f64>,
    pub parking: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub description: Option<String>,
    pub images: Vec<String>,
    pub raw: Value,
}

impl Default for ExtractedFields {
    fn default() -> Self {
        Self {
            title: None,
            address: None,
            price: None,
            bedrooms: None,
            bathrooms: None,
            parking: None,
            latitude: None,
            longitude: None,
            description: None,
            images: Vec::new(),
            raw: Value::Object(serde_json::Map::new()),
        }
    }
}

/// Extracts normalized listing fields from a page's JSON-LD blocks.
///
/// Pure and synchronous: no I/O, no retries, no shared state.
#[must_use]
pub fn extract_listing_data(html: &str) -> ExtractedFields {
    let blocks = parse_jsonld_blocks(html);
    match select_block(&blocks) {
        Some(block) => resolve_fields(block),
        None => ExtractedFields::default(),
    }
}

/// Parses every `ld+json` script body into candidate objects: a top-level
/// object is one candidate, a top-level array contributes each object
/// element. Unparseable blocks are discarded silently.
fn parse_jsonld_blocks(html: &str) -> Vec<Value> {
    let script_re = Regex::new(
        r#"(?is)<script[^>]+type\s*=\s*["'][^"']*ld\+json[^"']*["'][^>]*>(.*?)</script>"#,
    )
    .expect("valid regex");

    let mut blocks = Vec::new();
    for cap in script_re.captures_iter(html) {
        let Some(body) = cap.get(1) else { continue };
        let Some(value) = parse_block(body.as_str()) else {
            continue;
        };
        match value {
            Value::Array(items) => blocks.extend(items.into_iter().filter(Value::is_object)),
            value @ Value::Object(_) => blocks.push(value),
            _ => {}
        }
    }
    blocks
}

/// Strict parse first; on failure one repair pass stripping trailing commas
/// before a closing brace/bracket, then give up.
fn parse_block(raw: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str(raw) {
        return Some(value);
    }
    let trailing_comma_re = Regex::new(r",\s*([}\]])").expect("valid regex");
    let repaired = trailing_comma_re.replace_all(raw, "$1");
    serde_json::from_str(&repaired).ok()
}

/// First block whose declared `@type` matches a recognized listing type;
/// falls back to the first block of any type. Heuristic by design: pages
/// carrying several unrelated blocks may yield the wrong one.
fn select_block(blocks: &[Value]) -> Option<&Value> {
    blocks
        .iter()
        .find(|block| block_type_matches(block))
        .or_else(|| blocks.first())
}

/// `@type` may be a plain string or an array of strings.
fn block_type_matches(block: &Value) -> bool {
    match block.get("@type") {
        Some(Value::String(tag)) => RECOGNIZED_LISTING_TYPES
            .iter()
            .any(|t| tag.eq_ignore_ascii_case(t)),
        Some(Value::Array(tags)) => tags
            .iter()
            .filter_map(Value::as_str)
            .any(|tag| RECOGNIZED_LISTING_TYPES.iter().any(|t| tag.eq_ignore_ascii_case(t))),
        _ => false,
    }
}

fn resolve_fields(block: &Value) -> ExtractedFields {
    let address = block
        .get("address")
        .and_then(Value::as_object)
        .map(|addr| {
            ADDRESS_PART_KEYS
                .iter()
                .filter_map(|key| addr.get(*key).and_then(value_to_string))
                .collect::<Vec<_>>()
                .join(", ")
        })
        .filter(|joined| !joined.is_empty());

    let geo = block.get("geo");
    let latitude = geo.and_then(|g| g.get("latitude")).and_then(value_to_f64);
    let longitude = geo.and_then(|g| g.get("longitude")).and_then(value_to_f64);

    let title = block
        .get("name")
        .and_then(value_to_string)
        .or_else(|| block.get("headline").and_then(value_to_string));
    let description = block.get("description").and_then(value_to_string);

    // Price commonly lives inside an offer object; currency code and offer
    // name are last-resort stand-ins on pages that hide the amount.
    let offers = block.get("offers");
    let price = offers
        .and_then(|o| o.get("price"))
        .and_then(value_to_string)
        .or_else(|| offers.and_then(|o| o.get("priceCurrency")).and_then(value_to_string))
        .or_else(|| offers.and_then(|o| o.get("name")).and_then(value_to_string));

    ExtractedFields {
        title,
        address,
        price,
        bedrooms: first_numeric(block, BEDROOM_KEYS),
        bathrooms: first_numeric(block, BATHROOM_KEYS),
        parking: first_numeric(block, PARKING_KEYS),
        latitude,
        longitude,
        description,
        images: collect_images(block),
        raw: block.clone(),
    }
}

/// The first *present* key wins, even when its value turns out to be
/// non-numeric; that field then resolves to absent.
fn first_numeric(block: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .find_map(|key| block.get(*key))
        .and_then(value_to_f64)
}

/// Accepts both a singular `image` string-or-list and a plural `images`
/// key; deduplicates preserving first-seen order and caps the result.
fn collect_images(block: &Value) -> Vec<String> {
    let mut images = Vec::new();
    for key in ["image", "images"] {
        match block.get(key) {
            Some(Value::String(url)) => images.push(url.clone()),
            Some(Value::Array(items)) => {
                images.extend(items.iter().filter_map(Value::as_str).map(str::to_owned));
            }
            _ => {}
        }
    }
    let mut seen = std::collections::HashSet::new();
    images.retain(|url| seen.insert(url.clone()));
    images.truncate(MAX_IMAGES);
    images
}

/// Numbers or numeric strings; anything else is absent.
pub(crate) fn value_to_f64(value: &Value) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}

/// Strings pass through; numbers are rendered. Structured values are not
/// flattened.
pub(crate) fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
