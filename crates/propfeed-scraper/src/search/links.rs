//! Search-result link handling: anchor extraction and redirector
//! unwrapping.

use regex::Regex;

/// Anchor patterns for the provider's HTML result pages, tried in order;
/// the first pattern that matches anything wins. Covers the html mirror's
/// result list, the lite mirror's table rows, and a generic nofollow
/// anchor as a last resort.
const RESULT_ANCHOR_PATTERNS: &[&str] = &[
    r#"(?is)<a[^>]*class="[^"]*result__a[^"]*"[^>]*href="([^"]+)""#,
    r#"(?is)<a[^>]*class="[^"]*result-link[^"]*"[^>]*href="([^"]+)""#,
    r#"(?is)<a[^>]*rel="nofollow"[^>]*href="([^"]+)""#,
];

/// Pulls candidate hrefs out of a provider HTML results page. Entities in
/// query strings arrive `&amp;`-escaped and are unescaped here; redirector
/// unwrapping happens in [`normalize_result_link`].
pub(crate) fn extract_result_links(html: &str) -> Vec<String> {
    for pattern in RESULT_ANCHOR_PATTERNS {
        let anchor_re = Regex::new(pattern).expect("valid regex");
        let links: Vec<String> = anchor_re
            .captures_iter(html)
            .filter_map(|cap| cap.get(1))
            .map(|m| m.as_str().replace("&amp;", "&"))
            .collect();
        if !links.is_empty() {
            return links;
        }
    }
    Vec::new()
}

/// Decodes a provider result link to its real destination URL.
///
/// The provider wraps outbound links in a redirector
/// (`//duckduckgo.com/l/?uddg=<percent-encoded-url>&rut=…`); wrapped forms
/// are unwrapped, protocol-relative links get a scheme, and anything that
/// is not an absolute http(s) URL afterwards is rejected. Pure and
/// idempotent: a URL with no wrapping is returned unchanged, and decoding
/// twice equals decoding once.
#[must_use]
pub fn normalize_result_link(href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    let absolute = if let Some(rest) = href.strip_prefix("//") {
        format!("https://{rest}")
    } else if href.starts_with("/l/") {
        format!("https://duckduckgo.com{href}")
    } else {
        href.to_owned()
    };

    let url = reqwest::Url::parse(&absolute).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }

    let host = url.host_str().unwrap_or_default();
    if (host == "duckduckgo.com" || host.ends_with(".duckduckgo.com"))
        && url.path().starts_with("/l/")
    {
        // query_pairs percent-decodes the wrapped URL.
        return url
            .query_pairs()
            .find(|(key, _)| key == "uddg")
            .map(|(_, value)| value.into_owned());
    }

    Some(absolute)
}
