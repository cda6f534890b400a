//! Integration tests for `SearchClient`: structured search, mirror
//! fallback, link normalization, filtering, and capping.
//!
//! The structured endpoint and the mirrors are all pointed at one local
//! wiremock server under distinct paths; queries are told apart by their
//! `site:` restriction.

use wiremock::matchers::{method, path, query_param_contains};
use wiremock::{Mock, MockServer, ResponseTemplate};

use propfeed_scraper::{FetchClient, FetchSettings, SearchClient, SearchError, SearchSettings};

const ADDRESS: &str = "12 Main St, Springfield QLD 4000";

fn test_fetch_client() -> FetchClient {
    FetchClient::new(&FetchSettings {
        timeout_secs: 5,
        user_agent: "propfeed-test/0.1".to_owned(),
        max_retries: 0,
        backoff_base: 0.01,
        default_gap_ms: 0,
        proxy_url: None,
    })
    .expect("failed to build test FetchClient")
}

fn test_search_client(server_uri: &str, mirrors: &[&str]) -> SearchClient {
    SearchClient::new(
        test_fetch_client(),
        SearchSettings {
            structured_endpoint: format!("{server_uri}/d.js"),
            mirror_endpoints: mirrors
                .iter()
                .map(|m| format!("{server_uri}{m}"))
                .collect(),
            region: "au-en".to_owned(),
            max_results_per_site: 2,
            max_retries: 1,
            backoff_base: 0.01,
            pacing_delay_ms: 0,
        },
    )
}

/// Structured payload with `count` matching listing links for `site_host`,
/// one duplicate of the first link, and a few non-matching links.
fn structured_payload(site_host: &str, count: usize) -> String {
    let mut entries: Vec<String> = (0..count)
        .map(|i| format!(r#"{{"u":"https:\/\/www.{site_host}\/property-house-qld-spring-{i}00"}}"#))
        .collect();
    entries.push(format!(
        r#"{{"u":"https:\/\/www.{site_host}\/property-house-qld-spring-000"}}"#
    ));
    entries.push(r#"{"u":"https:\/\/en.wikipedia.org\/wiki\/Springfield"}"#.to_owned());
    entries.push(r#"{"u":"https:\/\/www.othersite.com\/listing\/1"}"#.to_owned());
    entries.push(r#"{"u":"https:\/\/blog.example.com\/springfield-houses"}"#.to_owned());
    format!("DDG.pageLayout.load('d',[{}]);", entries.join(","))
}

fn anchors_page(hrefs: &[&str]) -> String {
    let anchors: Vec<String> = hrefs
        .iter()
        .map(|h| format!(r#"<a rel="noopener" class="result__a" href="{h}">r</a>"#))
        .collect();
    format!("<html><body>{}</body></html>", anchors.join("\n"))
}

// ---------------------------------------------------------------------------
// Structured happy path
// ---------------------------------------------------------------------------

#[tokio::test]
async fn structured_search_filters_dedupes_and_caps_per_site() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/d.js"))
        .and(query_param_contains("q", "site:realestate.com.au"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(structured_payload("realestate.com.au", 5)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/d.js"))
        .and(query_param_contains("q", "site:domain.com.au"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(structured_payload("domain.com.au", 5)),
        )
        .mount(&server)
        .await;

    let client = test_search_client(&server.uri(), &["/m1"]);
    let results = client
        .search_address(ADDRESS, Some(2))
        .await
        .expect("expected Ok results");

    assert_eq!(results.realestate.len(), 2, "{results:?}");
    assert_eq!(results.domain.len(), 2, "{results:?}");
    for url in &results.realestate {
        assert!(url.contains("realestate.com.au"), "wrong site: {url}");
    }
    for url in &results.domain {
        assert!(url.contains("domain.com.au"), "wrong site: {url}");
    }
    // Dedup preserved first-seen order.
    assert_eq!(
        results.realestate[0],
        "https://www.realestate.com.au/property-house-qld-spring-000"
    );
    assert_eq!(
        results.realestate[1],
        "https://www.realestate.com.au/property-house-qld-spring-100"
    );
}

// ---------------------------------------------------------------------------
// Mirror fallback
// ---------------------------------------------------------------------------

#[tokio::test]
async fn throttled_structured_search_falls_back_to_second_mirror() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/d.js"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .mount(&server)
        .await;
    // First mirror reachable but empty.
    Mock::given(method("GET"))
        .and(path("/m1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(anchors_page(&[])))
        .mount(&server)
        .await;
    // Second mirror carries three wrapped links for domain.com.au.
    let wrapped: Vec<String> = (1..=3)
        .map(|i| {
            format!(
                "//duckduckgo.com/l/?uddg=https%3A%2F%2Fwww.domain.com.au%2Fproperty-apartment-qld-brisbane-201012345{i}&rut=x{i}"
            )
        })
        .collect();
    let wrapped_refs: Vec<&str> = wrapped.iter().map(String::as_str).collect();
    Mock::given(method("GET"))
        .and(path("/m2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(anchors_page(&wrapped_refs)))
        .mount(&server)
        .await;

    let client = test_search_client(&server.uri(), &["/m1", "/m2"]);
    let results = client
        .search_address(ADDRESS, Some(5))
        .await
        .expect("degraded search should still be Ok");

    assert_eq!(results.domain.len(), 3, "{results:?}");
    assert_eq!(
        results.domain[0],
        "https://www.domain.com.au/property-apartment-qld-brisbane-2010123451"
    );
    assert!(results.realestate.is_empty(), "{results:?}");
}

#[tokio::test]
async fn first_mirror_with_results_wins() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/d.js"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/m1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(anchors_page(&[
            "https://www.realestate.com.au/property-house-qld-spring-100",
            "https://www.domain.com.au/property-apartment-qld-brisbane-2010123456",
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/m2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(anchors_page(&[
            "https://www.realestate.com.au/property-house-qld-never-999",
        ])))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_search_client(&server.uri(), &["/m1", "/m2"]);
    let results = client
        .search_address(ADDRESS, Some(1))
        .await
        .expect("expected Ok results");

    assert_eq!(
        results.realestate,
        vec!["https://www.realestate.com.au/property-house-qld-spring-100".to_owned()]
    );
    assert_eq!(
        results.domain,
        vec!["https://www.domain.com.au/property-apartment-qld-brisbane-2010123456".to_owned()]
    );
}

// ---------------------------------------------------------------------------
// Rate-limit exhaustion
// ---------------------------------------------------------------------------

#[tokio::test]
async fn throttled_everywhere_with_empty_fallback_reports_provider_rate_limited() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/d.js"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/m1"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .mount(&server)
        .await;

    let client = test_search_client(&server.uri(), &["/m1"]);
    let result = client.search_address(ADDRESS, Some(2)).await;
    assert!(
        matches!(result, Err(SearchError::ProviderRateLimited)),
        "expected ProviderRateLimited, got: {result:?}"
    );
}

#[tokio::test]
async fn unreachable_provider_without_throttling_yields_empty_ok() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/d.js"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/m1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = test_search_client(&server.uri(), &["/m1"]);
    let results = client
        .search_address(ADDRESS, Some(2))
        .await
        .expect("plain upstream failure degrades to empty, not an error");
    assert!(results.realestate.is_empty());
    assert!(results.domain.is_empty());
}

// ---------------------------------------------------------------------------
// Structured retry budget
// ---------------------------------------------------------------------------

#[tokio::test]
async fn structured_search_retries_before_falling_back() {
    let server = MockServer::start().await;

    // Throttle the first structured attempt only; the orchestrator's own
    // backoff retry should then succeed without touching a mirror.
    Mock::given(method("GET"))
        .and(path("/d.js"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/d.js"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(structured_payload("realestate.com.au", 3)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/m1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(anchors_page(&[])))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_search_client(&server.uri(), &["/m1"]);
    let results = client
        .search_address("131 Smith St", Some(1))
        .await
        .expect("expected Ok results");
    assert_eq!(results.realestate.len(), 1, "{results:?}");
}
