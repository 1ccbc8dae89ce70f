//! Integration tests using mock HTTP server
//!
//! Tests the full end-to-end flow: client → pipeline → reqwest → mock API

use pagewise::decode::{DecoderFormat, JsonDecoder, Payload, ResponseDecoder};
use pagewise::pipeline::RetryPolicy;
use pagewise::{CachePolicy, Client, ClientConfig, Context, Error, Method, QueryMap};
use pretty_assertions::assert_eq;
use serde::Deserialize;
use serde_json::{json, Value};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use test_case::test_case;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

// ============================================================================
// Mock APIs
// ============================================================================

/// `/items?page=n` answers `{"page": n}` with `next`/`last` links
struct PagedApi {
    base: String,
    total: u32,
    slow_page: Option<u32>,
    relative: bool,
}

impl PagedApi {
    fn new(base: &str, total: u32) -> Self {
        Self {
            base: base.to_string(),
            total,
            slow_page: None,
            relative: false,
        }
    }

    fn link(&self, page: u32) -> String {
        if self.relative {
            format!("/items?page={}", page)
        } else {
            format!("{}/items?page={}", self.base, page)
        }
    }
}

impl Respond for PagedApi {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let page: u32 = request
            .url
            .query_pairs()
            .find(|(k, _)| k == "page")
            .and_then(|(_, v)| v.parse().ok())
            .unwrap_or(1);

        let mut links = Vec::new();
        if page < self.total {
            links.push(format!("<{}>; rel=\"next\"", self.link(page + 1)));
        }
        links.push(format!("<{}>; rel=\"last\"", self.link(self.total)));

        let mut template = ResponseTemplate::new(200)
            .set_body_json(json!({ "page": page }))
            .insert_header("Link", links.join(", ").as_str());
        if self.slow_page == Some(page) {
            template = template.set_delay(Duration::from_millis(150));
        }
        template
    }
}

/// Healthy for the first `healthy` calls, then 500
struct Flaky {
    healthy: usize,
    calls: Arc<AtomicUsize>,
}

impl Respond for Flaky {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.healthy {
            ResponseTemplate::new(200).set_body_json(json!({ "value": "ok" }))
        } else {
            ResponseTemplate::new(500)
        }
    }
}

#[derive(Debug, Deserialize)]
struct Page {
    page: u32,
}

async fn paged_server(total: u32) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .respond_with(PagedApi::new(&server.uri(), total))
        .mount(&server)
        .await;
    server
}

fn page_numbers(pages: &[Value]) -> Vec<u64> {
    pages.iter().filter_map(|p| p["page"].as_u64()).collect()
}

// ============================================================================
// Pagination
// ============================================================================

#[tokio::test]
async fn test_sequential_pagination_follows_links() {
    let server = paged_server(20).await;
    let client = Client::builder().base_url(server.uri()).build().unwrap();

    let request = client.prepare(Method::GET, "/items", QueryMap::new()).unwrap();
    let pages = client
        .collect_pages(request, Context::new(), Arc::new(JsonDecoder::new()))
        .await
        .unwrap();

    assert_eq!(page_numbers(&pages), (1..=20).collect::<Vec<u64>>());
}

#[tokio::test]
async fn test_concurrent_pagination_keeps_order() {
    let server = paged_server(20).await;
    let client = Client::builder()
        .base_url(server.uri())
        .concurrency(4)
        .build()
        .unwrap();

    let request = client.prepare(Method::GET, "/items", QueryMap::new()).unwrap();
    let pages: Vec<Page> = client
        .collect_pages_concurrent(request, Context::new(), Arc::new(JsonDecoder::<Page>::typed()))
        .await
        .unwrap();

    assert_eq!(pages.len(), 20);
    assert_eq!(pages.iter().map(|p| p.page).sum::<u32>(), 210);
    assert!(pages.windows(2).all(|w| w[0].page + 1 == w[1].page));
}

#[tokio::test]
async fn test_concurrent_pagination_slow_page_does_not_reorder() {
    let server = MockServer::start().await;
    let mut api = PagedApi::new(&server.uri(), 8);
    api.slow_page = Some(2);
    Mock::given(method("GET"))
        .and(path("/items"))
        .respond_with(api)
        .mount(&server)
        .await;

    let client = Client::builder()
        .base_url(server.uri())
        .concurrency(3)
        .build()
        .unwrap();
    let request = client.prepare(Method::GET, "/items", QueryMap::new()).unwrap();
    let pages = client
        .collect_pages_concurrent(request, Context::new(), Arc::new(JsonDecoder::new()))
        .await
        .unwrap();

    assert_eq!(page_numbers(&pages), (1..=8).collect::<Vec<u64>>());
}

#[tokio::test]
async fn test_concurrent_matches_sequential() {
    let server = paged_server(9).await;
    let client = Client::builder()
        .base_url(server.uri())
        .concurrency(2)
        .build()
        .unwrap();
    let request = client.prepare(Method::GET, "/items", QueryMap::new()).unwrap();
    let decoder: Arc<dyn ResponseDecoder<Value>> = Arc::new(JsonDecoder::new());

    let sequential = client
        .collect_pages(request.clone(), Context::new(), decoder.clone())
        .await
        .unwrap();
    let concurrent = client
        .collect_pages_concurrent(request, Context::new(), decoder)
        .await
        .unwrap();

    assert_eq!(sequential, concurrent);
}

#[test_case(1 ; "sequential")]
#[test_case(4 ; "four workers")]
#[tokio::test]
async fn test_relative_links_resolve_against_server(concurrency: usize) {
    let server = MockServer::start().await;
    let mut api = PagedApi::new(&server.uri(), 7);
    api.relative = true;
    Mock::given(method("GET"))
        .and(path("/items"))
        .respond_with(api)
        .mount(&server)
        .await;

    let client = Client::builder()
        .base_url(server.uri())
        .concurrency(concurrency)
        .build()
        .unwrap();
    let request = client.prepare(Method::GET, "/items", QueryMap::new()).unwrap();
    let decoder: Arc<dyn ResponseDecoder<Value>> = Arc::new(JsonDecoder::new());

    let sequential = client
        .collect_pages(request.clone(), Context::new(), decoder.clone())
        .await
        .unwrap();
    let concurrent = client
        .collect_pages_concurrent(request, Context::new(), decoder)
        .await
        .unwrap();

    assert_eq!(page_numbers(&sequential), (1..=7).collect::<Vec<u64>>());
    assert_eq!(sequential, concurrent);
}

#[test_case(3, 1 ; "page 3 one worker")]
#[test_case(3, 4 ; "page 3 four workers")]
#[test_case(9, 4 ; "last page only")]
#[tokio::test]
async fn test_run_starting_mid_collection(start: u32, concurrency: usize) {
    let server = paged_server(9).await;
    let client = Client::builder()
        .base_url(server.uri())
        .concurrency(concurrency)
        .build()
        .unwrap();
    let mut query = QueryMap::new();
    query.insert("page".to_string(), start.to_string());
    let request = client.prepare(Method::GET, "/items", query).unwrap();
    let decoder: Arc<dyn ResponseDecoder<Value>> = Arc::new(JsonDecoder::new());

    let sequential = client
        .collect_pages(request.clone(), Context::new(), decoder.clone())
        .await
        .unwrap();
    let concurrent = client
        .collect_pages_concurrent(request, Context::new(), decoder)
        .await
        .unwrap();

    let expected: Vec<u64> = (u64::from(start)..=9).collect();
    assert_eq!(page_numbers(&sequential), expected);
    assert_eq!(page_numbers(&concurrent), expected);
}

#[tokio::test]
async fn test_max_pages_limits_requests() {
    let server = paged_server(20).await;
    let client = Client::builder()
        .base_url(server.uri())
        .max_pages(5)
        .build()
        .unwrap();
    let request = client.prepare(Method::GET, "/items", QueryMap::new()).unwrap();

    let pages = client
        .collect_pages(request, Context::new(), Arc::new(JsonDecoder::new()))
        .await
        .unwrap();

    assert_eq!(page_numbers(&pages), vec![1, 2, 3, 4, 5]);
    assert_eq!(server.received_requests().await.unwrap().len(), 5);
}

#[tokio::test]
async fn test_pagination_aborts_on_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let client = Client::builder().base_url(server.uri()).build().unwrap();
    let request = client.prepare(Method::GET, "/items", QueryMap::new()).unwrap();
    let result = client
        .collect_pages_concurrent(request, Context::new(), Arc::new(JsonDecoder::new()))
        .await;

    let error = result.unwrap_err();
    assert!(matches!(error, Error::HttpStatus { .. }));
    assert_eq!(error.status(), Some(502));
}

// ============================================================================
// Pipeline over the network
// ============================================================================

#[tokio::test]
async fn test_auth_and_session_headers_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .and(header("Authorization", "Token secret"))
        .and(header("X-Team", "core"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"login": "octocat"})))
        .mount(&server)
        .await;

    let client = Client::builder()
        .base_url(server.uri())
        .auth(pagewise::AuthConfig::Token {
            token: "secret".to_string(),
        })
        .header("X-Team", "core")
        .build()
        .unwrap();

    let request = client.prepare(Method::GET, "/me", QueryMap::new()).unwrap();
    let login: Value = client
        .fetch(request, Context::new(), &JsonDecoder::with_path("login"))
        .await
        .unwrap();
    assert_eq!(login, json!("octocat"));
}

#[tokio::test]
async fn test_retry_recovers_from_transient_failure() {
    let server = MockServer::start().await;
    let calls = Arc::new(AtomicUsize::new(0));
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(Flaky {
            healthy: 0,
            calls: calls.clone(),
        })
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    let client = Client::builder()
        .base_url(server.uri())
        .retry(RetryPolicy::new(3).backoff(
            pagewise::BackoffType::Constant,
            Duration::from_millis(10),
            Duration::from_millis(10),
        ))
        .build()
        .unwrap();

    let response = client.get("/status").await.unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_cache_serves_stored_value_when_server_fails() {
    let server = MockServer::start().await;
    let calls = Arc::new(AtomicUsize::new(0));
    Mock::given(method("GET"))
        .and(path("/quote"))
        .respond_with(Flaky {
            healthy: 1,
            calls: calls.clone(),
        })
        .mount(&server)
        .await;

    let client = Client::builder()
        .base_url(server.uri())
        .cache(CachePolicy::new().cache_all_gets().fresh_ttl(None))
        .memory_cache()
        .build()
        .unwrap();

    let first = client.get("/quote").await.unwrap();
    let second = client.get("/quote").await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(second.status, 200);
    assert_eq!(first.body, second.body);
}

#[tokio::test]
async fn test_fresh_cache_skips_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/quote"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": 1})))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::builder()
        .base_url(server.uri())
        .cache(CachePolicy::new().cache_all_gets())
        .memory_cache()
        .build()
        .unwrap();

    for _ in 0..3 {
        let response = client.get("/quote").await.unwrap();
        assert_eq!(response.json::<Value>().unwrap(), json!({"value": 1}));
    }
}

// ============================================================================
// Configuration
// ============================================================================

#[tokio::test]
async fn test_client_from_yaml_file() {
    let server = paged_server(6).await;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
base_url: "{}"
headers:
  Accept: application/json
pagination:
  concurrency: 3
  max_pages: 4
"#,
        server.uri()
    )
    .unwrap();

    let config = ClientConfig::from_file(file.path()).unwrap();
    let client = Client::from_config(&config).unwrap();
    assert_eq!(client.pagination().concurrency, 3);

    let request = client.prepare(Method::GET, "/items", QueryMap::new()).unwrap();
    let pages = client
        .collect_pages_concurrent(request, Context::new(), DecoderFormat::Auto.decoder())
        .await
        .unwrap();

    let numbers: Vec<u64> = pages
        .iter()
        .filter_map(Payload::as_json)
        .filter_map(|p| p["page"].as_u64())
        .collect();
    assert_eq!(numbers, vec![1, 2, 3, 4]);
}
