//! Integration tests for the request pipeline against a mock HTTP server.

use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use agora_core::{AuthMode, SiteOverride};
use agora_fetch::{FetchError, HttpClient, Payload, RetryPolicy, SiteState};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

fn anon_client(base: &str, timeout: Duration) -> HttpClient {
    HttpClient::new(base, timeout, AuthMode::None, None).expect("client")
}

/// Responds based on how many requests have been seen so far.
struct SequencedResponder {
    hits: AtomicUsize,
    make: fn(usize) -> ResponseTemplate,
}

impl SequencedResponder {
    fn new(make: fn(usize) -> ResponseTemplate) -> Self {
        Self { hits: AtomicUsize::new(0), make }
    }
}

impl Respond for SequencedResponder {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        (self.make)(self.hits.fetch_add(1, Ordering::SeqCst))
    }
}

#[tokio::test]
async fn select_site_then_get_returns_decoded_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"topics": []})))
        .expect(1)
        .mount(&server)
        .await;

    let state = SiteState::new(Duration::from_secs(5), AuthMode::None, Vec::new());
    let (origin, client) = state.select_site(&format!("{}/", server.uri())).unwrap();
    assert_eq!(origin, server.uri());

    let payload = client.get("/search.json?q=foo", None).await.expect("payload");
    assert_eq!(payload, Payload::Json(json!({"topics": []})));
}

#[tokio::test]
async fn non_json_content_type_returns_text() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("plain body"))
        .mount(&server)
        .await;

    let client = anon_client(&server.uri(), Duration::from_secs(5));
    let payload = client.get("/raw", None).await.expect("payload");
    assert_eq!(payload, Payload::Text("plain body".to_string()));
}

#[tokio::test]
async fn retries_503_twice_with_doubling_delays() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(SequencedResponder::new(|n| {
            if n < 2 {
                ResponseTemplate::new(503)
            } else {
                ResponseTemplate::new(200).set_body_json(json!({"ok": true}))
            }
        }))
        .expect(3)
        .mount(&server)
        .await;

    let client = anon_client(&server.uri(), Duration::from_secs(5));
    let started = Instant::now();
    let payload = client.get("/flaky.json", None).await.expect("payload");
    let elapsed = started.elapsed();

    assert_eq!(payload, Payload::Json(json!({"ok": true})));
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
    // Backoff schedule is 250ms then 500ms.
    assert!(elapsed >= Duration::from_millis(700), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_secs(5), "elapsed {elapsed:?}");
}

#[tokio::test]
async fn retry_policy_override_rescales_backoff() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(SequencedResponder::new(|n| {
            if n < 2 {
                ResponseTemplate::new(503)
            } else {
                ResponseTemplate::new(200).set_body_json(json!({"ok": true}))
            }
        }))
        .expect(3)
        .mount(&server)
        .await;

    let client = anon_client(&server.uri(), Duration::from_secs(5))
        .with_retry_policy(RetryPolicy::new(3).with_base_delay(Duration::from_millis(50)));
    let started = Instant::now();
    client.get("/flaky.json", None).await.expect("payload");
    let elapsed = started.elapsed();

    assert_eq!(server.received_requests().await.unwrap().len(), 3);
    // Delays are 50ms then 100ms.
    assert!(elapsed >= Duration::from_millis(150), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_millis(700), "elapsed {elapsed:?}");
}

#[tokio::test]
async fn no_retry_policy_surfaces_first_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let client = anon_client(&server.uri(), Duration::from_secs(5))
        .with_retry_policy(RetryPolicy::no_retry());
    match client.get("/flaky.json", None).await {
        Err(FetchError::Upstream { status, .. }) => assert_eq!(status, 503),
        other => panic!("expected upstream error, got {other:?}"),
    }
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn does_not_retry_404_and_carries_decoded_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"errors": ["not found"]})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = anon_client(&server.uri(), Duration::from_secs(5));
    match client.get("/missing.json", None).await {
        Err(FetchError::Upstream { status, message, body }) => {
            assert_eq!(status, 404);
            assert!(message.contains("404"), "got: {message}");
            assert_eq!(body, json!({"errors": ["not found"]}));
        }
        other => panic!("expected upstream error, got {other:?}"),
    }
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn retries_429_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(SequencedResponder::new(|n| {
            if n == 0 {
                ResponseTemplate::new(429)
            } else {
                ResponseTemplate::new(200).set_body_json(json!({"ok": true}))
            }
        }))
        .expect(2)
        .mount(&server)
        .await;

    let client = anon_client(&server.uri(), Duration::from_secs(5));
    client.get("/limited.json", None).await.expect("payload");
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn upstream_error_body_falls_back_to_raw_text() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(400).set_body_string("<html>bad</html>"))
        .mount(&server)
        .await;

    let client = anon_client(&server.uri(), Duration::from_secs(5));
    match client.get("/bad", None).await {
        Err(FetchError::Upstream { body, .. }) => {
            assert_eq!(body, json!("<html>bad</html>"));
        }
        other => panic!("expected upstream error, got {other:?}"),
    }
}

#[tokio::test]
async fn cookies_accumulate_and_same_name_overwrites() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(SequencedResponder::new(|n| match n {
            0 => ResponseTemplate::new(200)
                .append_header("set-cookie", "x=1; Path=/")
                .append_header("set-cookie", "session=abc; HttpOnly"),
            1 => ResponseTemplate::new(200).insert_header("set-cookie", "x=2; Path=/"),
            _ => ResponseTemplate::new(200),
        }))
        .mount(&server)
        .await;

    let client = anon_client(&server.uri(), Duration::from_secs(5));
    client.get("/a", None).await.expect("first");
    client.get("/b", None).await.expect("second");
    client.get("/c", None).await.expect("third");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);

    // First request carries no session state yet.
    assert!(requests[0].headers.get("cookie").is_none());
    assert!(requests[0].headers.get("referer").is_none());

    // Second request replays the first response's cookies and a Referer.
    let second_cookie = requests[1].headers.get("cookie").unwrap().to_str().unwrap();
    assert!(second_cookie.contains("x=1"));
    assert!(second_cookie.contains("session=abc"));
    assert!(requests[1].headers.get("referer").is_some());

    // Third request sees the overwritten value only.
    let third_cookie = requests[2].headers.get("cookie").unwrap().to_str().unwrap();
    assert!(third_cookie.contains("x=2"));
    assert!(!third_cookie.contains("x=1"));
}

#[tokio::test]
async fn get_cached_performs_one_network_call_within_ttl() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/site.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "forum"})))
        .mount(&server)
        .await;

    let client = anon_client(&server.uri(), Duration::from_secs(5));
    let ttl = Duration::from_millis(200);

    let first = client.get_cached("/site.json", ttl, None).await.expect("first");
    let second = client.get_cached("/site.json", ttl, None).await.expect("second");
    assert_eq!(first, second);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);

    tokio::time::sleep(Duration::from_millis(250)).await;
    client.get_cached("/site.json", ttl, None).await.expect("third");
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn deadline_elapsed_is_classified_as_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let client = anon_client(&server.uri(), Duration::from_millis(100));
    match client.get("/slow", None).await {
        Err(FetchError::Timeout(bound)) => assert_eq!(bound, client.timeout()),
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn refused_connection_is_classified_as_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener); // release the port so requests fail with ECONNREFUSED

    let client = anon_client(&format!("http://{addr}"), Duration::from_secs(5));
    match client.get("/unreachable", None).await {
        Err(FetchError::Network(message)) => {
            assert!(message.contains("Possible causes"), "got: {message}");
        }
        other => panic!("expected network error, got {other:?}"),
    }
}

#[tokio::test]
async fn cancelled_token_aborts_the_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let client = anon_client(&server.uri(), Duration::from_secs(5));
    let token = CancellationToken::new();
    token.cancel();

    match client.get("/slow", Some(&token)).await {
        Err(FetchError::Cancelled) => {}
        other => panic!("expected cancellation, got {other:?}"),
    }
}

#[tokio::test]
async fn resolved_override_auth_is_sent_as_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("user-api-key", "user-secret"))
        .and(header("user-api-client-id", "agora-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let overrides = vec![SiteOverride {
        site: server.uri(),
        user_api_key: Some("user-secret".to_string()),
        user_api_client_id: Some("agora-1".to_string()),
        ..Default::default()
    }];
    let state = SiteState::new(Duration::from_secs(5), AuthMode::None, overrides);
    let (_, client) = state.select_site(&server.uri()).unwrap();

    client.get("/session/current.json", None).await.expect("payload");
}
