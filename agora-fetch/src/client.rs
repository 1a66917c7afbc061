//! The HTTP request engine.
//!
//! One [`HttpClient`] is scoped to a single site origin and owns that
//! site's session state: a cookie jar fed by Set-Cookie responses, a
//! TTL-bounded payload cache, and the last successful URL used for the
//! Referer header. Every logical request runs through the same pipeline:
//! header construction, per-attempt timeout and cancellation, transient
//! failure retries with exponential backoff, and classification into
//! [`FetchError`] kinds.
//!
//! Concurrent requests against one client share the jar, cache, and
//! last-URL maps with last-writer-wins semantics; the data is advisory
//! session state, not a correctness guarantee, so no stronger ordering is
//! provided. Locks are never held across an await point.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use agora_core::{AuthMode, CoreError, LoginCredentials};
use reqwest::Method;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use url::Url;

use crate::cache::ResponseCache;
use crate::cookies::CookieJar;
use crate::error::{FetchError, classify_transport};
use crate::retry::RetryPolicy;

/// Browser user-agent string; upstream forums filter obvious automation
/// agents, so requests identify as a desktop Edge browser.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/141.0.0.0 Safari/537.36 Edg/141.0.0.0";

// ============================================================================
// Payload
// ============================================================================

/// A decoded response body, selected by the response content-type.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// The response declared `application/json` and decoded as JSON.
    Json(Value),
    /// Any other content-type, returned as raw text.
    Text(String),
}

impl Payload {
    /// Unwraps the JSON value, failing for text payloads.
    pub fn into_json(self) -> Result<Value, FetchError> {
        match self {
            Self::Json(value) => Ok(value),
            Self::Text(_) => Err(CoreError::InvalidData(
                "expected a JSON response, got plain text".to_string(),
            )
            .into()),
        }
    }

    /// Returns the JSON value when this payload is JSON.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }
}

// ============================================================================
// HTTP Client
// ============================================================================

/// Retrying, cookie-aware, auth-aware HTTP client for one site origin.
#[derive(Debug)]
pub struct HttpClient {
    base: Url,
    timeout: Duration,
    auth: AuthMode,
    login: Option<LoginCredentials>,
    http: reqwest::Client,
    retry: RetryPolicy,
    jar: Mutex<CookieJar>,
    cache: Mutex<ResponseCache>,
    last_url: Mutex<Option<String>>,
}

impl HttpClient {
    /// Creates a client for the given base origin.
    ///
    /// `login` credentials are stored for a future authentication flow and
    /// never submitted by this client.
    pub fn new(
        base_url: &str,
        timeout: Duration,
        auth: AuthMode,
        login: Option<LoginCredentials>,
    ) -> Result<Self, FetchError> {
        let base = Url::parse(base_url)
            .map_err(|err| CoreError::InvalidConfig(format!("invalid base URL {base_url}: {err}")))?;
        let http = reqwest::Client::builder().build().map_err(|err| FetchError::Unclassified {
            name: "client build error".to_string(),
            message: err.to_string(),
        })?;

        Ok(Self {
            base,
            timeout,
            auth,
            login,
            http,
            retry: RetryPolicy::default(),
            jar: Mutex::new(CookieJar::new()),
            cache: Mutex::new(ResponseCache::new()),
            last_url: Mutex::new(None),
        })
    }

    /// Replaces the retry policy for this client.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The normalized origin this client is scoped to.
    pub fn origin(&self) -> String {
        self.base.origin().ascii_serialization()
    }

    /// The resolved authentication mode.
    pub fn auth(&self) -> &AuthMode {
        &self.auth
    }

    /// Stored login credentials, if any were resolved from configuration.
    pub fn login_credentials(&self) -> Option<&LoginCredentials> {
        self.login.as_ref()
    }

    /// The configured per-attempt timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Issues one logical GET through the full pipeline.
    pub async fn get(
        &self,
        path: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<Payload, FetchError> {
        self.request(Method::GET, path, None, cancel).await
    }

    /// Serves a cached payload for the resolved URL while it is fresh,
    /// otherwise performs a GET and stores the result for `ttl`.
    ///
    /// This is the only path that consults or updates the cache.
    pub async fn get_cached(
        &self,
        path: &str,
        ttl: Duration,
        cancel: Option<&CancellationToken>,
    ) -> Result<Payload, FetchError> {
        let key = self.resolve(path)?.to_string();
        let now = Instant::now();
        if let Some(hit) = lock(&self.cache).fresh(&key, now) {
            debug!(url = %key, "serving cached payload");
            return Ok(hit);
        }

        let payload = self.request(Method::GET, path, None, cancel).await?;
        lock(&self.cache).store(key, payload.clone(), now + ttl);
        Ok(payload)
    }

    /// Issues one logical POST with a JSON-encoded body.
    pub async fn post(
        &self,
        path: &str,
        body: &Value,
        cancel: Option<&CancellationToken>,
    ) -> Result<Payload, FetchError> {
        self.request(Method::POST, path, Some(body), cancel).await
    }

    /// Runs the retry loop around individual attempts.
    ///
    /// Up to `retry.max_attempts` total attempts; only a classified 429 or
    /// >= 500 upstream status is retried. Every other error kind, and
    /// exhaustion, propagates immediately.
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        cancel: Option<&CancellationToken>,
    ) -> Result<Payload, FetchError> {
        let url = self.resolve(path)?;
        let mut attempt: u32 = 1;

        loop {
            match self.guarded_attempt(&method, &url, body, cancel).await {
                Ok(payload) => return Ok(payload),
                Err(err) => {
                    let retryable =
                        err.status().is_some_and(|s| self.retry.should_retry_status(s));
                    if retryable && attempt < self.retry.max_attempts {
                        let delay = self.retry.delay_for_retry(attempt);
                        info!(
                            %method,
                            %url,
                            attempt,
                            retries = self.retry.max_attempts - 1,
                            delay_ms = delay.as_millis() as u64,
                            status = err.status(),
                            "retrying after transient upstream failure"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }
                    if attempt > 1 {
                        error!(%method, %url, attempts = attempt, "request failed after retries");
                    }
                    return Err(err);
                }
            }
        }
    }

    /// Runs one attempt under the effective cancellation signal.
    ///
    /// The signal fires on whichever of {caller token, this attempt's
    /// deadline} occurs first and stays fired. Each attempt gets a fresh
    /// timeout window; the deadline is not shared across retries, so total
    /// wall clock for a retried call can exceed the configured bound.
    async fn guarded_attempt(
        &self,
        method: &Method,
        url: &Url,
        body: Option<&Value>,
        cancel: Option<&CancellationToken>,
    ) -> Result<Payload, FetchError> {
        let attempt = self.attempt(method, url, body);
        let outcome = match cancel {
            Some(token) => tokio::select! {
                () = token.cancelled() => {
                    debug!(%method, %url, "request cancelled by caller");
                    return Err(FetchError::Cancelled);
                }
                outcome = tokio::time::timeout(self.timeout, attempt) => outcome,
            },
            None => tokio::time::timeout(self.timeout, attempt).await,
        };

        match outcome {
            Ok(result) => result,
            Err(_elapsed) => {
                error!(%method, %url, timeout = ?self.timeout, "request deadline elapsed");
                Err(FetchError::Timeout(self.timeout))
            }
        }
    }

    /// One attempt: headers, network call, cookie harvest, classification,
    /// content decode.
    async fn attempt(
        &self,
        method: &Method,
        url: &Url,
        body: Option<&Value>,
    ) -> Result<Payload, FetchError> {
        let headers = self.build_headers(body.is_some())?;
        debug!(%method, %url, "sending request");

        let mut request = self.http.request(method.clone(), url.clone()).headers(headers);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                error!(%method, %url, error = %err, "transport failure");
                return Err(classify_transport(&err, self.timeout));
            }
        };

        let status = response.status();
        debug!(%method, %url, %status, "received response");

        self.harvest_cookies(response.headers());
        *lock(&self.last_url) = Some(url.to_string());

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let body = serde_json::from_str::<Value>(&text)
                .unwrap_or_else(|_| Value::String(text.clone()));
            error!(%method, %url, %status, body = %text, "upstream returned error status");
            return Err(FetchError::Upstream {
                status: status.as_u16(),
                message: format!("HTTP {status}"),
                body,
            });
        }

        let is_json = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("application/json"));

        if is_json {
            let value = response
                .json::<Value>()
                .await
                .map_err(|err| classify_transport(&err, self.timeout))?;
            Ok(Payload::Json(value))
        } else {
            let text = response
                .text()
                .await
                .map_err(|err| classify_transport(&err, self.timeout))?;
            Ok(Payload::Text(text))
        }
    }

    /// Builds the header set for one request.
    fn build_headers(&self, has_body: bool) -> Result<HeaderMap, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/json, text/javascript, */*; q=0.01"),
        );
        headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
        headers.insert(header::USER_AGENT, HeaderValue::from_static(USER_AGENT));
        headers.insert(
            HeaderName::from_static("x-requested-with"),
            HeaderValue::from_static("XMLHttpRequest"),
        );

        // Referer only once a prior request on this client has completed.
        if lock(&self.last_url).is_some() {
            headers.insert(header::REFERER, header_value(&format!("{}/", self.origin()))?);
        }

        let cookie = lock(&self.jar).header_value();
        if let Some(cookie) = cookie {
            headers.insert(header::COOKIE, header_value(&cookie)?);
        }

        match &self.auth {
            AuthMode::None => {}
            AuthMode::ApiKey { key, username } => {
                headers.insert(HeaderName::from_static("api-key"), header_value(key)?);
                if let Some(username) = username {
                    headers.insert(HeaderName::from_static("api-username"), header_value(username)?);
                }
            }
            AuthMode::UserApiKey { key, client_id } => {
                headers.insert(HeaderName::from_static("user-api-key"), header_value(key)?);
                if let Some(client_id) = client_id {
                    headers.insert(
                        HeaderName::from_static("user-api-client-id"),
                        header_value(client_id)?,
                    );
                }
            }
        }

        if has_body {
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        Ok(headers)
    }

    /// Stores every Set-Cookie value from a response into the jar.
    fn harvest_cookies(&self, headers: &HeaderMap) {
        let mut jar = lock(&self.jar);
        for value in headers.get_all(header::SET_COOKIE) {
            if let Ok(value) = value.to_str() {
                jar.ingest(value);
            }
        }
    }

    /// Resolves a request path against the base origin.
    fn resolve(&self, path: &str) -> Result<Url, FetchError> {
        self.base
            .join(path)
            .map_err(|err| {
                CoreError::InvalidConfig(format!("invalid request path {path}: {err}")).into()
            })
    }
}

fn header_value(value: &str) -> Result<HeaderValue, FetchError> {
    HeaderValue::from_str(value)
        .map_err(|err| CoreError::InvalidConfig(format!("invalid header value: {err}")).into())
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn client_with_auth(auth: AuthMode) -> HttpClient {
        HttpClient::new("https://forum.example.com", Duration::from_secs(15), auth, None)
            .expect("client")
    }

    #[test]
    fn test_baseline_headers_without_session_state() {
        let client = client_with_auth(AuthMode::None);
        let headers = client.build_headers(false).unwrap();

        assert_eq!(
            headers.get(header::ACCEPT).unwrap(),
            "application/json, text/javascript, */*; q=0.01"
        );
        assert_eq!(headers.get("x-requested-with").unwrap(), "XMLHttpRequest");
        assert!(headers.get(header::REFERER).is_none());
        assert!(headers.get(header::COOKIE).is_none());
        assert!(headers.get(header::CONTENT_TYPE).is_none());
        assert!(headers.get("api-key").is_none());
    }

    #[test]
    fn test_referer_appears_after_first_completion() {
        let client = client_with_auth(AuthMode::None);
        *lock(&client.last_url) = Some("https://forum.example.com/hot.json".to_string());

        let headers = client.build_headers(false).unwrap();
        assert_eq!(headers.get(header::REFERER).unwrap(), "https://forum.example.com/");
    }

    #[test]
    fn test_cookie_header_reflects_jar() {
        let client = client_with_auth(AuthMode::None);
        lock(&client.jar).ingest("_t=abc; Path=/");

        let headers = client.build_headers(false).unwrap();
        assert_eq!(headers.get(header::COOKIE).unwrap(), "_t=abc");
    }

    #[test]
    fn test_api_key_headers() {
        let client = client_with_auth(AuthMode::ApiKey {
            key: "secret".to_string(),
            username: Some("system".to_string()),
        });

        let headers = client.build_headers(false).unwrap();
        assert_eq!(headers.get("api-key").unwrap(), "secret");
        assert_eq!(headers.get("api-username").unwrap(), "system");
        assert!(headers.get("user-api-key").is_none());
    }

    #[test]
    fn test_user_api_key_headers() {
        let client = client_with_auth(AuthMode::UserApiKey {
            key: "user-secret".to_string(),
            client_id: Some("agora-1".to_string()),
        });

        let headers = client.build_headers(false).unwrap();
        assert_eq!(headers.get("user-api-key").unwrap(), "user-secret");
        assert_eq!(headers.get("user-api-client-id").unwrap(), "agora-1");
        assert!(headers.get("api-key").is_none());
    }

    #[test]
    fn test_content_type_only_with_body() {
        let client = client_with_auth(AuthMode::None);
        let headers = client.build_headers(true).unwrap();
        assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "application/json");
    }

    #[test]
    fn test_payload_into_json() {
        let json = Payload::Json(serde_json::json!({"topics": []}));
        assert_eq!(json.into_json().unwrap(), serde_json::json!({"topics": []}));

        let text = Payload::Text("not json".to_string());
        assert!(text.into_json().is_err());
    }

    #[test]
    fn test_resolve_joins_against_origin() {
        let client = client_with_auth(AuthMode::None);
        let url = client.resolve("/search.json?q=foo").unwrap();
        assert_eq!(url.as_str(), "https://forum.example.com/search.json?q=foo");
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let result =
            HttpClient::new("not a url", Duration::from_secs(15), AuthMode::None, None);
        assert!(matches!(result, Err(FetchError::Core(_))));
    }
}
