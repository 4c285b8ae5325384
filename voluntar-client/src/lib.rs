//! Voluntar Client
//!
//! A typed client for the Voluntar service. Account and listing operations
//! go through the GraphQL endpoint, the public board through REST, and live
//! changes arrive over the `/ws` socket.
//!
//! Responses for the user and listing lists are cached for five minutes and
//! dropped whenever a mutation or a live event makes them stale.
//!
//! # Example
//!
//! ```no_run
//! use voluntar_client::VoluntarClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = VoluntarClient::new("http://localhost:4000");
//!
//!     client.login("M@R.C", "123").await?;
//!     for listing in client.listings().await? {
//!         println!("{} {}", listing.id, listing.title);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod error;
pub mod events;
mod listings;
mod users;

// Re-export commonly used types
pub use cache::TtlCache;
pub use error::{ClientError, Result};
pub use events::{EventSubscription, ReconnectPolicy};

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use voluntar_core::dto::user::UserSummary;

/// How GraphQL requests are retried after a transient failure
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}

/// Who the client is acting as
#[derive(Debug, Clone, Default)]
struct Session {
    token: Option<String>,
    user: Option<UserSummary>,
}

/// Client for the Voluntar API
///
/// Cloning is cheap; clones share the session and the cache.
#[derive(Debug, Clone)]
pub struct VoluntarClient {
    /// Base URL of the service (e.g., "http://localhost:4000")
    base_url: String,
    client: Client,
    session: Arc<RwLock<Session>>,
    cache: Arc<Mutex<TtlCache>>,
    retry: RetryPolicy,
}

impl VoluntarClient {
    /// Create a new client
    ///
    /// # Example
    /// ```
    /// use voluntar_client::VoluntarClient;
    ///
    /// let client = VoluntarClient::new("http://localhost:4000/");
    /// assert_eq!(client.base_url(), "http://localhost:4000");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            session: Arc::new(RwLock::new(Session::default())),
            cache: Arc::new(Mutex::new(TtlCache::default())),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Use an existing token instead of logging in
    pub async fn set_token(&self, token: impl Into<String>) {
        self.session.write().await.token = Some(token.into());
    }

    /// Get the base URL of the service
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn token(&self) -> Option<String> {
        self.session.read().await.token.clone()
    }

    // =============================================================================
    // GraphQL
    // =============================================================================

    /// Run a GraphQL operation and decode `data.<field>`
    ///
    /// Transport failures and 5xx responses are retried per the
    /// [`RetryPolicy`]. GraphQL errors are returned as-is.
    pub async fn graphql<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
        field: &str,
    ) -> Result<T> {
        let mut attempt = 1;

        loop {
            match self.graphql_once(query, &variables).await {
                Ok(data) => return take_field(data, field),
                Err(err) if err.is_transient() && attempt < self.retry.attempts => {
                    tracing::warn!(
                        "GraphQL request failed ({}), retrying ({}/{})",
                        err,
                        attempt,
                        self.retry.attempts
                    );
                    tokio::time::sleep(self.retry.delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn graphql_once(&self, query: &str, variables: &Value) -> Result<Value> {
        let url = format!("{}/graphql", self.base_url);
        let mut request = self
            .client
            .post(&url)
            .json(&json!({ "query": query, "variables": variables }));

        if let Some(token) = self.token().await {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let body: GraphQlResponse = self.handle_response(response).await?;

        body.into_data()
    }

    // =============================================================================
    // Cache
    // =============================================================================

    /// Serve `key` from the cache, or fetch and store it
    async fn cached<T, F, Fut>(&self, key: &str, fetch: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let generation = {
            let mut cache = self.cache.lock().await;
            if let Some(value) = cache.get(key) {
                match serde_json::from_value(value) {
                    Ok(hit) => {
                        tracing::debug!("Cache hit: {}", key);
                        return Ok(hit);
                    }
                    Err(err) => {
                        tracing::debug!("Discarding unreadable cache entry {}: {}", key, err)
                    }
                }
            }
            cache.generation()
        };

        let fresh = fetch().await?;

        if let Ok(value) = serde_json::to_value(&fresh) {
            self.cache.lock().await.set_if_current(key, value, generation);
        }

        Ok(fresh)
    }

    /// Drop cached entries whose key contains `pattern`
    pub async fn invalidate(&self, pattern: &str) {
        self.cache.lock().await.invalidate(pattern);
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// This method checks the status code and returns an appropriate error if
    /// the request failed, or deserializes the response body if successful.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(
                status.as_u16(),
                error_message(&error_text),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}

// =============================================================================
// Wire helpers
// =============================================================================

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
    #[serde(default)]
    extensions: Option<Value>,
}

impl GraphQlResponse {
    fn into_data(self) -> Result<Value> {
        if let Some(first) = self.errors.into_iter().next() {
            let code = first
                .extensions
                .as_ref()
                .and_then(|ext| ext.get("code"))
                .and_then(Value::as_str)
                .map(str::to_string);

            return Err(ClientError::GraphQl {
                message: first.message,
                code,
            });
        }

        self.data
            .ok_or_else(|| ClientError::ParseError("GraphQL response had no data".to_string()))
    }
}

fn take_field<T: DeserializeOwned>(mut data: Value, field: &str) -> Result<T> {
    let value = data
        .get_mut(field)
        .map(Value::take)
        .ok_or_else(|| ClientError::ParseError(format!("missing field '{}' in response", field)))?;

    serde_json::from_value(value)
        .map_err(|e| ClientError::ParseError(format!("Failed to decode '{}': {}", field, e)))
}

/// Pull `error` out of a `{"error": "..."}` body, or keep the raw text
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| value.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = VoluntarClient::new("http://localhost:4000");
        assert_eq!(client.base_url(), "http://localhost:4000");
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = VoluntarClient::new("http://localhost:4000/");
        assert_eq!(client.base_url(), "http://localhost:4000");
    }

    #[test]
    fn test_client_with_custom_client() {
        let http_client = Client::new();
        let client = VoluntarClient::with_client("http://localhost:4000", http_client);
        assert_eq!(client.base_url(), "http://localhost:4000");
    }

    #[test]
    fn test_graphql_errors_surface_first_message() {
        let body: GraphQlResponse = serde_json::from_value(json!({
            "data": null,
            "errors": [
                { "message": "access denied", "extensions": { "code": "FORBIDDEN" } },
                { "message": "second" }
            ]
        }))
        .unwrap();

        match body.into_data() {
            Err(ClientError::GraphQl { message, code }) => {
                assert_eq!(message, "access denied");
                assert_eq!(code.as_deref(), Some("FORBIDDEN"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_take_field() {
        let data = json!({ "deleteListing": { "ok": true, "message": "gone" } });
        let ok: bool = take_field(data["deleteListing"].clone(), "ok").unwrap();
        assert!(ok);

        assert!(matches!(
            take_field::<bool>(json!({}), "ok"),
            Err(ClientError::ParseError(_))
        ));
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(error_message(r#"{"error":"invalid token"}"#), "invalid token");
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
    }

    #[tokio::test]
    async fn test_cached_serves_second_call_from_cache() {
        let client = VoluntarClient::new("http://localhost:4000");
        let calls = std::sync::atomic::AtomicUsize::new(0);

        for _ in 0..2 {
            let value: Vec<i64> = client
                .cached("users_list", || async {
                    calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                    Ok(vec![1, 2, 3])
                })
                .await
                .unwrap();
            assert_eq!(value, vec![1, 2, 3]);
        }
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);

        client.invalidate("users").await;
        assert!(client.cache.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_invalidation_during_fetch_is_not_overwritten() {
        let client = VoluntarClient::new("http://localhost:4000");

        let stale: Vec<i64> = client
            .cached("listings_list", || async {
                client.invalidate("listings").await;
                Ok(vec![1])
            })
            .await
            .unwrap();
        assert_eq!(stale, vec![1]);
        assert!(client.cache.lock().await.get("listings_list").is_none());

        let fresh: Vec<i64> = client
            .cached("listings_list", || async { Ok(vec![1, 2]) })
            .await
            .unwrap();
        assert_eq!(fresh, vec![1, 2]);
    }

    /// Serves `status` and `body` to every request, counting them
    async fn canned_server(
        status: &'static str,
        body: Value,
    ) -> (String, Arc<std::sync::atomic::AtomicUsize>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = hits.clone();
        let body = body.to_string();

        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);

                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                loop {
                    let n = stream.read(&mut buf).await.unwrap_or(0);
                    if n == 0 {
                        break;
                    }
                    request.extend_from_slice(&buf[..n]);

                    let text = String::from_utf8_lossy(&request).to_string();
                    if let Some(end) = text.find("\r\n\r\n") {
                        let length = text[..end]
                            .lines()
                            .find_map(|line| {
                                let (name, value) = line.split_once(':')?;
                                name.eq_ignore_ascii_case("content-length")
                                    .then(|| value.trim().parse::<usize>().ok())
                                    .flatten()
                            })
                            .unwrap_or(0);
                        if request.len() >= end + 4 + length {
                            break;
                        }
                    }
                }

                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        (format!("http://{}", addr), hits)
    }

    #[tokio::test]
    async fn test_graphql_errors_are_not_retried() {
        let (url, hits) = canned_server(
            "200 OK",
            json!({ "data": null, "errors": [{ "message": "access denied", "extensions": { "code": "FORBIDDEN" } }] }),
        )
        .await;
        let client = VoluntarClient::new(url).with_retry(RetryPolicy {
            attempts: 3,
            delay: Duration::from_millis(10),
        });

        let result: Result<Value> = client.graphql("{ users { id } }", json!({}), "users").await;

        assert!(matches!(result, Err(ClientError::GraphQl { .. })));
        assert_eq!(hits.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_server_errors_are_retried() {
        let (url, hits) = canned_server(
            "503 Service Unavailable",
            json!({ "error": "database unavailable" }),
        )
        .await;
        let client = VoluntarClient::new(url).with_retry(RetryPolicy {
            attempts: 3,
            delay: Duration::from_millis(10),
        });

        let result: Result<Value> = client.graphql("{ users { id } }", json!({}), "users").await;

        assert!(matches!(result, Err(ClientError::ApiError { .. })));
        assert_eq!(hits.load(std::sync::atomic::Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_retried_then_reported() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = VoluntarClient::new(format!("http://{}", addr)).with_retry(RetryPolicy {
            attempts: 2,
            delay: Duration::from_millis(10),
        });

        let result: Result<Value> = client.graphql("{ listings { id } }", json!({}), "listings").await;
        assert!(matches!(result, Err(ClientError::RequestFailed(_))));
    }
}
