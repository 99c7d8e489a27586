//! The dispatching client
//!
//! [`ApiClient`] owns the configuration (base URL, global headers), builds
//! the final URL, merges headers, hands the request to the [`Transport`],
//! classifies the status code and decodes the body. It holds no per-call
//! state, so any number of dispatches may run concurrently; configuration is
//! snapshotted once at the start of each dispatch, so changes apply from the
//! next call onward.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock as StdRwLock};

use async_trait::async_trait;
use once_cell::sync::Lazy;

use crate::connector::Connector;
use crate::diagnostics::{CurlSink, DiagnosticSink};
use crate::error::{Error, Result};
use crate::request::ApiRequest;
use crate::transport::{ReqwestTransport, Transport, TransportRequest};

static GLOBAL: Lazy<ApiClient> = Lazy::new(ApiClient::new);

#[derive(Debug, Default, Clone)]
struct ClientConfig {
    base_url: Option<String>,
    global_headers: HashMap<String, String>,
}

/// Client that executes [`ApiRequest`]s against a configured base URL
pub struct ApiClient {
    config: StdRwLock<ClientConfig>,
    transport: Arc<dyn Transport>,
    sink: Option<Arc<dyn DiagnosticSink>>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let config = self.config.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("ApiClient")
            .field("base_url", &config.base_url)
            .field("global_headers", &config.global_headers)
            .finish_non_exhaustive()
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiClient {
    /// Create a client with the default reqwest transport and curl
    /// diagnostics; no base URL is configured yet
    pub fn new() -> Self {
        Self {
            config: StdRwLock::new(ClientConfig::default()),
            transport: Arc::new(ReqwestTransport::new()),
            sink: Some(Arc::new(CurlSink)),
        }
    }

    /// Create a client builder
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Process-wide default client
    ///
    /// Constructed once on first use; configure it like any other instance.
    /// Prefer passing an explicitly constructed client where practical.
    pub fn global() -> &'static ApiClient {
        &GLOBAL
    }

    /// Set the base URL, e.g. `https://api.example.com/v1`
    ///
    /// Takes effect on the next dispatch. The string is parsed fresh on
    /// every dispatch; an unparseable value surfaces as [`Error::InvalidUrl`]
    /// there.
    pub fn set_base_url(&self, base_url: impl Into<String>) {
        self.write_config().base_url = Some(base_url.into());
    }

    /// Remove the base URL; subsequent dispatches fail with
    /// [`Error::InvalidUrl`]
    pub fn clear_base_url(&self) {
        self.write_config().base_url = None;
    }

    /// Currently configured base URL
    pub fn base_url(&self) -> Option<String> {
        self.read_config().base_url
    }

    /// Replace all global headers
    pub fn set_global_headers(&self, headers: HashMap<String, String>) {
        self.write_config().global_headers = headers;
    }

    /// Insert or overwrite one global header
    pub fn insert_global_header(&self, name: impl Into<String>, value: impl Into<String>) {
        self.write_config()
            .global_headers
            .insert(name.into(), value.into());
    }

    fn read_config(&self) -> ClientConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn write_config(&self) -> std::sync::RwLockWriteGuard<'_, ClientConfig> {
        self.config.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Merge global and request-specific headers; request headers win on
/// conflict. Sorted by name so rendering is deterministic.
fn merge_headers(
    global: &HashMap<String, String>,
    request: Option<HashMap<String, String>>,
) -> Vec<(String, String)> {
    let mut merged: BTreeMap<String, String> = global
        .iter()
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();
    if let Some(extra) = request {
        merged.extend(extra);
    }
    merged.into_iter().collect()
}

#[async_trait]
impl Connector for ApiClient {
    async fn send<R>(&self, request: &R) -> Result<R::Output>
    where
        R: ApiRequest,
    {
        let config = self.read_config();
        let base_url = config.base_url.ok_or(Error::InvalidUrl)?;
        let url = request.url(&base_url)?;

        let method = request.method();
        let headers = merge_headers(&config.global_headers, request.headers());
        let body = request.body();

        tracing::debug!(kind = R::KIND, %url, "dispatching {} request", method);

        if let Some(sink) = &self.sink {
            sink.on_request(method, &url, &headers, body.as_deref());
        }

        let response = self
            .transport
            .send(TransportRequest {
                method,
                url: url.clone(),
                headers,
                body,
            })
            .await?;

        if let Some(sink) = &self.sink {
            sink.on_response(response.status, &url, &response.body);
        }

        match response.status {
            Some(code) if (200..300).contains(&code) => {
                serde_json::from_slice(&response.body).map_err(Error::from)
            }
            Some(code) => Err(Error::Status(
                Some(code),
                String::from_utf8_lossy(&response.body).into_owned(),
            )),
            None => Err(Error::Status(None, String::new())),
        }
    }
}

/// Builder for [`ApiClient`]
#[derive(Default)]
pub struct ApiClientBuilder {
    base_url: Option<String>,
    global_headers: HashMap<String, String>,
    transport: Option<Arc<dyn Transport>>,
    sink: Option<Arc<dyn DiagnosticSink>>,
    no_diagnostics: bool,
}

impl fmt::Debug for ApiClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClientBuilder")
            .field("base_url", &self.base_url)
            .field("global_headers", &self.global_headers)
            .field("no_diagnostics", &self.no_diagnostics)
            .finish_non_exhaustive()
    }
}

impl ApiClientBuilder {
    /// Set the base URL
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Add a global header
    pub fn global_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.global_headers.insert(name.into(), value.into());
        self
    }

    /// Use a custom transport instead of the reqwest default
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Use a custom diagnostic sink instead of [`CurlSink`]
    pub fn sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Disable diagnostics entirely
    pub fn no_diagnostics(mut self) -> Self {
        self.no_diagnostics = true;
        self
    }

    /// Build the client
    pub fn build(self) -> ApiClient {
        let sink = if self.no_diagnostics {
            None
        } else {
            Some(self.sink.unwrap_or_else(|| Arc::new(CurlSink) as Arc<dyn DiagnosticSink>))
        };
        ApiClient {
            config: StdRwLock::new(ClientConfig {
                base_url: self.base_url,
                global_headers: self.global_headers,
            }),
            transport: self
                .transport
                .unwrap_or_else(|| Arc::new(ReqwestTransport::new())),
            sink,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::pagination::Page;
    use crate::request::{Method, PaginatedRequest};
    use crate::transport::TransportResponse;

    fn headers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn test_merge_headers_request_wins() {
        let global = headers(&[("Authorization", "A")]);
        let request = headers(&[("Authorization", "B"), ("X-Trace", "1")]);
        let merged = merge_headers(&global, Some(request));
        assert_eq!(
            merged,
            vec![
                ("Authorization".to_string(), "B".to_string()),
                ("X-Trace".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn test_merge_headers_no_request_headers() {
        let global = headers(&[("Accept", "application/json")]);
        let merged = merge_headers(&global, None);
        assert_eq!(merged, vec![("Accept".to_string(), "application/json".to_string())]);
    }

    /// Transport double that records every request and answers with a canned
    /// response.
    #[derive(Debug)]
    struct StaticTransport {
        status: Option<u16>,
        body: Vec<u8>,
        seen: Mutex<Vec<TransportRequest>>,
    }

    impl StaticTransport {
        fn new(status: Option<u16>, body: &[u8]) -> Arc<Self> {
            Arc::new(Self {
                status,
                body: body.to_vec(),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<TransportRequest> {
            self.seen
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }
    }

    #[async_trait]
    impl Transport for StaticTransport {
        async fn send(&self, request: TransportRequest) -> Result<TransportResponse> {
            self.seen
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(request);
            Ok(TransportResponse {
                status: self.status,
                headers: Vec::new(),
                body: self.body.clone(),
            })
        }
    }

    struct GetUser;

    impl ApiRequest for GetUser {
        type Output = serde_json::Value;
        const KIND: &'static str = "get_user";

        fn path(&self) -> String {
            "users/42".to_string()
        }

        fn headers(&self) -> Option<HashMap<String, String>> {
            Some(headers(&[("Authorization", "B")]))
        }
    }

    fn client_with(transport: Arc<StaticTransport>) -> ApiClient {
        ApiClient::builder()
            .base_url("https://api.example.com")
            .global_header("Authorization", "A")
            .global_header("Accept", "application/json")
            .transport(transport)
            .no_diagnostics()
            .build()
    }

    #[tokio::test]
    async fn test_send_success_decodes_body() {
        let transport = StaticTransport::new(Some(200), br#"{"id":42}"#);
        let client = client_with(transport.clone());

        let value = client.send(&GetUser).await.expect("dispatch should succeed");
        assert_eq!(value, serde_json::json!({"id": 42}));

        let seen = transport.requests();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].url.as_str(), "https://api.example.com/users/42");
        assert_eq!(seen[0].method, Method::Get);
        // Request header overrode the global one.
        assert_eq!(
            seen[0].headers,
            vec![
                ("Accept".to_string(), "application/json".to_string()),
                ("Authorization".to_string(), "B".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_send_without_base_url() {
        let transport = StaticTransport::new(Some(200), b"{}");
        let client = ApiClient::builder()
            .transport(transport.clone())
            .no_diagnostics()
            .build();

        let result = client.send(&GetUser).await;
        assert_eq!(result.expect_err("should fail"), Error::InvalidUrl);
        assert!(transport.requests().is_empty(), "transport must not be called");
    }

    #[tokio::test]
    async fn test_send_malformed_base_url() {
        let transport = StaticTransport::new(Some(200), b"{}");
        let client = ApiClient::builder()
            .base_url("exam ple")
            .transport(transport)
            .no_diagnostics()
            .build();

        assert_eq!(client.send(&GetUser).await.expect_err("should fail"), Error::InvalidUrl);
    }

    #[tokio::test]
    async fn test_send_non_2xx_skips_decode() {
        let transport = StaticTransport::new(Some(404), b"user not found");
        let client = client_with(transport);

        let error = client.send(&GetUser).await.expect_err("should fail");
        assert_eq!(error, Error::Status(Some(404), "user not found".to_string()));
    }

    #[tokio::test]
    async fn test_send_204_still_attempts_decode() {
        // Success classification always runs the decode, so an empty 204
        // body fails against a shape that cannot be produced from nothing.
        let transport = StaticTransport::new(Some(204), b"");
        let client = client_with(transport);

        match client.send(&GetUser).await {
            Err(Error::Decode(_)) => {}
            other => panic!("expected decode failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_send_non_http_response() {
        let transport = StaticTransport::new(None, b"garbage");
        let client = client_with(transport);

        let error = client.send(&GetUser).await.expect_err("should fail");
        assert_eq!(error, Error::Status(None, String::new()));
    }

    #[tokio::test]
    async fn test_reconfiguration_applies_to_next_dispatch() {
        let transport = StaticTransport::new(Some(200), b"{}");
        let client = client_with(transport.clone());

        client.send(&GetUser).await.expect("first dispatch");
        client.set_base_url("https://staging.example.com/v2");
        client.send(&GetUser).await.expect("second dispatch");

        let seen = transport.requests();
        assert_eq!(seen[0].url.as_str(), "https://api.example.com/users/42");
        assert_eq!(seen[1].url.as_str(), "https://staging.example.com/v2/users/42");
    }

    struct ListPosts {
        page: u32,
    }

    impl ApiRequest for ListPosts {
        type Output = String;
        const KIND: &'static str = "list_posts";

        fn path(&self) -> String {
            "posts".to_string()
        }

        fn query(&self) -> Vec<(String, String)> {
            vec![("sort".to_string(), "asc".to_string())]
        }
    }

    impl PaginatedRequest for ListPosts {
        fn page(&self) -> u32 {
            self.page
        }

        fn page_size(&self) -> u32 {
            10
        }
    }

    #[tokio::test]
    async fn test_send_paginated_forces_query_and_decodes_envelope() {
        let transport = StaticTransport::new(
            Some(200),
            br#"{"items":["a"],"currentPage":2,"totalPages":5}"#,
        );
        let client = client_with(transport.clone());

        let page: Page<String> = client
            .send_paginated(&ListPosts { page: 2 })
            .await
            .expect("paginated dispatch should succeed");
        assert_eq!(page.items, vec!["a".to_string()]);
        assert_eq!(page.next_page(), Some(3));

        let seen = transport.requests();
        // The descriptor's own `sort` parameter is discarded.
        assert_eq!(
            seen[0].url.as_str(),
            "https://api.example.com/posts?page=2&pageSize=10"
        );
    }

    #[tokio::test]
    async fn test_header_reconfiguration_applies_to_next_dispatch() {
        let transport = StaticTransport::new(Some(200), b"{}");
        let client = client_with(transport.clone());

        client.send(&GetUser).await.expect("first dispatch");
        client.insert_global_header("X-Env", "staging");
        client.send(&GetUser).await.expect("second dispatch");

        let seen = transport.requests();
        assert!(!seen[0].headers.iter().any(|(name, _)| name == "X-Env"));
        assert!(seen[1]
            .headers
            .contains(&("X-Env".to_string(), "staging".to_string())));
    }

    #[tokio::test]
    async fn test_clearing_base_url_fails_next_dispatch() {
        let transport = StaticTransport::new(Some(200), b"{}");
        let client = client_with(transport);

        assert_eq!(client.base_url(), Some("https://api.example.com".to_string()));
        client.clear_base_url();
        assert_eq!(client.base_url(), None);
        assert_eq!(client.send(&GetUser).await.expect_err("should fail"), Error::InvalidUrl);
    }

    #[tokio::test]
    async fn test_global_client_is_shared() {
        let first = ApiClient::global();
        let second = ApiClient::global();
        assert!(std::ptr::eq(first, second));
    }
}
