//! Transport seam
//!
//! The dispatcher talks to the network through the [`Transport`] trait: one
//! request in, one status/headers/body out. Connection pooling, TLS and
//! socket-level concerns all live behind this seam. The default
//! implementation is [`ReqwestTransport`].

use std::fmt;

use async_trait::async_trait;
use url::Url;

use crate::error::{Error, Result};
use crate::request::Method;

/// One outgoing request, fully resolved
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// HTTP method
    pub method: Method,
    /// Final URL, already composed from base URL and path
    pub url: Url,
    /// Effective headers after merging
    pub headers: Vec<(String, String)>,
    /// Raw body bytes, if any
    pub body: Option<Vec<u8>>,
}

/// One incoming response
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code, or `None` if the transport produced something that
    /// was not a valid HTTP response
    pub status: Option<u16>,
    /// Response headers
    pub headers: Vec<(String, String)>,
    /// Raw body bytes
    pub body: Vec<u8>,
}

/// Capability to exchange one HTTP request for one response
///
/// Implementations report connectivity, timeout and TLS problems as
/// [`Error::Transport`]; status-code handling stays with the dispatcher.
#[async_trait]
pub trait Transport: fmt::Debug + Send + Sync {
    /// Send the request and wait for the full response
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse>;
}

/// Default transport backed by a pooled `reqwest` client
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    inner: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport with reqwest's default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an already-configured `reqwest` client
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { inner: client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse> {
        let mut builder = self
            .inner
            .request(request.method.into(), request.url.clone());

        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(Error::from)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?
            .to_vec();

        Ok(TransportResponse {
            status: Some(status),
            headers,
            body,
        })
    }
}
