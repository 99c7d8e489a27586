//! Diagnostic hooks
//!
//! Two optional observation points around a dispatch: one before the request
//! leaves, one when the response arrives. Hooks return `()` so they cannot
//! fail a dispatch; the default [`CurlSink`] renders the outgoing request as
//! a copy-pasteable `curl` command line through `tracing`, leaving buffering
//! and output concerns to the installed subscriber.

use url::Url;

use crate::request::Method;

/// Observer for outgoing requests and incoming responses
pub trait DiagnosticSink: Send + Sync {
    /// Called just before the transport is invoked
    fn on_request(&self, method: Method, url: &Url, headers: &[(String, String)], body: Option<&[u8]>);

    /// Called as soon as the transport responds
    fn on_response(&self, status: Option<u16>, url: &Url, body: &[u8]);
}

/// Default sink: curl command lines and pretty-printed bodies via `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct CurlSink;

impl DiagnosticSink for CurlSink {
    fn on_request(&self, method: Method, url: &Url, headers: &[(String, String)], body: Option<&[u8]>) {
        tracing::debug!("outgoing request:\n{}", curl_command(method, url, headers, body));
    }

    fn on_response(&self, status: Option<u16>, url: &Url, body: &[u8]) {
        match status {
            Some(code) => {
                tracing::debug!("response {} from {}:\n{}", code, url, render_body(body));
            }
            None => {
                tracing::warn!("non-HTTP response from {}", url);
            }
        }
    }
}

/// Render a request as a `curl` invocation
///
/// `--data` is omitted when the body is empty or not valid UTF-8.
pub fn curl_command(
    method: Method,
    url: &Url,
    headers: &[(String, String)],
    body: Option<&[u8]>,
) -> String {
    let mut options = vec![format!("-i '{}'", url), format!("-X {}", method)];

    for (name, value) in headers {
        options.push(format!("-H '{}: {}'", name, value));
    }

    if let Some(bytes) = body {
        if let Ok(text) = std::str::from_utf8(bytes) {
            if !text.is_empty() {
                options.push(format!("--data '{}'", text));
            }
        }
    }

    format!("curl {}", options.join(" \\\n"))
}

/// Render a response body: pretty JSON, raw text fallback, placeholder last
fn render_body(body: &[u8]) -> String {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) {
        if let Ok(pretty) = serde_json::to_string_pretty(&value) {
            return pretty;
        }
    }
    match std::str::from_utf8(body) {
        Ok(text) if !text.is_empty() => text.to_string(),
        _ => "<no body>".to_string(),
    }
}
