//! In-memory test double for the restkit dispatch contract
//!
//! [`MockClient`] implements [`Connector`] without any transport. Responses
//! and errors are registered against a request's
//! [`KIND`](restkit::ApiRequest::KIND) token or against a concrete path, and
//! every dispatch is recorded in an ordered call log for verification.
//!
//! Lookup order mirrors the contract exactly: a registered *error* for the
//! kind or path always wins, only then is a registered response consulted.
//! With neither present, a plain dispatch fails with a descriptive error
//! while a paginated dispatch falls back to an empty envelope — an asymmetry
//! preserved from the behavior this double stands in for.
//!
//! # Example
//!
//! ```
//! use restkit::{ApiRequest, Connector};
//! use restkit_mock::MockClient;
//!
//! struct GetUser;
//!
//! impl ApiRequest for GetUser {
//!     type Output = String;
//!     const KIND: &'static str = "get_user";
//!
//!     fn path(&self) -> String {
//!         "users/42".to_string()
//!     }
//! }
//!
//! # tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(async {
//! let mock = MockClient::new();
//! mock.mock_response::<GetUser>(&"ada".to_string()).expect("registration");
//!
//! let user = mock.send(&GetUser).await.expect("mocked dispatch");
//! assert_eq!(user, "ada");
//! assert_eq!(mock.calls(), vec!["users/42".to_string()]);
//! # });
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use restkit::{ApiRequest, Connector, Error, Page, PaginatedRequest, Result};
use serde::Serialize;
use serde_json::Value;

/// Test double implementing [`Connector`] over in-memory lookup tables
#[derive(Default)]
pub struct MockClient {
    responses: Mutex<HashMap<String, Value>>,
    errors: Mutex<HashMap<String, Error>>,
    calls: Mutex<Vec<String>>,
    delay: Mutex<Option<Duration>>,
}

impl fmt::Debug for MockClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockClient")
            .field("calls", &self.calls())
            .finish_non_exhaustive()
    }
}

impl MockClient {
    /// Create an empty mock with no registered responses
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a response for every request of type `R`
    ///
    /// The value is stored as JSON and decoded back into `R::Output` on each
    /// dispatch, so the mock exercises the same decode step as the real
    /// client.
    pub fn mock_response<R>(&self, response: &R::Output) -> Result<()>
    where
        R: ApiRequest,
        R::Output: Serialize,
    {
        self.insert_response(R::KIND, response)
    }

    /// Register a response for every request hitting `path`
    pub fn mock_response_for_path(&self, path: impl Into<String>, response: &impl Serialize) -> Result<()> {
        self.insert_response(path.into(), response)
    }

    /// Register an error for every request of type `R`
    pub fn mock_error<R: ApiRequest>(&self, error: Error) {
        self.lock_errors().insert(R::KIND.to_string(), error);
    }

    /// Register an error for every request hitting `path`
    pub fn mock_error_for_path(&self, path: impl Into<String>, error: Error) {
        self.lock_errors().insert(path.into(), error);
    }

    /// Paths dispatched so far, in order; paginated calls are recorded as
    /// `path?page=N`
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Simulate network latency on every dispatch
    ///
    /// The sleep suspends only the calling task; concurrent dispatches are
    /// not serialized by it.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap_or_else(PoisonError::into_inner) = Some(delay);
    }

    /// Clear all registered responses, errors and the call log
    pub fn reset(&self) {
        self.lock_responses().clear();
        self.lock_errors().clear();
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn insert_response(&self, key: impl Into<String>, response: &impl Serialize) -> Result<()> {
        let value = serde_json::to_value(response).map_err(|e| Error::Decode(e.to_string()))?;
        self.lock_responses().insert(key.into(), value);
        Ok(())
    }

    fn lock_responses(&self) -> std::sync::MutexGuard<'_, HashMap<String, Value>> {
        self.responses.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_errors(&self) -> std::sync::MutexGuard<'_, HashMap<String, Error>> {
        self.errors.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, entry: String) {
        tracing::debug!("mock dispatch: {}", entry);
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }

    async fn simulate_latency(&self) {
        let delay = *self.delay.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    /// Error registered for `kind`, falling back to `path`
    fn lookup_error(&self, kind: &str, path: &str) -> Option<Error> {
        let errors = self.lock_errors();
        errors.get(kind).or_else(|| errors.get(path)).cloned()
    }

    /// Response registered for `kind`, falling back to `path`
    fn lookup_response(&self, kind: &str, path: &str) -> Option<Value> {
        let responses = self.lock_responses();
        responses.get(kind).or_else(|| responses.get(path)).cloned()
    }
}

#[async_trait]
impl Connector for MockClient {
    async fn send<R>(&self, request: &R) -> Result<R::Output>
    where
        R: ApiRequest,
    {
        let path = request.path();
        self.record(path.clone());
        self.simulate_latency().await;

        if let Some(error) = self.lookup_error(R::KIND, &path) {
            return Err(error);
        }
        if let Some(value) = self.lookup_response(R::KIND, &path) {
            return serde_json::from_value(value).map_err(|e| Error::Decode(e.to_string()));
        }

        Err(Error::Custom(format!(
            "no mock registered for request kind `{}` with path `{}`",
            R::KIND,
            path
        )))
    }

    async fn send_paginated<R>(&self, request: &R) -> Result<Page<R::Output>>
    where
        R: PaginatedRequest,
    {
        let path = request.path();
        self.record(format!("{}?page={}", path, request.page()));
        self.simulate_latency().await;

        if let Some(error) = self.lookup_error(R::KIND, &path) {
            return Err(error);
        }
        if let Some(value) = self.lookup_response(R::KIND, &path) {
            return serde_json::from_value(value).map_err(|e| Error::Decode(e.to_string()));
        }

        // Unlike the plain path, an unmocked paginated dispatch answers with
        // an empty envelope rather than failing.
        Ok(Page {
            items: Vec::new(),
            current_page: request.page(),
            total_pages: request.page(),
        })
    }
}
