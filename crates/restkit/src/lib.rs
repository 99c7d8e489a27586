//! Typed HTTP request dispatch
//!
//! A thin convenience layer over HTTP: describe an API call once as an
//! [`ApiRequest`], then hand it to an [`ApiClient`] which builds the URL,
//! merges headers, invokes the transport, classifies the status code and
//! decodes the response into the request's expected shape. Paginated
//! endpoints go through [`Connector::send_paginated`], which forces
//! `page`/`pageSize` query parameters and decodes the [`Page`] envelope.
//!
//! There is no retry, caching or timeout policy in this layer; those belong
//! to the [`Transport`] underneath or the caller above.
//!
//! # Example
//!
//! ```no_run
//! use restkit::{ApiClient, ApiRequest, Connector, Result};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! struct GetUser {
//!     id: u64,
//! }
//!
//! impl ApiRequest for GetUser {
//!     type Output = User;
//!     const KIND: &'static str = "get_user";
//!
//!     fn path(&self) -> String {
//!         format!("users/{}", self.id)
//!     }
//! }
//!
//! async fn example() -> Result<User> {
//!     let client = ApiClient::builder()
//!         .base_url("https://api.example.com/v1")
//!         .global_header("Authorization", "Bearer …")
//!         .build();
//!     client.send(&GetUser { id: 42 }).await
//! }
//! ```

mod client;
mod connector;
mod diagnostics;
mod error;
mod nonce;
mod pagination;
mod request;
mod transport;

pub use client::{ApiClient, ApiClientBuilder};
pub use connector::Connector;
pub use diagnostics::{curl_command, CurlSink, DiagnosticSink};
pub use error::{Error, Result};
pub use nonce::random_string;
pub use pagination::Page;
pub use request::{ApiRequest, Method, PaginatedRequest};
pub use transport::{ReqwestTransport, Transport, TransportRequest, TransportResponse};
