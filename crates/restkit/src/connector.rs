//! Dispatch contract
//!
//! [`Connector`] is the seam between callers and whatever executes their
//! requests. [`ApiClient`](crate::ApiClient) implements it over a real
//! transport; test doubles implement it over an in-memory table. Code that
//! takes a generic `Connector` can be exercised against either.

use std::fmt;

use async_trait::async_trait;

use crate::error::Result;
use crate::pagination::{Page, PageRequest};
use crate::request::{ApiRequest, PaginatedRequest};

/// Capability to turn a request descriptor into a typed result or failure
#[async_trait]
pub trait Connector: fmt::Debug + Send + Sync {
    /// Dispatch a request and decode the response into its expected shape
    async fn send<R>(&self, request: &R) -> Result<R::Output>
    where
        R: ApiRequest;

    /// Dispatch a paginated request, forcing `page`/`pageSize` query
    /// parameters and decoding the [`Page`] envelope
    ///
    /// The pagination parameters are authoritative: any query parameters the
    /// descriptor itself declares are discarded for this call.
    async fn send_paginated<R>(&self, request: &R) -> Result<Page<R::Output>>
    where
        R: PaginatedRequest,
    {
        self.send(&PageRequest::new(request)).await
    }
}
