//! Request descriptors
//!
//! An [`ApiRequest`] is an immutable description of one API call: path,
//! method, query, body and headers, plus the expected response shape. The
//! dispatcher never mutates a descriptor, so one value can be sent any
//! number of times.

use std::collections::HashMap;
use std::fmt;

use serde::de::DeserializeOwned;
use url::Url;

use crate::error::Result;

/// HTTP method of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Method {
    /// GET
    #[default]
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// DELETE
    Delete,
    /// PATCH
    Patch,
    /// HEAD
    Head,
}

impl Method {
    /// Wire representation of the method
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
            Method::Head => "HEAD",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
            Method::Patch => reqwest::Method::PATCH,
            Method::Head => reqwest::Method::HEAD,
        }
    }
}

/// Blueprint for one API call
///
/// Only [`path`](ApiRequest::path), [`KIND`](ApiRequest::KIND) and the
/// response shape are mandatory; everything else defaults to a plain GET
/// with no query, body or extra headers.
pub trait ApiRequest: Send + Sync {
    /// Shape the response body decodes into
    type Output: DeserializeOwned;

    /// Stable identifier for this request type
    ///
    /// Used as the dispatch-log label and as the registration token for
    /// mocks, in place of runtime type-name lookups.
    const KIND: &'static str;

    /// Path relative to the client's base URL, e.g. `"users/42"`
    fn path(&self) -> String;

    /// HTTP method, GET unless overridden
    fn method(&self) -> Method {
        Method::default()
    }

    /// Query parameters, appended in order to the base URL's own query
    fn query(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    /// Request body, attached verbatim (no content-type inference)
    fn body(&self) -> Option<Vec<u8>> {
        None
    }

    /// Request-specific headers; these win over the client's global headers
    fn headers(&self) -> Option<HashMap<String, String>> {
        None
    }

    /// Build the final URL from the configured base URL
    ///
    /// Appends `"/" + path` to the base URL's existing path component, so a
    /// base of `…/v1` and a path of `users/1` yields `…/v1/users/1`. Query
    /// parameters are appended to any query the base URL already carries;
    /// an empty list leaves the query untouched.
    fn url(&self, base_url: &str) -> Result<Url> {
        let mut url = Url::parse(base_url)?;

        let base_path = url.path();
        let joined = if base_path.ends_with('/') {
            format!("{}{}", base_path, self.path())
        } else {
            format!("{}/{}", base_path, self.path())
        };
        url.set_path(&joined);

        let query = self.query();
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in &query {
                pairs.append_pair(name, value);
            }
        }

        Ok(url)
    }
}

/// A request whose response arrives one page at a time
///
/// Dispatched through [`Connector::send_paginated`](crate::Connector::send_paginated),
/// which forces `page` and `pageSize` query parameters and decodes the
/// [`Page`](crate::Page) envelope.
pub trait PaginatedRequest: ApiRequest {
    /// Zero-based page index to fetch
    fn page(&self) -> u32;

    /// Number of items per page
    fn page_size(&self) -> u32;
}
