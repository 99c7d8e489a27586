//! Pagination envelope and query override
//!
//! APIs that page their results wrap each page in an envelope carrying the
//! items plus `currentPage`/`totalPages` metadata. [`PageRequest`] adapts a
//! [`PaginatedRequest`] into a plain [`ApiRequest`] whose query is exactly
//! the `page`/`pageSize` pair; everything else is forwarded unchanged.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::Result;
use crate::request::{ApiRequest, Method, PaginatedRequest};

/// One page of a paginated response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items on this page, in server order
    pub items: Vec<T>,
    /// Index of this page
    pub current_page: u32,
    /// Total number of pages available
    pub total_pages: u32,
}

impl<T> Page<T> {
    /// Index of the next page, or `None` on (or past) the last page
    ///
    /// `total_pages == 0` means there is never a next page, whatever
    /// `current_page` claims.
    pub fn next_page(&self) -> Option<u32> {
        if self.current_page < self.total_pages {
            Some(self.current_page + 1)
        } else {
            None
        }
    }
}

/// Adapter that forces pagination query parameters onto a wrapped request
///
/// The wrapped descriptor's own query parameters are deliberately discarded:
/// `page` and `pageSize` are authoritative. Note the asymmetry with
/// [`ApiRequest::url`], which appends — here the final URL's query is
/// replaced outright, including anything the base URL carried.
pub(crate) struct PageRequest<'a, R> {
    inner: &'a R,
}

impl<'a, R: PaginatedRequest> PageRequest<'a, R> {
    pub(crate) fn new(inner: &'a R) -> Self {
        Self { inner }
    }
}

impl<R: PaginatedRequest> ApiRequest for PageRequest<'_, R> {
    type Output = Page<R::Output>;

    const KIND: &'static str = R::KIND;

    fn path(&self) -> String {
        self.inner.path()
    }

    fn method(&self) -> Method {
        self.inner.method()
    }

    fn query(&self) -> Vec<(String, String)> {
        vec![
            ("page".to_string(), self.inner.page().to_string()),
            ("pageSize".to_string(), self.inner.page_size().to_string()),
        ]
    }

    fn body(&self) -> Option<Vec<u8>> {
        self.inner.body()
    }

    fn headers(&self) -> Option<HashMap<String, String>> {
        self.inner.headers()
    }

    fn url(&self, base_url: &str) -> Result<Url> {
        let mut url = Url::parse(base_url)?;

        let base_path = url.path();
        let joined = if base_path.ends_with('/') {
            format!("{}{}", base_path, self.path())
        } else {
            format!("{}/{}", base_path, self.path())
        };
        url.set_path(&joined);

        // The override is unconditional: whatever query the base URL or the
        // wrapped request carried is dropped in favour of the page pair.
        url.set_query(None);
        {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in self.query() {
                pairs.append_pair(&name, &value);
            }
        }

        Ok(url)
    }
}
