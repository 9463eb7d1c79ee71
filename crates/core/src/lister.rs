//! Paginated listing
//!
//! [`Lister`] walks every page under a bucket and prefix. The continuation
//! cursor stays private; callers only ever see whole pages. Cancellation is
//! checked before each fetch and ends the listing quietly.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::traits::{ListPage, ListRequest, ObjectStore};

/// What to enumerate
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams {
    pub bucket: String,
    pub prefix: String,
    /// `Some("/")` for a one-level view, `None` for a flat namespace
    pub delimiter: Option<String>,
}

impl ListParams {
    /// Flat listing of everything under `prefix`
    pub fn flat(bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: prefix.into(),
            delimiter: None,
        }
    }

    /// One-level listing grouped on `/`
    pub fn one_level(bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: prefix.into(),
            delimiter: Some("/".to_string()),
        }
    }
}

/// Lazy sequence of listing pages
pub struct Lister {
    store: Arc<dyn ObjectStore>,
    params: ListParams,
    cancel: CancellationToken,
    page_size: Option<i32>,
    continuation_token: Option<String>,
    exhausted: bool,
}

impl Lister {
    pub fn new(store: Arc<dyn ObjectStore>, params: ListParams, cancel: CancellationToken) -> Self {
        Self {
            store,
            params,
            cancel,
            page_size: None,
            continuation_token: None,
            exhausted: false,
        }
    }

    /// Ask the store for at most `size` keys per page
    pub fn with_page_size(mut self, size: Option<i32>) -> Self {
        self.page_size = size;
        self
    }

    /// Fetch the next page
    ///
    /// Returns `Ok(None)` once the store reports no further pages or the
    /// token has been cancelled. A failed fetch ends the sequence.
    pub async fn next_page(&mut self) -> Result<Option<ListPage>> {
        if self.exhausted || self.cancel.is_cancelled() {
            return Ok(None);
        }

        let request = ListRequest {
            bucket: self.params.bucket.clone(),
            prefix: self.params.prefix.clone(),
            delimiter: self.params.delimiter.clone(),
            continuation_token: self.continuation_token.take(),
            max_keys: self.page_size,
        };

        let page = match self.store.list_objects_page(&request).await {
            Ok(page) => page,
            Err(e) => {
                self.exhausted = true;
                return Err(e);
            }
        };

        if page.is_truncated {
            tracing::debug!(
                bucket = %self.params.bucket,
                token = page.next_continuation_token.as_deref().unwrap_or_default(),
                "list pagination"
            );
            match &page.next_continuation_token {
                Some(token) => self.continuation_token = Some(token.clone()),
                None => {
                    tracing::warn!("truncated listing without continuation token, stopping");
                    self.exhausted = true;
                }
            }
        } else {
            self.exhausted = true;
        }

        Ok(Some(page))
    }
}

/// Invoke `on_page` once per page under `params`
pub async fn list_objects<F>(
    store: Arc<dyn ObjectStore>,
    cancel: &CancellationToken,
    params: ListParams,
    page_size: Option<i32>,
    mut on_page: F,
) -> Result<()>
where
    F: FnMut(ListPage) -> Result<()>,
{
    let mut lister = Lister::new(store, params, cancel.clone()).with_page_size(page_size);
    while let Some(page) = lister.next_page().await? {
        on_page(page)?;
    }
    Ok(())
}
