//! ObjectStore trait definition
//!
//! This trait is the narrow interface the bulk operations consume.
//! It keeps the drivers decoupled from the specific S3 SDK implementation.

use std::path::Path;

use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::path::ObjectPath;

/// Metadata for an object or a common prefix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectInfo {
    /// Object key or common prefix
    pub key: String,

    /// Size in bytes (None for prefixes)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<i64>,

    /// Human-readable size
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_human: Option<String>,

    /// Last modified timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<Timestamp>,

    /// ETag (usually MD5 for single-part uploads)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    /// Content type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// Whether this is a common prefix (pseudo-directory)
    pub is_dir: bool,
}

impl ObjectInfo {
    /// Create a new ObjectInfo for an object
    pub fn file(key: impl Into<String>, size: i64) -> Self {
        Self {
            key: key.into(),
            size_bytes: Some(size),
            size_human: Some(humansize::format_size(size.max(0) as u64, humansize::BINARY)),
            last_modified: None,
            etag: None,
            content_type: None,
            is_dir: false,
        }
    }

    /// Create a new ObjectInfo for a common prefix
    pub fn dir(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            size_bytes: None,
            size_human: None,
            last_modified: None,
            etag: None,
            content_type: None,
            is_dir: true,
        }
    }

    /// Set the last modified timestamp
    pub fn modified(mut self, timestamp: Timestamp) -> Self {
        self.last_modified = Some(timestamp);
        self
    }
}

impl std::fmt::Display for ObjectInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let date = self
            .last_modified
            .map(|d| d.strftime("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "                   ".to_string());

        if self.is_dir {
            write!(f, "[{date}] {:>10} {}", "PRE", self.key)
        } else {
            let size = self.size_human.as_deref().unwrap_or("0 B");
            write!(f, "[{date}] {size:>10} {}", self.key)
        }
    }
}

/// One listing request against a bucket
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListRequest {
    /// Bucket to list
    pub bucket: String,

    /// Prefix to filter by
    pub prefix: String,

    /// Delimiter for grouping (usually "/")
    pub delimiter: Option<String>,

    /// Continuation token for pagination
    pub continuation_token: Option<String>,

    /// Maximum number of keys to return per request
    pub max_keys: Option<i32>,
}

/// One page of listing results
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListPage {
    /// Objects directly matched by the request
    pub entries: Vec<ObjectInfo>,

    /// Common prefixes, only populated when a delimiter was supplied
    pub common_prefixes: Vec<String>,

    /// Whether more pages are available
    pub is_truncated: bool,

    /// Cursor for the next page
    pub next_continuation_token: Option<String>,
}

/// A key the store refused to delete
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteFailure {
    pub key: String,
    pub message: String,
}

/// Outcome of one multi-key delete call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteOutcome {
    /// Keys the store reports as deleted
    pub deleted: Vec<String>,

    /// Per-key failures; these never fail the whole call
    pub errors: Vec<DeleteFailure>,
}

/// Trait for S3-compatible storage operations
///
/// This trait is implemented by the S3 adapter and can be mocked for testing.
/// Implementations must be safe to share read-only between workers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload a local file, streaming it from disk
    async fn put_object(&self, path: &ObjectPath, source: &Path) -> Result<ObjectInfo>;

    /// Download an object into `dest`, returning the number of bytes written
    ///
    /// The body is fully drained before this returns.
    async fn get_object(&self, path: &ObjectPath, dest: &Path) -> Result<u64>;

    /// Get object metadata
    async fn head_object(&self, path: &ObjectPath) -> Result<ObjectInfo>;

    /// Fetch a single listing page
    async fn list_objects_page(&self, request: &ListRequest) -> Result<ListPage>;

    /// Delete several keys of one bucket in a single call
    async fn delete_objects(&self, bucket: &str, keys: Vec<String>) -> Result<DeleteOutcome>;
}
