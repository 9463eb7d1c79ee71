//! Bulk operations
//!
//! [`Operations`] is what the command layer calls. Each operation turns one
//! request into either a single store call or many independent jobs fed
//! through a [`JobPool`](crate::pool::JobPool).

use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::path::is_object_path;
use crate::printer::Printer;
use crate::traits::ObjectStore;

mod download;
mod list;
mod remove;
mod upload;

pub use remove::{BucketKeyGroup, MAX_DELETE_BATCH, group_by_bucket, split_globs_and_regulars};

/// Default number of jobs running at once
pub const DEFAULT_PARALLEL: usize = 10;

/// Default listing page size
pub const DEFAULT_PAGE_SIZE: i32 = 1000;

/// Tuning for bulk operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkOptions {
    /// Maximum number of jobs executing concurrently
    pub parallel: usize,
    /// Download every object directly into the destination directory
    pub flatten: bool,
    /// Keys requested per listing page
    pub page_size: Option<i32>,
}

impl Default for BulkOptions {
    fn default() -> Self {
        Self {
            parallel: DEFAULT_PARALLEL,
            flatten: false,
            page_size: Some(DEFAULT_PAGE_SIZE),
        }
    }
}

/// Direction of a copy, decided by which side carries the `s3://` scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyDirection {
    Upload,
    Download,
}

/// Classify a copy request
///
/// Store-to-store and local-to-local copies are rejected.
pub fn copy_direction(source: &str, destination: &str) -> Result<CopyDirection> {
    match (is_object_path(source), is_object_path(destination)) {
        (false, true) => Ok(CopyDirection::Upload),
        (true, false) => Ok(CopyDirection::Download),
        (true, true) => Err(Error::UnsupportedFeature(
            "copy between two s3 paths is not supported".into(),
        )),
        (false, false) => Err(Error::UnsupportedFeature(
            "local to local copy is not supported".into(),
        )),
    }
}

/// Entry point for copy, list and remove
pub struct Operations {
    store: Arc<dyn ObjectStore>,
    printer: Arc<dyn Printer>,
    options: BulkOptions,
}

impl Operations {
    pub fn new(store: Arc<dyn ObjectStore>, printer: Arc<dyn Printer>, options: BulkOptions) -> Self {
        Self {
            store,
            printer,
            options,
        }
    }

    pub fn options(&self) -> &BulkOptions {
        &self.options
    }

    /// Copy between the local filesystem and the object store
    pub async fn copy(&self, source: &str, destination: &str) -> Result<()> {
        match copy_direction(source, destination)? {
            CopyDirection::Upload => self.upload(Path::new(source), destination).await,
            CopyDirection::Download => self.download(source, Path::new(destination)).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_direction() {
        assert_eq!(
            copy_direction("/tmp/test.txt", "s3://bucket/").unwrap(),
            CopyDirection::Upload
        );
        assert_eq!(
            copy_direction("s3://bucket/", "/tmp/test.txt").unwrap(),
            CopyDirection::Download
        );
    }

    #[test]
    fn test_copy_direction_unsupported() {
        let err = copy_direction("s3://a/x", "s3://b/y").unwrap_err();
        assert!(matches!(err, Error::UnsupportedFeature(_)));

        let err = copy_direction("/tmp/foo.txt", "/tmp/bar.txt").unwrap_err();
        assert!(matches!(err, Error::UnsupportedFeature(_)));
    }

    #[test]
    fn test_bulk_options_default() {
        let options = BulkOptions::default();
        assert_eq!(options.parallel, 10);
        assert!(!options.flatten);
        assert_eq!(options.page_size, Some(1000));
    }
}
