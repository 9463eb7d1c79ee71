//! s3u-core: Core library for the s3u S3 CLI client
//!
//! This crate provides the core functionality for s3u, including:
//! - Path parsing and local/object-store path translation
//! - A bounded-concurrency job pool with cancellation
//! - Paginated listing
//! - Bulk upload, download, list and remove operations
//! - Configuration management
//!
//! This crate is designed to be independent of any specific S3 SDK;
//! the store is consumed through the [`ObjectStore`] trait.

pub mod config;
pub mod error;
pub mod lister;
pub mod ops;
pub mod path;
pub mod pool;
pub mod printer;
pub mod traits;

pub use config::{Config, ConfigManager, EndpointConfig, TimeoutConfig};
pub use error::{Error, Result};
pub use lister::{ListParams, Lister, list_objects};
pub use ops::{BulkOptions, CopyDirection, Operations, copy_direction};
pub use path::{ObjectPath, format_object_path, is_object_path, parse_object_path};
pub use pool::{Job, JobPool, OutputSender};
pub use printer::Printer;
pub use traits::{
    DeleteFailure, DeleteOutcome, ListPage, ListRequest, ObjectInfo, ObjectStore,
};
