//! Error types for s3u-core
//!
//! Provides a unified error type that can be converted to appropriate exit codes.

use thiserror::Error;

/// Result type alias for s3u-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for s3u-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// The path does not carry the `s3://` scheme
    #[error("Not an S3 path: {0}")]
    NotAnObjectPath(String),

    /// No bucket could be resolved after the scheme
    #[error("No bucket found in path: {0}")]
    NoBucketFound(String),

    /// Destination names a directory that does not exist
    #[error("Directory does not exist: {0}")]
    DirectoryExpected(String),

    /// Invalid path format
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Directory walk error
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Transport or API error from the object store
    #[error("Network error: {0}")]
    Network(String),

    /// Operation not supported
    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),

    /// General error
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Get the appropriate exit code for this error
    pub const fn exit_code(&self) -> i32 {
        match self {
            Error::NotAnObjectPath(_)
            | Error::NoBucketFound(_)
            | Error::DirectoryExpected(_)
            | Error::InvalidPath(_) => 2, // UsageError
            Error::Config(_) | Error::TomlParse(_) | Error::InvalidUrl(_) => 2, // UsageError
            Error::Network(_) => 3,            // NetworkError
            Error::NotFound(_) => 5,           // NotFound
            Error::UnsupportedFeature(_) => 7, // UnsupportedFeature
            _ => 1,                            // GeneralError
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_exit_codes() {
        assert_eq!(Error::NotAnObjectPath("test".into()).exit_code(), 2);
        assert_eq!(Error::NoBucketFound("test".into()).exit_code(), 2);
        assert_eq!(Error::DirectoryExpected("test".into()).exit_code(), 2);
        assert_eq!(Error::InvalidPath("test".into()).exit_code(), 2);
        assert_eq!(Error::Config("test".into()).exit_code(), 2);
        assert_eq!(Error::Network("test".into()).exit_code(), 3);
        assert_eq!(Error::NotFound("test".into()).exit_code(), 5);
        assert_eq!(Error::UnsupportedFeature("test".into()).exit_code(), 7);
        assert_eq!(Error::General("test".into()).exit_code(), 1);
    }

    #[test]
    fn test_error_display() {
        let err = Error::NotAnObjectPath("/bad/path".into());
        assert_eq!(err.to_string(), "Not an S3 path: /bad/path");

        let err = Error::NoBucketFound("s3://".into());
        assert_eq!(err.to_string(), "No bucket found in path: s3://");
    }
}
