//! Path parsing and translation
//!
//! Object store paths have the format `s3://bucket[/key]`. Anything without the
//! scheme is a local path. The helpers here map between the two namespaces
//! during bulk transfers and never touch the filesystem.

use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, Result};

/// Scheme prefix that marks an object store path
pub const SCHEME: &str = "s3://";

/// A parsed object store location
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectPath {
    /// Bucket name
    pub bucket: String,
    /// Object key (empty for bucket root)
    pub key: String,
}

impl ObjectPath {
    /// Create a new ObjectPath
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Whether the key selects a prefix rather than a single object
    pub fn is_dir(&self) -> bool {
        self.key.is_empty() || self.key.ends_with('/')
    }

    /// Same bucket, different key
    pub fn with_key(&self, key: impl Into<String>) -> Self {
        Self::new(self.bucket.clone(), key)
    }
}

impl std::fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&format_object_path(&self.bucket, &self.key))
    }
}

impl FromStr for ObjectPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_object_path(s)
    }
}

/// Check whether a string carries the object store scheme
pub fn is_object_path(path: &str) -> bool {
    path.starts_with(SCHEME)
}

/// Parse `s3://bucket/key` into bucket and key
///
/// The slash terminating the bucket name is mandatory; `s3://bucket` is
/// rejected the same way as `s3://` and `s3:///`.
pub fn parse_object_path(path: &str) -> Result<ObjectPath> {
    let rest = path
        .strip_prefix(SCHEME)
        .ok_or_else(|| Error::NotAnObjectPath(path.to_string()))?;

    match rest.split_once('/') {
        Some((bucket, key)) if !bucket.is_empty() => Ok(ObjectPath::new(bucket, key)),
        _ => Err(Error::NoBucketFound(path.to_string())),
    }
}

/// Format a bucket and key as `s3://bucket/key`
pub fn format_object_path(bucket: &str, key: &str) -> String {
    format!("{SCHEME}{bucket}/{key}")
}

/// Map a local file found under `local_root` to its key under `dest_prefix`
///
/// `separator` is the separator used by `entry_path`, so Windows and Unix style
/// inputs translate identically regardless of the host.
pub fn derive_destination_key(
    local_root: &str,
    dest_prefix: &str,
    entry_path: &str,
    separator: char,
) -> String {
    let relative = entry_path.strip_prefix(local_root).unwrap_or(entry_path);
    let relative = if separator == '/' {
        relative.to_string()
    } else {
        relative.replace(separator, "/")
    };
    let relative = relative.trim_start_matches('/');

    if dest_prefix.is_empty() || dest_prefix.ends_with('/') {
        format!("{dest_prefix}{relative}")
    } else {
        format!("{dest_prefix}/{relative}")
    }
}

/// Map a listed key to a local path under `local_root`, keeping the
/// sub-directories below `key_prefix`
///
/// Every segment must be a plain file name, so a key such as
/// `prefix/../../x` cannot land outside `local_root`.
pub fn derive_local_destination(
    key_prefix: &str,
    full_key: &str,
    local_root: &Path,
) -> Result<PathBuf> {
    let relative = full_key.strip_prefix(key_prefix).unwrap_or(full_key);
    let mut path = local_root.to_path_buf();
    for segment in relative.split('/').filter(|segment| !segment.is_empty()) {
        path.push(local_name(segment, full_key)?);
    }
    Ok(path)
}

/// Last segment of `key` as a local file name
pub fn local_file_name(key: &str) -> Result<&str> {
    local_name(last_segment(key), key)
}

fn local_name<'a>(segment: &'a str, key: &str) -> Result<&'a str> {
    let mut components = Path::new(segment).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(segment),
        _ => Err(Error::InvalidPath(format!("key is not a safe local path: {key}"))),
    }
}

/// Last `/`-separated segment of a key, or the whole key
pub fn last_segment(key: &str) -> &str {
    match key.rfind('/') {
        Some(idx) => &key[idx + 1..],
        None => key,
    }
}

/// Append `name` to a key that addresses a "directory" (empty or trailing `/`)
pub fn append_base_name(key: &str, name: &str) -> String {
    if key.is_empty() || key.ends_with('/') {
        format!("{key}{name}")
    } else {
        key.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_object_path() {
        let path = parse_object_path("s3://mybucket/mykey").unwrap();
        assert_eq!(path.bucket, "mybucket");
        assert_eq!(path.key, "mykey");
        assert!(!path.is_dir());
    }

    #[test]
    fn test_parse_bucket_root() {
        let path = parse_object_path("s3://mybucket/").unwrap();
        assert_eq!(path.bucket, "mybucket");
        assert_eq!(path.key, "");
        assert!(path.is_dir());
    }

    #[test]
    fn test_parse_nested_key() {
        let path: ObjectPath = "s3://b/a/b/c.txt".parse().unwrap();
        assert_eq!(path.bucket, "b");
        assert_eq!(path.key, "a/b/c.txt");
    }

    #[test]
    fn test_parse_round_trip() {
        for input in ["s3://b/k", "s3://bucket/dir/file.txt", "s3://bucket/dir/"] {
            let path = parse_object_path(input).unwrap();
            assert_eq!(format_object_path(&path.bucket, &path.key), input);
            assert_eq!(path.to_string(), input);
        }
    }

    #[test]
    fn test_parse_not_object_path() {
        let err = parse_object_path("/local/path").unwrap_err();
        assert!(matches!(err, Error::NotAnObjectPath(_)));
    }

    #[test]
    fn test_parse_no_bucket() {
        for input in ["s3://", "s3:///", "s3://mybucket"] {
            let err = parse_object_path(input).unwrap_err();
            assert!(matches!(err, Error::NoBucketFound(_)), "{input}");
        }
    }

    #[test]
    fn test_derive_destination_key() {
        let cases = [
            ("outputs", "dest", "outputs/1.txt", '/'),
            ("outputs/", "dest", "outputs/1.txt", '/'),
            ("outputs", "dest/", "outputs/1.txt", '/'),
            ("outputs", "dest", "outputs\\1.txt", '\\'),
            ("outputs\\", "dest", "outputs\\1.txt", '\\'),
        ];
        for (root, prefix, entry, sep) in cases {
            assert_eq!(
                derive_destination_key(root, prefix, entry, sep),
                "dest/1.txt",
                "{root} {prefix} {entry}"
            );
        }
    }

    #[test]
    fn test_derive_destination_key_separator_agnostic() {
        let unix = derive_destination_key("/data/in", "out", "/data/in/sub/deep/f.bin", '/');
        let windows =
            derive_destination_key("C:\\data\\in", "out", "C:\\data\\in\\sub\\deep\\f.bin", '\\');
        assert_eq!(unix, "out/sub/deep/f.bin");
        assert_eq!(unix, windows);
    }

    #[test]
    fn test_derive_destination_key_bucket_root() {
        assert_eq!(derive_destination_key("dir", "", "dir/a.txt", '/'), "a.txt");
    }

    #[test]
    fn test_derive_local_destination() {
        let expected = Path::new("/out").join("a").join("b").join("c.txt");
        for prefix in ["prefix", "prefix/"] {
            let got =
                derive_local_destination(prefix, "prefix/a/b/c.txt", Path::new("/out")).unwrap();
            assert_eq!(got, expected, "{prefix}");
        }
    }

    #[test]
    fn test_derive_local_destination_direct_child() {
        let got = derive_local_destination("prefix", "prefix/test.txt", Path::new("/tmp")).unwrap();
        assert_eq!(got, Path::new("/tmp").join("test.txt"));
    }

    #[test]
    fn test_derive_local_destination_rejects_traversal() {
        for key in ["logs/../../escaped.txt", "logs/a/../b.txt", "logs/./a.txt", "logs/.."] {
            let err = derive_local_destination("logs/", key, Path::new("/out")).unwrap_err();
            assert!(matches!(err, Error::InvalidPath(_)), "{key}");
        }
    }

    #[test]
    fn test_local_file_name() {
        assert_eq!(local_file_name("a/b/report.csv").unwrap(), "report.csv");
        assert_eq!(local_file_name("..a").unwrap(), "..a");
        assert!(matches!(local_file_name("a/.."), Err(Error::InvalidPath(_))));
        assert!(matches!(local_file_name("dir/"), Err(Error::InvalidPath(_))));
    }

    #[test]
    fn test_last_segment() {
        assert_eq!(last_segment("test.txt"), "test.txt");
        assert_eq!(last_segment("foo/bar/test.txt"), "test.txt");
        assert_eq!(last_segment("foo/"), "");
    }

    #[test]
    fn test_append_base_name() {
        assert_eq!(append_base_name("", "a.txt"), "a.txt");
        assert_eq!(append_base_name("dir/", "a.txt"), "dir/a.txt");
        assert_eq!(append_base_name("exact.txt", "a.txt"), "exact.txt");
    }
}
