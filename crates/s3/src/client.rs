//! S3 client implementation
//!
//! Wraps aws-sdk-s3 and implements the ObjectStore trait from s3u-core.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_smithy_types::error::display::DisplayErrorContext;
use tokio::io::AsyncWriteExt;

use s3u_core::{
    DeleteFailure, DeleteOutcome, EndpointConfig, Error, ListPage, ListRequest, ObjectInfo,
    ObjectPath, ObjectStore, Result,
};

/// Region used when a custom endpoint is configured without one
const FALLBACK_REGION: &str = "us-east-1";

/// S3 client wrapper
pub struct S3Client {
    inner: aws_sdk_s3::Client,
}

impl S3Client {
    /// Create a new S3 client from the endpoint configuration
    ///
    /// Anything left unset is resolved through the AWS default chain
    /// (environment, shared config files, instance metadata).
    pub async fn new(endpoint: &EndpointConfig) -> Result<Self> {
        endpoint.validate()?;

        let timeout = endpoint.timeout_config();
        let mut timeouts = aws_config::timeout::TimeoutConfig::builder()
            .connect_timeout(Duration::from_millis(timeout.connect_ms));
        if let Some(ms) = timeout.operation_ms {
            timeouts = timeouts.operation_timeout(Duration::from_millis(ms));
        }

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .timeout_config(timeouts.build());

        let region = endpoint
            .region
            .clone()
            .or_else(|| endpoint.url.as_ref().map(|_| FALLBACK_REGION.to_string()));
        if let Some(region) = region {
            loader = loader.region(aws_config::Region::new(region));
        }

        if let Some(url) = &endpoint.url {
            loader = loader.endpoint_url(url);
        }

        if let (Some(access_key), Some(secret_key)) = (&endpoint.access_key, &endpoint.secret_key) {
            let credentials = aws_credential_types::Credentials::new(
                access_key,
                secret_key,
                None, // session token
                None, // expiry
                "s3u-static-credentials",
            );
            loader = loader.credentials_provider(credentials);
        }

        let config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&config)
            .force_path_style(endpoint.path_style())
            .build();

        tracing::debug!(
            endpoint = endpoint.url.as_deref().unwrap_or("default"),
            path_style = endpoint.path_style(),
            "created S3 client"
        );

        Ok(Self {
            inner: aws_sdk_s3::Client::from_conf(s3_config),
        })
    }
}

/// Map an SDK failure to the crate error, treating missing keys as NotFound
fn classify(message: String, path: &ObjectPath) -> Error {
    if message.contains("NotFound") || message.contains("NoSuchKey") {
        Error::NotFound(path.to_string())
    } else {
        Error::Network(message)
    }
}

fn sdk_message<E: std::error::Error>(err: E) -> String {
    DisplayErrorContext(err).to_string()
}

fn to_timestamp(value: &aws_smithy_types::DateTime) -> Option<jiff::Timestamp> {
    jiff::Timestamp::new(value.secs(), value.subsec_nanos() as i32).ok()
}

/// Copy `reader` into a new file at `dest`, returning the bytes written
///
/// The file is removed again if reading or writing fails part way.
async fn save_to_file<R>(mut reader: R, dest: &Path) -> Result<u64>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut file = tokio::fs::File::create(dest).await?;
    let copied = async {
        let written = tokio::io::copy(&mut reader, &mut file).await?;
        file.flush().await?;
        Ok::<_, std::io::Error>(written)
    }
    .await;

    match copied {
        Ok(written) => Ok(written),
        Err(e) => {
            drop(file);
            if let Err(cleanup) = tokio::fs::remove_file(dest).await {
                tracing::debug!(path = %dest.display(), "could not remove partial file: {cleanup}");
            }
            Err(e.into())
        }
    }
}

fn failure_message(code: Option<&str>, message: Option<&str>) -> String {
    match (code, message) {
        (Some(code), Some(message)) => format!("{code}: {message}"),
        (Some(code), None) => code.to_string(),
        (None, Some(message)) => message.to_string(),
        (None, None) => "unknown error".to_string(),
    }
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn put_object(&self, path: &ObjectPath, source: &Path) -> Result<ObjectInfo> {
        let size = tokio::fs::metadata(source).await?.len() as i64;
        let body = ByteStream::from_path(source)
            .await
            .map_err(|e| Error::General(format!("{}: {e}", source.display())))?;
        let content_type = mime_guess::from_path(source).first_or_octet_stream();

        let response = self
            .inner
            .put_object()
            .bucket(&path.bucket)
            .key(&path.key)
            .content_type(content_type.essence_str())
            .body(body)
            .send()
            .await
            .map_err(|e| Error::Network(sdk_message(e)))?;

        let mut info = ObjectInfo::file(&path.key, size).modified(jiff::Timestamp::now());
        if let Some(etag) = response.e_tag() {
            info.etag = Some(etag.trim_matches('"').to_string());
        }
        info.content_type = Some(content_type.essence_str().to_string());

        Ok(info)
    }

    async fn get_object(&self, path: &ObjectPath, dest: &Path) -> Result<u64> {
        let response = self
            .inner
            .get_object()
            .bucket(&path.bucket)
            .key(&path.key)
            .send()
            .await
            .map_err(|e| classify(sdk_message(e), path))?;

        let body = response.body.into_async_read();
        tokio::pin!(body);
        save_to_file(body, dest).await
    }

    async fn head_object(&self, path: &ObjectPath) -> Result<ObjectInfo> {
        let response = self
            .inner
            .head_object()
            .bucket(&path.bucket)
            .key(&path.key)
            .send()
            .await
            .map_err(|e| classify(sdk_message(e), path))?;

        let size = response.content_length().unwrap_or(0);
        let mut info = ObjectInfo::file(&path.key, size);

        if let Some(modified) = response.last_modified() {
            info.last_modified = to_timestamp(modified);
        }

        if let Some(etag) = response.e_tag() {
            info.etag = Some(etag.trim_matches('"').to_string());
        }

        if let Some(ct) = response.content_type() {
            info.content_type = Some(ct.to_string());
        }

        Ok(info)
    }

    async fn list_objects_page(&self, request: &ListRequest) -> Result<ListPage> {
        let mut call = self
            .inner
            .list_objects_v2()
            .bucket(&request.bucket)
            .prefix(&request.prefix);

        if let Some(delimiter) = &request.delimiter {
            call = call.delimiter(delimiter);
        }

        if let Some(max) = request.max_keys {
            call = call.max_keys(max);
        }

        if let Some(token) = &request.continuation_token {
            call = call.continuation_token(token);
        }

        let response = call.send().await.map_err(|e| {
            let message = sdk_message(e);
            if message.contains("NoSuchBucket") {
                Error::NotFound(format!("Bucket not found: {}", request.bucket))
            } else {
                Error::Network(message)
            }
        })?;

        let common_prefixes = response
            .common_prefixes()
            .iter()
            .filter_map(|p| p.prefix().map(str::to_string))
            .collect();

        let entries = response
            .contents()
            .iter()
            .map(|object| {
                let mut info =
                    ObjectInfo::file(object.key().unwrap_or_default(), object.size().unwrap_or(0));
                info.last_modified = object.last_modified().and_then(to_timestamp);
                info.etag = object.e_tag().map(|etag| etag.trim_matches('"').to_string());
                info
            })
            .collect();

        Ok(ListPage {
            entries,
            common_prefixes,
            is_truncated: response.is_truncated().unwrap_or(false),
            next_continuation_token: response.next_continuation_token().map(str::to_string),
        })
    }

    async fn delete_objects(&self, bucket: &str, keys: Vec<String>) -> Result<DeleteOutcome> {
        use aws_sdk_s3::types::{Delete, ObjectIdentifier};

        if keys.is_empty() {
            return Ok(DeleteOutcome::default());
        }

        let objects = keys
            .iter()
            .map(|k| ObjectIdentifier::builder().key(k).build())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::General(e.to_string()))?;

        let delete = Delete::builder()
            .set_objects(Some(objects))
            .build()
            .map_err(|e| Error::General(e.to_string()))?;

        let response = self
            .inner
            .delete_objects()
            .bucket(bucket)
            .delete(delete)
            .send()
            .await
            .map_err(|e| Error::Network(sdk_message(e)))?;

        let deleted = response
            .deleted()
            .iter()
            .filter_map(|d| d.key().map(str::to_string))
            .collect();

        let errors = response
            .errors()
            .iter()
            .map(|e| DeleteFailure {
                key: e.key().unwrap_or_default().to_string(),
                message: failure_message(e.code(), e.message()),
            })
            .collect();

        Ok(DeleteOutcome { deleted, errors })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_not_found() {
        let path = ObjectPath::new("bucket", "missing.txt");
        let err = classify("service error: NoSuchKey".into(), &path);
        assert!(matches!(err, Error::NotFound(ref p) if p == "s3://bucket/missing.txt"));

        let err = classify("dispatch failure: connection refused".into(), &path);
        assert!(matches!(err, Error::Network(_)));
    }

    #[test]
    fn test_to_timestamp() {
        let value = aws_smithy_types::DateTime::from_secs_and_nanos(1_709_288_430, 500);
        let ts = to_timestamp(&value).unwrap();
        assert_eq!(ts.as_second(), 1_709_288_430);
        assert_eq!(ts.subsec_nanosecond(), 500);
    }

    #[test]
    fn test_failure_message() {
        assert_eq!(
            failure_message(Some("AccessDenied"), Some("Access Denied")),
            "AccessDenied: Access Denied"
        );
        assert_eq!(failure_message(Some("AccessDenied"), None), "AccessDenied");
        assert_eq!(failure_message(None, None), "unknown error");
    }

    /// Yields its bytes, then fails like a dropped connection
    struct BrokenBody {
        data: &'static [u8],
    }

    impl tokio::io::AsyncRead for BrokenBody {
        fn poll_read(
            mut self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
            buf: &mut tokio::io::ReadBuf<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            if self.data.is_empty() {
                return std::task::Poll::Ready(Err(std::io::Error::other("connection reset")));
            }
            buf.put_slice(self.data);
            self.data = &[];
            std::task::Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_save_to_file_writes_body() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("object.bin");
        let written = save_to_file(&b"hello world"[..], &dest).await.unwrap();
        assert_eq!(written, 11);
        assert_eq!(std::fs::read(&dest).unwrap(), b"hello world");
    }

    #[tokio::test]
    async fn test_save_to_file_removes_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("object.bin");
        let err = save_to_file(BrokenBody { data: b"partial" }, &dest)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_save_to_file_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("missing").join("object.bin");
        assert!(matches!(
            save_to_file(&b"x"[..], &dest).await,
            Err(Error::Io(_))
        ));
    }

    #[tokio::test]
    async fn test_new_rejects_unpaired_credentials() {
        let endpoint = EndpointConfig {
            url: Some("http://localhost:9000".into()),
            access_key: Some("key".into()),
            ..Default::default()
        };
        assert!(matches!(
            S3Client::new(&endpoint).await,
            Err(Error::Config(_))
        ));
    }
}
