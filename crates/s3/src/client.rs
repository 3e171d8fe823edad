//! S3 client implementation
//!
//! Downloads stream the GetObject body chunk by chunk; uploads cut the
//! incoming pipe into parts and drive a multipart upload, falling back to a
//! single PutObject when everything fits in one part.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use ferry_core::{
    Backend, ByteSource, Error, Result, RetryPolicy, base_name, is_transient, read_chunk,
    relativize, with_retry,
};

use crate::path::S3Path;

/// Multipart tuning, fed from the CLI flags.
#[derive(Debug, Clone)]
pub struct S3Options {
    /// Size in bytes of each multipart part.
    pub part_size: u64,
    /// Maximum number of parts per upload.
    pub max_upload_parts: usize,
}

impl Default for S3Options {
    fn default() -> Self {
        Self {
            part_size: 128 * 1024 * 1024,
            max_upload_parts: 10_000,
        }
    }
}

/// S3 requires every part except the last to be at least this large.
const MIN_PART_SIZE: u64 = 5 * 1024 * 1024;

/// S3 client wrapper
pub struct S3Client {
    inner: aws_sdk_s3::Client,
    options: S3Options,
}

impl S3Client {
    /// Builds a client from the ambient credential chain, applies the
    /// endpoint overrides, and probes the bucket named by `path` with a
    /// one-key listing.
    pub async fn connect(path: &str, options: S3Options) -> Result<Self> {
        let target = S3Path::parse(path)?;

        let shared = aws_config::defaults(BehaviorVersion::latest()).load().await;
        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Ok(endpoint) = std::env::var("AWS_S3_ENDPOINT") {
            if !endpoint.is_empty() {
                builder = builder.endpoint_url(endpoint_url(&endpoint, env_flag("AWS_S3_NO_SSL")));
            }
        }
        if env_flag("AWS_S3_FORCE_PATH_STYLE") {
            builder = builder.force_path_style(true);
        }

        let client = Self {
            inner: aws_sdk_s3::Client::from_conf(builder.build()),
            options,
        };

        let inner = &client.inner;
        let bucket = &target.bucket;
        with_retry(
            &RetryPolicy::default(),
            || async move {
                inner
                    .list_objects_v2()
                    .bucket(bucket)
                    .max_keys(1)
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|err| Error::Network(format_sdk_error(&err)))
            },
            is_transient,
        )
        .await
        .map_err(|err| Error::Connect(format!("s3://{bucket}: {err}")))?;

        Ok(client)
    }

    async fn put_object(&self, target: &S3Path, body: Vec<u8>) -> Result<()> {
        let inner = &self.inner;
        let bucket = &target.bucket;
        let key = &target.key;
        let body = &body;
        with_retry(
            &RetryPolicy::default(),
            || async move {
                inner
                    .put_object()
                    .bucket(bucket)
                    .key(key)
                    .body(ByteStream::from(body.clone()))
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|err| Error::Network(format_sdk_error(&err)))
            },
            is_transient,
        )
        .await
    }

    async fn multipart_upload(
        &self,
        target: &S3Path,
        first: Vec<u8>,
        source: &mut ByteSource,
        part_size: usize,
    ) -> Result<()> {
        let inner = &self.inner;
        let bucket = &target.bucket;
        let key = &target.key;

        let created = with_retry(
            &RetryPolicy::default(),
            || async move {
                inner
                    .create_multipart_upload()
                    .bucket(bucket)
                    .key(key)
                    .send()
                    .await
                    .map_err(|err| Error::Network(format_sdk_error(&err)))
            },
            is_transient,
        )
        .await?;
        let upload_id = created
            .upload_id()
            .ok_or_else(|| Error::Invariant("multipart upload id missing".to_string()))?
            .to_string();

        let result = self
            .upload_parts(target, &upload_id, first, source, part_size)
            .await;
        if result.is_err() {
            // Abandoned parts accrue storage until a lifecycle rule reaps
            // them; the first error still wins.
            let _ = self
                .inner
                .abort_multipart_upload()
                .bucket(bucket)
                .key(key)
                .upload_id(&upload_id)
                .send()
                .await;
        }
        result
    }

    async fn upload_parts(
        &self,
        target: &S3Path,
        upload_id: &str,
        first: Vec<u8>,
        source: &mut ByteSource,
        part_size: usize,
    ) -> Result<()> {
        let inner = &self.inner;
        let bucket = &target.bucket;
        let key = &target.key;

        let mut parts: Vec<CompletedPart> = Vec::new();
        let mut part_number: i32 = 1;
        let mut pending = first;
        loop {
            if part_number as usize > self.options.max_upload_parts {
                return Err(Error::Usage(format!(
                    "upload to s3://{bucket}/{key} exceeds {} parts; raise --s3-part-size",
                    self.options.max_upload_parts
                )));
            }

            let body = &pending;
            let uploaded = with_retry(
                &RetryPolicy::default(),
                || async move {
                    inner
                        .upload_part()
                        .bucket(bucket)
                        .key(key)
                        .upload_id(upload_id)
                        .part_number(part_number)
                        .body(ByteStream::from(body.clone()))
                        .send()
                        .await
                        .map_err(|err| Error::Network(format_sdk_error(&err)))
                },
                is_transient,
            )
            .await?;
            parts.push(
                CompletedPart::builder()
                    .set_e_tag(uploaded.e_tag().map(str::to_string))
                    .part_number(part_number)
                    .build(),
            );
            part_number += 1;

            pending = read_chunk(source, part_size).await?;
            if pending.is_empty() {
                break;
            }
        }

        let completed = CompletedMultipartUpload::builder()
            .set_parts(Some(parts))
            .build();
        let completed = &completed;
        with_retry(
            &RetryPolicy::default(),
            || async move {
                inner
                    .complete_multipart_upload()
                    .bucket(bucket)
                    .key(key)
                    .upload_id(upload_id)
                    .multipart_upload(completed.clone())
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|err| Error::Network(format_sdk_error(&err)))
            },
            is_transient,
        )
        .await
    }
}

#[async_trait]
impl Backend for S3Client {
    async fn list(&self, path: &str) -> Result<Vec<String>> {
        let target = S3Path::parse(path)?;
        let inner = &self.inner;
        let bucket = &target.bucket;
        let prefix = &target.key;

        let mut relative = Vec::new();
        let mut continuation: Option<String> = None;
        loop {
            let token = continuation.clone();
            let response = with_retry(
                &RetryPolicy::default(),
                || {
                    let mut request = inner.list_objects_v2().bucket(bucket);
                    if !prefix.is_empty() {
                        request = request.prefix(prefix);
                    }
                    if let Some(token) = token.clone() {
                        request = request.continuation_token(token);
                    }
                    async move {
                        request
                            .send()
                            .await
                            .map_err(|err| Error::Network(format_sdk_error(&err)))
                    }
                },
                is_transient,
            )
            .await?;

            for object in response.contents() {
                let Some(object_key) = object.key() else {
                    continue;
                };
                // Zero-byte folder markers are not files.
                if object_key.ends_with('/') {
                    continue;
                }
                if let Some(suffix) = relativize(object_key, prefix) {
                    relative.push(suffix);
                }
            }

            continuation = response.next_continuation_token().map(str::to_string);
            if continuation.is_none() {
                break;
            }
        }

        Ok(relative)
    }

    async fn download(
        &self,
        from: &str,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<()> {
        let target = S3Path::parse(from)?;
        let inner = &self.inner;
        let bucket = &target.bucket;
        let key = &target.key;

        let response = with_retry(
            &RetryPolicy::default(),
            || async move {
                inner.get_object().bucket(bucket).key(key).send().await.map_err(|err| {
                    let no_such_key = matches!(
                        &err,
                        aws_sdk_s3::error::SdkError::ServiceError(service)
                            if service.err().is_no_such_key()
                    );
                    if no_such_key {
                        Error::NotFound(format!("s3://{bucket}/{key}"))
                    } else {
                        Error::Network(format_sdk_error(&err))
                    }
                })
            },
            is_transient,
        )
        .await?;

        let mut body = response.body;
        while let Some(chunk) = body
            .try_next()
            .await
            .map_err(|err| Error::Network(format!("object body: {err}")))?
        {
            sink.write_all(&chunk).await?;
        }
        Ok(())
    }

    async fn upload(&self, to: &str, from: &str, mut source: ByteSource) -> Result<()> {
        let mut target = S3Path::parse(to)?;
        if target.key.is_empty() {
            target.key = base_name(from);
        }

        let part_size = self.options.part_size.max(MIN_PART_SIZE) as usize;
        let first = read_chunk(&mut source, part_size).await?;
        if first.len() < part_size {
            return self.put_object(&target, first).await;
        }
        self.multipart_upload(&target, first, &mut source, part_size)
            .await
    }
}

fn env_flag(name: &str) -> bool {
    matches!(
        std::env::var(name).ok().as_deref(),
        Some("1") | Some("true") | Some("TRUE") | Some("True")
    )
}

/// `AWS_S3_ENDPOINT` may be a bare `host[:port]`; the SDK wants a URL.
fn endpoint_url(endpoint: &str, no_ssl: bool) -> String {
    if endpoint.contains("://") {
        endpoint.to_string()
    } else if no_ssl {
        format!("http://{endpoint}")
    } else {
        format!("https://{endpoint}")
    }
}

/// Format AWS SDK error into a detailed error message
fn format_sdk_error<E: std::fmt::Display>(error: &aws_sdk_s3::error::SdkError<E>) -> String {
    match error {
        aws_sdk_s3::error::SdkError::ServiceError(service_err) => {
            let err = service_err.err();
            let meta = service_err.raw();
            let mut msg = format!("Service error: {}", err);
            // Try to extract additional error information from headers
            if let Some(code) = meta.headers().get("x-amz-error-code") {
                msg.push_str(&format!(" (code: {})", code));
            }
            msg
        }
        aws_sdk_s3::error::SdkError::ConstructionFailure(err) => {
            format!("Request construction failed: {:?}", err)
        }
        aws_sdk_s3::error::SdkError::TimeoutError(_) => "Request timeout".to_string(),
        aws_sdk_s3::error::SdkError::DispatchFailure(err) => {
            format!("Network dispatch error: {:?}", err)
        }
        aws_sdk_s3::error::SdkError::ResponseError(err) => {
            format!("Response error: {:?}", err)
        }
        _ => error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url() {
        assert_eq!(
            endpoint_url("minio.local:9000", true),
            "http://minio.local:9000"
        );
        assert_eq!(
            endpoint_url("minio.local:9000", false),
            "https://minio.local:9000"
        );
        assert_eq!(
            endpoint_url("https://s3.example.com", true),
            "https://s3.example.com"
        );
    }

    #[test]
    fn test_env_flag_defaults_false() {
        assert!(!env_flag("FERRY_TEST_UNSET_FLAG"));
    }

    #[test]
    fn test_options_defaults() {
        let options = S3Options::default();
        assert_eq!(options.part_size, 128 * 1024 * 1024);
        assert_eq!(options.max_upload_parts, 10_000);
    }
}
