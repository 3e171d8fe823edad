//! Google Cloud Storage client implementation

use async_trait::async_trait;
use futures::StreamExt;
use google_cloud_storage::client::{Client, ClientConfig};
use google_cloud_storage::http::buckets::get::GetBucketRequest;
use google_cloud_storage::http::objects::download::Range;
use google_cloud_storage::http::objects::get::GetObjectRequest;
use google_cloud_storage::http::objects::list::ListObjectsRequest;
use google_cloud_storage::http::objects::upload::{Media, UploadObjectRequest, UploadType};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::io::ReaderStream;

use ferry_core::{
    Backend, ByteSource, Error, Result, RetryPolicy, base_name, is_transient, relativize,
    with_retry,
};

use crate::path::GcsPath;

pub struct GcsClient {
    inner: Client,
}

impl GcsClient {
    /// Builds a client from the ambient credential chain and probes the
    /// bucket named by `path` with an attribute read.
    pub async fn connect(path: &str) -> Result<Self> {
        let target = GcsPath::parse(path)?;

        let config = ClientConfig::default()
            .with_auth()
            .await
            .map_err(|err| Error::Connect(format!("google credentials: {err}")))?;
        let client = Self {
            inner: Client::new(config),
        };

        with_retry(
            &RetryPolicy::new(4),
            || {
                let inner = client.inner.clone();
                let bucket = target.bucket.clone();
                async move {
                    inner
                        .get_bucket(&GetBucketRequest {
                            bucket,
                            ..Default::default()
                        })
                        .await
                        .map(|_| ())
                        .map_err(|err| Error::Network(format!("bucket attributes: {err}")))
                }
            },
            is_transient,
        )
        .await
        .map_err(|err| Error::Connect(format!("gcs://{}: {err}", target.bucket)))?;

        Ok(client)
    }
}

#[async_trait]
impl Backend for GcsClient {
    async fn list(&self, path: &str) -> Result<Vec<String>> {
        let target = GcsPath::parse(path)?;

        let mut relative = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let request = ListObjectsRequest {
                bucket: target.bucket.clone(),
                prefix: (!target.object.is_empty()).then(|| target.object.clone()),
                page_token: page_token.clone(),
                ..Default::default()
            };
            let inner = &self.inner;
            let request = &request;
            let response = with_retry(
                &RetryPolicy::default(),
                || async move {
                    inner
                        .list_objects(request)
                        .await
                        .map_err(|err| Error::Network(format!("list objects: {err}")))
                },
                is_transient,
            )
            .await?;

            for object in response.items.unwrap_or_default() {
                // The listing is recursive already; directory placeholders
                // end with a slash.
                if object.name.ends_with('/') {
                    continue;
                }
                if let Some(suffix) = relativize(&object.name, &target.object) {
                    relative.push(suffix);
                }
            }

            page_token = response.next_page_token;
            if page_token.is_none() {
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
        let target = GcsPath::parse(from)?;

        let request = GetObjectRequest {
            bucket: target.bucket.clone(),
            object: target.object.clone(),
            ..Default::default()
        };
        let inner = &self.inner;
        let request = &request;
        let stream = with_retry(
            &RetryPolicy::default(),
            || async move {
                inner
                    .download_streamed_object(request, &Range::default())
                    .await
                    .map_err(|err| Error::Network(format!("download object: {err}")))
            },
            is_transient,
        )
        .await?;

        let mut stream = Box::pin(stream);
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|err| Error::Network(format!("object body: {err}")))?;
            sink.write_all(&chunk).await?;
        }
        Ok(())
    }

    async fn upload(&self, to: &str, from: &str, source: ByteSource) -> Result<()> {
        let mut target = GcsPath::parse(to)?;
        if target.object.is_empty() {
            target.object = base_name(from);
        }

        let media = Media::new(target.object.clone());
        // The pipe is one-shot, so the streamed upload gets a single attempt.
        self.inner
            .upload_streamed_object(
                &UploadObjectRequest {
                    bucket: target.bucket.clone(),
                    ..Default::default()
                },
                ReaderStream::new(source),
                &UploadType::Simple(media),
            )
            .await
            .map(|_| ())
            .map_err(|err| Error::Network(format!("upload object: {err}")))
    }
}
