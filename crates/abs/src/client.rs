//! Azure Blob Storage client implementation
//!
//! Holds the shared-key credentials and builds container clients per path;
//! the SDK pipeline carries the wire-level retry policy.

use std::time::Duration;

use async_trait::async_trait;
use azure_core::{ExponentialRetryOptions, RetryOptions};
use azure_storage::StorageCredentials;
use azure_storage_blobs::blob::{BlobBlockType, BlockList};
use azure_storage_blobs::prelude::{ClientBuilder, ContainerClient};
use base64::engine::general_purpose;
use base64::Engine as _;
use bytes::Bytes;
use futures::StreamExt;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use ferry_core::{
    Backend, ByteSource, Error, Result, RetryPolicy, base_name, is_transient, read_chunk,
    relativize, with_retry,
};

use crate::path::AbsPath;

/// Block-blob uploads are staged in blocks of this size.
const BLOCK_SIZE: usize = 4 * 1024 * 1024;

/// Azure Blob Storage client. The credentials come from the environment once
/// at connect time; container clients are derived per path.
#[derive(Clone)]
pub struct AbsClient {
    credentials: StorageCredentials,
}

impl AbsClient {
    /// Reads the shared-key credentials from the environment and probes the
    /// container named by `path` with a metadata fetch.
    pub async fn connect(path: &str) -> Result<Self> {
        let target = AbsPath::parse(path)?;

        let account = std::env::var("AZURE_STORAGE_ACCOUNT").unwrap_or_default();
        let access_key = std::env::var("AZURE_STORAGE_ACCESS_KEY").unwrap_or_default();
        if account.is_empty() || access_key.is_empty() {
            return Err(Error::Connect(
                "either the AZURE_STORAGE_ACCOUNT or AZURE_STORAGE_ACCESS_KEY environment \
                 variable is not set"
                    .to_string(),
            ));
        }

        let client = Self {
            credentials: StorageCredentials::access_key(account, access_key),
        };

        let container = client.container_client(&target);
        with_retry(
            &RetryPolicy::default(),
            || {
                let container = container.clone();
                async move {
                    container
                        .get_properties()
                        .await
                        .map(|_| ())
                        .map_err(|err| Error::Network(format!("container properties: {err}")))
                }
            },
            is_transient,
        )
        .await
        .map_err(|err| {
            Error::Connect(format!(
                "abs://{}/{}: {err}",
                target.account, target.container
            ))
        })?;

        Ok(client)
    }

    fn container_client(&self, path: &AbsPath) -> ContainerClient {
        ClientBuilder::new(path.account.clone(), self.credentials.clone())
            .retry(RetryOptions::exponential(
                ExponentialRetryOptions::default()
                    .max_retries(3u32)
                    .initial_delay(Duration::from_secs(1))
                    .max_delay(Duration::from_secs(3)),
            ))
            .container_client(path.container.clone())
    }
}

#[async_trait]
impl Backend for AbsClient {
    async fn list(&self, path: &str) -> Result<Vec<String>> {
        let target = AbsPath::parse(path)?;
        let container = self.container_client(&target);

        let mut builder = container.list_blobs();
        if !target.blob.is_empty() {
            builder = builder.prefix(target.blob.clone());
        }

        let mut relative = Vec::new();
        let mut pages = builder.into_stream();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|err| Error::Network(format!("list blobs: {err}")))?;
            for blob in page.blobs.blobs() {
                if let Some(suffix) = relativize(&blob.name, &target.blob) {
                    relative.push(suffix);
                }
            }
        }
        Ok(relative)
    }

    async fn download(
        &self,
        from: &str,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<()> {
        let target = AbsPath::parse(from)?;
        let blob = self
            .container_client(&target)
            .blob_client(target.blob.clone());

        let mut chunks = blob.get().into_stream();
        while let Some(response) = chunks.next().await {
            let response = response.map_err(|err| {
                let missing = err
                    .as_http_error()
                    .is_some_and(|http| http.status() == azure_core::StatusCode::NotFound);
                if missing {
                    Error::NotFound(format!(
                        "abs://{}/{}/{}",
                        target.account, target.container, target.blob
                    ))
                } else {
                    Error::Network(format!("download blob: {err}"))
                }
            })?;
            let mut body = response.data;
            while let Some(piece) = body.next().await {
                let piece = piece.map_err(|err| Error::Network(format!("blob body: {err}")))?;
                sink.write_all(&piece).await?;
            }
        }
        Ok(())
    }

    async fn upload(&self, to: &str, from: &str, mut source: ByteSource) -> Result<()> {
        let mut target = AbsPath::parse(to)?;
        if target.blob.is_empty() {
            target.blob = base_name(from);
        }
        let blob = self
            .container_client(&target)
            .blob_client(target.blob.clone());

        let mut blocks: Vec<BlobBlockType> = Vec::new();
        let mut index: u64 = 0;
        loop {
            let chunk = read_chunk(&mut source, BLOCK_SIZE).await?;
            if chunk.is_empty() {
                break;
            }
            let block_id = general_purpose::STANDARD.encode(index.to_be_bytes());
            blob.put_block(block_id.clone(), Bytes::from(chunk))
                .await
                .map_err(|err| Error::Network(format!("put block: {err}")))?;
            blocks.push(BlobBlockType::new_uncommitted(block_id));
            index += 1;
        }

        // Committing an empty block list still creates a zero-length blob.
        blob.put_block_list(BlockList { blocks })
            .await
            .map_err(|err| Error::Network(format!("put block list: {err}")))?;
        Ok(())
    }
}
