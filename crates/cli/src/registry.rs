//! Closed scheme registry
//!
//! Connects clients for the source and destination schemes and dispatches
//! the Backend operations to the scheme-typed client inside. When both sides
//! name the same scheme, one client (and one probe) serves both.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncWrite;

use ferry_abs::AbsClient;
use ferry_core::{Backend, ByteSource, Result, Scheme, Uri};
use ferry_gcs::GcsClient;
use ferry_k8s::K8sClient;
use ferry_s3::{S3Client, S3Options};

pub enum Client {
    K8s(K8sClient),
    S3(S3Client),
    Abs(AbsClient),
    Gcs(GcsClient),
}

impl Client {
    async fn connect(scheme: Scheme, path: &str, s3_options: &S3Options) -> Result<Self> {
        match scheme {
            Scheme::K8s => Ok(Client::K8s(K8sClient::connect(path).await?)),
            Scheme::S3 => Ok(Client::S3(
                S3Client::connect(path, s3_options.clone()).await?,
            )),
            Scheme::Abs => Ok(Client::Abs(AbsClient::connect(path).await?)),
            Scheme::Gcs => Ok(Client::Gcs(GcsClient::connect(path).await?)),
        }
    }
}

/// Connects the source client, then reuses it for the destination when both
/// URIs share a scheme.
pub async fn connect_pair(
    src: &Uri,
    dst: &Uri,
    s3_options: &S3Options,
) -> Result<(Arc<Client>, Arc<Client>)> {
    let src_client = Arc::new(Client::connect(src.scheme, &src.path, s3_options).await?);
    let dst_client = if dst.scheme == src.scheme {
        Arc::clone(&src_client)
    } else {
        Arc::new(Client::connect(dst.scheme, &dst.path, s3_options).await?)
    };
    Ok((src_client, dst_client))
}

#[async_trait]
impl Backend for Client {
    async fn list(&self, path: &str) -> Result<Vec<String>> {
        match self {
            Client::K8s(client) => client.list(path).await,
            Client::S3(client) => client.list(path).await,
            Client::Abs(client) => client.list(path).await,
            Client::Gcs(client) => client.list(path).await,
        }
    }

    async fn download(
        &self,
        from: &str,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<()> {
        match self {
            Client::K8s(client) => client.download(from, sink).await,
            Client::S3(client) => client.download(from, sink).await,
            Client::Abs(client) => client.download(from, sink).await,
            Client::Gcs(client) => client.download(from, sink).await,
        }
    }

    async fn upload(&self, to: &str, from: &str, source: ByteSource) -> Result<()> {
        match self {
            Client::K8s(client) => client.upload(to, from, source).await,
            Client::S3(client) => client.upload(to, from, source).await,
            Client::Abs(client) => client.upload(to, from, source).await,
            Client::Gcs(client) => client.upload(to, from, source).await,
        }
    }
}
