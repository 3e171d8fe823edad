//! Backend capability contract
//!
//! Every storage scheme provides the same four operations: Connect (an
//! inherent async constructor on the client type), List, Download, and
//! Upload. This trait covers the three that run per copy; all of them are
//! safe to call concurrently on one client value.

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};

use crate::error::Result;

/// Owned sequential byte source handed to [`Backend::upload`]. One-shot:
/// whatever the upload consumes cannot be replayed.
pub type ByteSource = Box<dyn AsyncRead + Send + Sync + Unpin>;

#[async_trait]
pub trait Backend: Send + Sync {
    /// Recursively enumerates files (not directories) beneath `path`.
    /// Returned entries are relative to `path`; order is unspecified.
    async fn list(&self, path: &str) -> Result<Vec<String>>;

    /// Streams the entire object at `from` into `sink`, sequentially and in
    /// source order. The sink stays open; the caller closes it.
    async fn download(
        &self,
        from: &str,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<()>;

    /// Streams `source` to `to`. When `to` stops at bucket or container
    /// granularity, the base file name of `from` is appended.
    async fn upload(&self, to: &str, from: &str, source: ByteSource) -> Result<()>;
}

/// Reads up to `limit` bytes from `source`, stopping early only at
/// end-of-stream. Object-store uploads use this to cut the pipe into parts.
pub async fn read_chunk(source: &mut ByteSource, limit: usize) -> std::io::Result<Vec<u8>> {
    let mut chunk = Vec::with_capacity(limit.min(1 << 20));
    let mut buf = [0u8; 64 * 1024];
    while chunk.len() < limit {
        let want = buf.len().min(limit - chunk.len());
        let n = source.read(&mut buf[..want]).await?;
        if n == 0 {
            break;
        }
        chunk.extend_from_slice(&buf[..n]);
    }
    Ok(chunk)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_chunk_fills_to_limit() {
        let data: Vec<u8> = (0..100u8).collect();
        let mut source: ByteSource = Box::new(std::io::Cursor::new(data.clone()));

        let first = read_chunk(&mut source, 64).await.unwrap();
        assert_eq!(first, &data[..64]);

        let second = read_chunk(&mut source, 64).await.unwrap();
        assert_eq!(second, &data[64..]);

        let done = read_chunk(&mut source, 64).await.unwrap();
        assert!(done.is_empty());
    }

    #[tokio::test]
    async fn test_read_chunk_short_stream() {
        let mut source: ByteSource = Box::new(std::io::Cursor::new(b"abc".to_vec()));
        let chunk = read_chunk(&mut source, 1024).await.unwrap();
        assert_eq!(chunk, b"abc");
    }
}
