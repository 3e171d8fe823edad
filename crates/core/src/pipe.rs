//! Bounded in-memory byte pipe
//!
//! Each transfer wires its download half to its upload half through one of
//! these: an ordered byte channel backed by a fixed-size buffer, one writer
//! and one reader. Writes park when the buffer is full and reads park when it
//! is empty, so a fast producer and a slow consumer (or vice versa) throttle
//! each other without ever holding more than the buffer in memory.
//!
//! Shutting down or dropping the write end delivers the residual bytes
//! followed by end-of-stream; dropping the read end fails pending and
//! subsequent writes, which the producer treats as a consumer-side failure.

use tokio::io::DuplexStream;

pub type PipeReader = DuplexStream;
pub type PipeWriter = DuplexStream;

/// Creates a pipe with a `capacity`-byte buffer. The first stream is the
/// write end, the second the read end; each end is used in one direction
/// only.
pub fn pipe(capacity: usize) -> (PipeWriter, PipeReader) {
    let (writer, reader) = tokio::io::duplex(capacity.max(1));
    (writer, reader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn test_reader_sees_bytes_in_order_then_eof() {
        let (mut writer, mut reader) = pipe(1024);

        writer.write_all(b"hello").await.unwrap();
        writer.write_all(b"\n").await.unwrap();
        writer.shutdown().await.unwrap();
        drop(writer);

        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"hello\n");
    }

    #[tokio::test]
    async fn test_writer_drop_delivers_residual_bytes() {
        let (mut writer, mut reader) = pipe(64);
        writer.write_all(b"abc").await.unwrap();
        drop(writer);

        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"abc");
    }

    #[tokio::test]
    async fn test_full_buffer_blocks_writer_until_reader_drains() {
        let (mut writer, mut reader) = pipe(4);

        writer.write_all(b"1234").await.unwrap();

        // The buffer is full; another write must park.
        let blocked =
            tokio::time::timeout(Duration::from_millis(20), writer.write_all(b"5678")).await;
        assert!(blocked.is_err(), "write should block on a full buffer");

        // Draining the buffer unblocks the writer.
        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"1234");

        writer.write_all(b"5678").await.unwrap();
        writer.shutdown().await.unwrap();
        drop(writer);

        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"5678");
    }

    #[tokio::test]
    async fn test_dropped_reader_fails_writes() {
        let (mut writer, reader) = pipe(2);
        drop(reader);

        let result = writer.write_all(b"abcd").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_large_transfer_crosses_buffer_many_times() {
        let (mut writer, mut reader) = pipe(1024);
        let payload: Vec<u8> = (0..64 * 1024).map(|i| (i % 251) as u8).collect();
        let expected = payload.clone();

        let producer = tokio::spawn(async move {
            writer.write_all(&payload).await.unwrap();
            writer.shutdown().await.unwrap();
        });

        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        producer.await.unwrap();
        assert_eq!(out, expected);
    }
}
