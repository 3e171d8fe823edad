//! Error types shared across the ferry crates
//!
//! Backend crates map their SDK errors into these variants at the boundary;
//! the engine and the CLI only ever see this enum.

use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

/// Which half of a transfer an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Src,
    Dst,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Src => write!(f, "src"),
            Direction::Dst => write!(f, "dst"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed URI, unknown scheme, or an out-of-range flag value.
    #[error("{0}")]
    Usage(String),

    /// A scheme-specific path that fails its segment grammar.
    #[error("illegal path: '{0}'")]
    InvalidPath(String),

    /// Backend probe failed or credentials are missing.
    #[error("connect failed: {0}")]
    Connect(String),

    /// Wire-level failure reported by a backend SDK.
    #[error("network error: {0}")]
    Network(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Source enumeration failed after retries.
    #[error("list failed: {0}")]
    List(String),

    /// Download or Upload failed after retries.
    #[error("{message} {direction}: file: {path}")]
    Transfer {
        direction: Direction,
        path: String,
        message: String,
    },

    /// A command run inside a container wrote to stderr or failed to exit
    /// cleanly. The message carries the captured stderr.
    #[error("{0}")]
    Command(String),

    /// Pipe misuse or an unreachable branch.
    #[error("invariant violated: {0}")]
    Invariant(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_display() {
        assert_eq!(Direction::Src.to_string(), "src");
        assert_eq!(Direction::Dst.to_string(), "dst");
    }

    #[test]
    fn test_transfer_error_names_direction_and_path() {
        let err = Error::Transfer {
            direction: Direction::Dst,
            path: "bkt/out/a.bin".to_string(),
            message: "network error: connection reset".to_string(),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("dst"));
        assert!(rendered.contains("bkt/out/a.bin"));
        assert!(rendered.contains("connection reset"));
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
