//! ferry-core: core library for the ferry copy tool
//!
//! This crate provides the transfer engine and the pieces it is built from:
//! - URI and path handling for the closed scheme set
//! - The `Backend` capability contract implemented by every storage backend
//! - A bounded in-memory pipe connecting each transfer's producer and consumer
//! - Retry with linear backoff for transient backend failures
//! - The engine itself: enumeration, bounded-parallel scheduling, and
//!   first-error aggregation
//!
//! This crate is independent of any specific storage SDK; the backend crates
//! implement [`Backend`] on top of their providers' clients.

pub mod engine;
pub mod error;
pub mod path;
pub mod pipe;
pub mod retry;
pub mod traits;

pub use engine::{CopyOptions, FromTo, copy};
pub use error::{Direction, Error, Result};
pub use path::{Scheme, Uri, base_name, join_key, relativize};
pub use pipe::{PipeReader, PipeWriter, pipe};
pub use retry::{RetryPolicy, is_transient, with_retry};
pub use traits::{Backend, ByteSource, read_chunk};
