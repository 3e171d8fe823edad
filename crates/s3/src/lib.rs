//! S3-compatible backend
//!
//! Wraps aws-sdk-s3 and implements the Backend contract from ferry-core.
//! Credentials and region come from the ambient AWS chain; endpoint, TLS,
//! and addressing style are overridable through `AWS_S3_ENDPOINT`,
//! `AWS_S3_NO_SSL`, and `AWS_S3_FORCE_PATH_STYLE`.

mod client;
mod path;

pub use client::{S3Client, S3Options};
pub use path::S3Path;
