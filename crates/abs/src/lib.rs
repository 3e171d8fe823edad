//! Azure Blob Storage backend
//!
//! Shared-key authentication from `AZURE_STORAGE_ACCOUNT` and
//! `AZURE_STORAGE_ACCESS_KEY`; wire-level retries ride the SDK pipeline's
//! exponential policy. Uploads are staged as 4 MiB blocks and committed with
//! a block list.

mod client;
mod path;

pub use client::AbsClient;
pub use path::AbsPath;
