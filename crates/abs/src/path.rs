//! abs path grammar: `account/container/blob…`

use ferry_core::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbsPath {
    pub account: String,
    pub container: String,
    /// Blob name without a leading slash; empty at container granularity.
    pub blob: String,
}

impl AbsPath {
    pub fn parse(path: &str) -> Result<Self> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if segments.len() < 2 {
            return Err(Error::InvalidPath(path.to_string()));
        }
        Ok(Self {
            account: segments[0].to_string(),
            container: segments[1].to_string(),
            blob: segments[2..].join("/"),
        })
    }
}
