//! gcs path grammar: `bucket/object…`

use ferry_core::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GcsPath {
    pub bucket: String,
    /// Object name without a leading slash; empty at bucket granularity.
    pub object: String,
}

impl GcsPath {
    pub fn parse(path: &str) -> Result<Self> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if segments.is_empty() {
            return Err(Error::InvalidPath(path.to_string()));
        }
        Ok(Self {
            bucket: segments[0].to_string(),
            object: segments[1..].join("/"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let path = GcsPath::parse("bkt/input/a/1.bin").unwrap();
        assert_eq!(path.bucket, "bkt");
        assert_eq!(path.object, "input/a/1.bin");
    }

    #[test]
    fn test_parse_bucket_only() {
        let path = GcsPath::parse("bkt").unwrap();
        assert_eq!(path.object, "");
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!(GcsPath::parse("").is_err());
    }
}
