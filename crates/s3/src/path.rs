//! s3 path grammar: `bucket/key…`

use ferry_core::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Path {
    pub bucket: String,
    /// Object key without a leading slash; empty at bucket granularity.
    pub key: String,
}

impl S3Path {
    pub fn parse(path: &str) -> Result<Self> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if segments.is_empty() {
            return Err(Error::InvalidPath(path.to_string()));
        }
        Ok(Self {
            bucket: segments[0].to_string(),
            key: segments[1..].join("/"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let path = S3Path::parse("bkt/input/a/1.bin").unwrap();
        assert_eq!(path.bucket, "bkt");
        assert_eq!(path.key, "input/a/1.bin");
    }

    #[test]
    fn test_parse_bucket_only() {
        let path = S3Path::parse("bkt").unwrap();
        assert_eq!(path.bucket, "bkt");
        assert_eq!(path.key, "");
    }

    #[test]
    fn test_parse_trailing_slash() {
        let path = S3Path::parse("bkt/input/").unwrap();
        assert_eq!(path.key, "input");
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!(S3Path::parse("").is_err());
        assert!(S3Path::parse("/").is_err());
    }
}
