//! URI and path handling
//!
//! A source or destination is addressed as `<scheme>://<path>`. The scheme
//! set is closed; each backend crate further parses its own path grammar.
//! This module also provides the two string operations the engine and the
//! backends share: stripping a base prefix from a listing entry and joining
//! a relative suffix back onto a base path.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// The closed set of supported storage schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    K8s,
    S3,
    Abs,
    Gcs,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::K8s => "k8s",
            Scheme::S3 => "s3",
            Scheme::Abs => "abs",
            Scheme::Gcs => "gcs",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "k8s" => Ok(Scheme::K8s),
            "s3" => Ok(Scheme::S3),
            "abs" => Ok(Scheme::Abs),
            "gcs" => Ok(Scheme::Gcs),
            other => Err(Error::Usage(format!("{other} not implemented"))),
        }
    }
}

/// A parsed `<scheme>://<path>` address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uri {
    pub scheme: Scheme,
    pub path: String,
}

impl Uri {
    pub fn parse(input: &str) -> Result<Self> {
        let (scheme, path) = input
            .split_once("://")
            .ok_or_else(|| Error::Usage(format!("'{input}' does not contain '://'")))?;
        Ok(Self {
            scheme: scheme.parse()?,
            path: path.to_string(),
        })
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.path)
    }
}

/// Returns the suffix of `listing` beneath `base`, or `None` when the entry
/// leaked in from a wider prefix scan (e.g. `input2/x` against base `input`).
///
/// The suffix keeps its leading separator when present; [`join_key`] absorbs
/// it. An exact match yields the empty suffix, which is how a single-file
/// source round-trips.
pub fn relativize(listing: &str, base: &str) -> Option<String> {
    let base = base.trim_end_matches('/');
    if base.is_empty() {
        return Some(listing.to_string());
    }
    let rest = listing.strip_prefix(base)?;
    if rest.is_empty() || rest.starts_with('/') {
        Some(rest.to_string())
    } else {
        None
    }
}

/// Joins a relative suffix onto a base path with exactly one separator
/// between them. The empty suffix returns the base unchanged.
pub fn join_key(base: &str, relative: &str) -> String {
    let base = base.trim_end_matches('/');
    let relative = relative.trim_start_matches('/');
    if relative.is_empty() {
        base.to_string()
    } else if base.is_empty() {
        relative.to_string()
    } else {
        format!("{base}/{relative}")
    }
}

/// Final path component of a file path, used when a destination stops at
/// bucket or container granularity.
pub fn base_name(path: &str) -> String {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_uri() {
        let uri = Uri::parse("k8s://dev/p0/c/data/hello.txt").unwrap();
        assert_eq!(uri.scheme, Scheme::K8s);
        assert_eq!(uri.path, "dev/p0/c/data/hello.txt");

        let uri = Uri::parse("s3://bkt").unwrap();
        assert_eq!(uri.scheme, Scheme::S3);
        assert_eq!(uri.path, "bkt");
    }

    #[test]
    fn test_parse_uri_missing_separator() {
        let err = Uri::parse("s3:/bkt/key").unwrap_err();
        assert!(matches!(err, Error::Usage(_)));
    }

    #[test]
    fn test_parse_uri_unknown_scheme() {
        let err = Uri::parse("ftp://host/file").unwrap_err();
        assert!(matches!(err, Error::Usage(msg) if msg.contains("ftp")));
    }

    #[test]
    fn test_uri_round_trips_display() {
        let uri = Uri::parse("abs://acct/cont/blob").unwrap();
        assert_eq!(uri.to_string(), "abs://acct/cont/blob");
    }

    #[test]
    fn test_relativize_strips_base() {
        assert_eq!(
            relativize("input/a/1.bin", "input").as_deref(),
            Some("/a/1.bin")
        );
        assert_eq!(
            relativize("/data/hello.txt", "/data").as_deref(),
            Some("/hello.txt")
        );
    }

    #[test]
    fn test_relativize_exact_match_is_empty() {
        assert_eq!(relativize("input/a/1.bin", "input/a/1.bin").as_deref(), Some(""));
    }

    #[test]
    fn test_relativize_skips_sibling_prefix() {
        // "input2" shares the character prefix but is not beneath "input".
        assert_eq!(relativize("input2/file", "input"), None);
        assert_eq!(relativize("other/file", "input"), None);
    }

    #[test]
    fn test_relativize_trailing_slash_base() {
        assert_eq!(
            relativize("input/a/1.bin", "input/").as_deref(),
            Some("/a/1.bin")
        );
    }

    #[test]
    fn test_relativize_empty_base_keeps_listing() {
        assert_eq!(relativize("a/1.bin", "").as_deref(), Some("a/1.bin"));
    }

    #[test]
    fn test_join_key() {
        assert_eq!(join_key("ns/pod/c/out", "/a/1.bin"), "ns/pod/c/out/a/1.bin");
        assert_eq!(join_key("bkt/input/", "a.txt"), "bkt/input/a.txt");
        assert_eq!(join_key("", "a.txt"), "a.txt");
    }

    #[test]
    fn test_join_key_empty_suffix_is_base() {
        assert_eq!(join_key("bkt/input/a.bin", ""), "bkt/input/a.bin");
        assert_eq!(join_key("bkt/input/", ""), "bkt/input");
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("dev/p0/c/data/hello.txt"), "hello.txt");
        assert_eq!(base_name("/data/hello.txt"), "hello.txt");
        assert_eq!(base_name("hello.txt"), "hello.txt");
    }
}
