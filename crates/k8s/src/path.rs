//! k8s path grammar: `namespace/pod/container/absolute/file/path`

use ferry_core::{Error, Result};

/// A fully addressed file inside a running container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct K8sPath {
    pub namespace: String,
    pub pod: String,
    pub container: String,
    /// Absolute path inside the container, with its leading `/`.
    pub file_path: String,
}

impl K8sPath {
    pub fn parse(path: &str) -> Result<Self> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if segments.len() < 4 {
            return Err(Error::InvalidPath(path.to_string()));
        }
        Ok(Self {
            namespace: segments[0].to_string(),
            pod: segments[1].to_string(),
            container: segments[2].to_string(),
            file_path: format!("/{}", segments[3..].join("/")),
        })
    }

    /// Directory holding `file_path`, for `mkdir -p` before an upload.
    pub fn parent_dir(&self) -> String {
        match self.file_path.rsplit_once('/') {
            Some((dir, _)) if !dir.is_empty() => dir.to_string(),
            _ => "/".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let path = K8sPath::parse("dev/p0/c/data/hello.txt").unwrap();
        assert_eq!(path.namespace, "dev");
        assert_eq!(path.pod, "p0");
        assert_eq!(path.container, "c");
        assert_eq!(path.file_path, "/data/hello.txt");
    }

    #[test]
    fn test_parse_deep_path() {
        let path = K8sPath::parse("ns/pod/c/var/lib/app/data/f.bin").unwrap();
        assert_eq!(path.file_path, "/var/lib/app/data/f.bin");
    }

    #[test]
    fn test_parse_collapses_repeated_separators() {
        let path = K8sPath::parse("ns/pod/c//data//f.bin").unwrap();
        assert_eq!(path.file_path, "/data/f.bin");
    }

    #[test]
    fn test_parse_rejects_short_paths() {
        assert!(K8sPath::parse("ns/pod/c").is_err());
        assert!(K8sPath::parse("ns/pod").is_err());
        assert!(K8sPath::parse("").is_err());
    }

    #[test]
    fn test_parent_dir() {
        let path = K8sPath::parse("ns/pod/c/out/a/1.bin").unwrap();
        assert_eq!(path.parent_dir(), "/out/a");

        let path = K8sPath::parse("ns/pod/c/top.bin").unwrap();
        assert_eq!(path.parent_dir(), "/");
    }
}
