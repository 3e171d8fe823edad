//! Kubernetes client and exec plumbing
//!
//! Wraps the kube client and implements the Backend contract from ferry-core.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, AttachParams};
use kube::{Client, Config};
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};

use ferry_core::{
    Backend, ByteSource, Error, Result, RetryPolicy, is_transient, relativize, with_retry,
};

use crate::path::K8sPath;

/// Captured stderr is bounded; anything a failing `cat` or `cp` has to say
/// fits well within this.
const STDERR_LIMIT: u64 = 64 * 1024;

/// Kubernetes exec client. Cheap to clone and safe to share across
/// concurrent transfers.
#[derive(Clone)]
pub struct K8sClient {
    client: Client,
}

impl K8sClient {
    /// Builds a client from the ambient cluster configuration (`KUBECONFIG`,
    /// `~/.kube/config`, or the in-cluster service account) and probes the
    /// pod named by `path`.
    pub async fn connect(path: &str) -> Result<Self> {
        let target = K8sPath::parse(path)?;
        let config = Config::infer()
            .await
            .map_err(|err| Error::Connect(format!("kubernetes config: {err}")))?;
        let client = Client::try_from(config)
            .map_err(|err| Error::Connect(format!("kubernetes client: {err}")))?;
        let this = Self { client };

        let pods = this.pods(&target.namespace);
        with_retry(
            &RetryPolicy::default(),
            || {
                let pods = pods.clone();
                let pod = target.pod.clone();
                async move {
                    pods.get(&pod)
                        .await
                        .map(|_| ())
                        .map_err(|err| Error::Network(format!("pod probe: {err}")))
                }
            },
            is_transient,
        )
        .await
        .map_err(|err| {
            Error::Connect(format!(
                "k8s://{}/{}: {err}",
                target.namespace, target.pod
            ))
        })?;

        Ok(this)
    }

    fn pods(&self, namespace: &str) -> Api<Pod> {
        Api::namespaced(self.client.clone(), namespace)
    }

    /// Runs `command` in the target container, feeding `stdin` when present
    /// and streaming stdout into `stdout` when present. stderr is always
    /// drained into a bounded capture; any captured bytes fail the
    /// operation, as does a `Failure` exec status.
    async fn exec<W>(
        &self,
        target: &K8sPath,
        command: Vec<String>,
        stdin: Option<ByteSource>,
        stdout: Option<&mut W>,
    ) -> Result<()>
    where
        W: AsyncWrite + Send + Unpin + ?Sized,
    {
        let params = AttachParams::default()
            .container(target.container.clone())
            .stdin(stdin.is_some())
            .stdout(stdout.is_some())
            .stderr(true);

        let mut process = self
            .pods(&target.namespace)
            .exec(&target.pod, command, &params)
            .await
            .map_err(|err| Error::Network(format!("pod exec: {err}")))?;

        let mut stderr = process
            .stderr()
            .ok_or_else(|| Error::Invariant("exec stderr stream missing".to_string()))?;
        let stderr_capture = tokio::spawn(async move {
            let mut captured = Vec::new();
            let mut bounded = (&mut stderr).take(STDERR_LIMIT);
            let _ = bounded.read_to_end(&mut captured).await;
            // Keep draining past the cap; stdout and stderr share one
            // multiplexed stream, and unread stderr would stall it.
            let _ = tokio::io::copy(&mut stderr, &mut tokio::io::sink()).await;
            captured
        });
        let status = process
            .take_status()
            .ok_or_else(|| Error::Invariant("exec status stream missing".to_string()))?;

        if let Some(mut source) = stdin {
            let mut remote_stdin = process
                .stdin()
                .ok_or_else(|| Error::Invariant("exec stdin stream missing".to_string()))?;
            tokio::io::copy(&mut source, &mut remote_stdin).await?;
            // The remote command only finishes once it sees stdin close.
            remote_stdin.shutdown().await?;
            drop(remote_stdin);
        }

        if let Some(sink) = stdout {
            let mut remote_stdout = process
                .stdout()
                .ok_or_else(|| Error::Invariant("exec stdout stream missing".to_string()))?;
            tokio::io::copy(&mut remote_stdout, sink).await?;
        }

        let status = status.await;
        process
            .join()
            .await
            .map_err(|err| Error::Network(format!("pod exec: {err}")))?;

        let captured = stderr_capture
            .await
            .map_err(|err| Error::Invariant(format!("stderr capture failed: {err}")))?;
        if !captured.is_empty() {
            return Err(Error::Command(format!(
                "STDERR: {}",
                String::from_utf8_lossy(&captured).trim_end()
            )));
        }
        if let Some(status) = status {
            if status.status.as_deref() == Some("Failure") {
                return Err(Error::Command(
                    status
                        .message
                        .unwrap_or_else(|| "command failed".to_string()),
                ));
            }
        }
        Ok(())
    }

    /// Exec without stdio, retried under the default policy. Used for the
    /// side-effect commands that prepare an upload.
    async fn exec_retry(&self, target: &K8sPath, command: Vec<String>) -> Result<()> {
        let policy = RetryPolicy::default();
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self
                .exec::<Vec<u8>>(target, command.clone(), None, None)
                .await
            {
                Ok(()) => return Ok(()),
                Err(err) if attempt < policy.attempts && is_transient(&err) => {
                    tracing::debug!(attempt, error = %err, "retrying pod command");
                    tokio::time::sleep(policy.delay(attempt)).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[async_trait]
impl Backend for K8sClient {
    async fn list(&self, path: &str) -> Result<Vec<String>> {
        let target = K8sPath::parse(path)?;
        let command = argv(&["find", &target.file_path, "-type", "f", "-name", "*"]);

        let policy = RetryPolicy::default();
        let mut attempt = 0;
        let output = loop {
            attempt += 1;
            let mut captured: Vec<u8> = Vec::new();
            match self
                .exec(&target, command.clone(), None, Some(&mut captured))
                .await
            {
                Ok(()) => break captured,
                Err(err) if attempt < policy.attempts && is_transient(&err) => {
                    tracing::debug!(attempt, error = %err, "retrying pod file listing");
                    tokio::time::sleep(policy.delay(attempt)).await;
                }
                Err(err) => return Err(err),
            }
        };

        let stdout = String::from_utf8_lossy(&output);
        Ok(parse_find_output(&stdout, &target.file_path))
    }

    async fn download(
        &self,
        from: &str,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<()> {
        let target = K8sPath::parse(from)?;
        // The sink is the transfer pipe; a re-run would stream the file's
        // bytes into it a second time. One attempt, like the stdin-fed copy.
        self.exec(&target, argv(&["cat", &target.file_path]), None, Some(sink))
            .await
    }

    async fn upload(&self, to: &str, _from: &str, source: ByteSource) -> Result<()> {
        let target = K8sPath::parse(to)?;

        self.exec_retry(&target, argv(&["mkdir", "-p", &target.parent_dir()]))
            .await?;
        self.exec_retry(&target, argv(&["touch", &target.file_path]))
            .await?;
        // The source is a one-shot stream, so the copy itself gets a single
        // attempt.
        self.exec::<Vec<u8>>(
            &target,
            argv(&["cp", "/dev/stdin", &target.file_path]),
            Some(source),
            None,
        )
        .await
    }
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|p| p.to_string()).collect()
}

/// Splits `find` stdout into lines and strips the search root from each,
/// skipping blanks and anything that escaped the root.
fn parse_find_output(stdout: &str, base: &str) -> Vec<String> {
    stdout
        .lines()
        .filter(|line| !line.is_empty())
        .filter_map(|line| relativize(line, base))
        .collect()
}
