//! Kubernetes exec backend
//!
//! Files inside a running container are listed, read, and written by
//! exec-tunneling plain shell commands (`find`, `cat`, `mkdir`, `touch`,
//! `cp`) over the cluster's remote-command stream protocol, with the
//! command's stdio multiplexed across one WebSocket.

mod client;
mod path;

pub use client::K8sClient;
pub use path::K8sPath;
