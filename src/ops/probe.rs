//! Advisory reachability checks against the SSH port.
//!
//! A successful probe only means the port accepted a TCP connection. Results
//! annotate menu entries and never gate a launch.

use crate::catalog::Catalog;
use std::collections::BTreeSet;
use std::sync::mpsc::Sender;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

pub const DEFAULT_PORT: u16 = 22;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostStatus {
    Unknown,
    Online,
    Offline,
}

impl HostStatus {
    pub fn label(&self) -> &'static str {
        match self {
            HostStatus::Unknown => "…",
            HostStatus::Online => "online",
            HostStatus::Offline => "offline",
        }
    }
}

impl From<bool> for HostStatus {
    fn from(reachable: bool) -> Self {
        if reachable {
            HostStatus::Online
        } else {
            HostStatus::Offline
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub host: String,
    pub status: HostStatus,
}

/// Connects to `host:port` within `timeout`. Refusal, timeout and name
/// resolution failures all read as `false`.
pub async fn probe(host: &str, port: u16, timeout: Duration) -> bool {
    match tokio::time::timeout(timeout, TcpStream::connect((host, port))).await {
        Ok(Ok(_stream)) => true,
        Ok(Err(e)) => {
            tracing::debug!(%host, port, error = %e, "probe failed");
            false
        }
        Err(_) => {
            tracing::debug!(%host, port, ?timeout, "probe timed out");
            false
        }
    }
}

/// Probes every distinct host of the catalog, one task each, and sends each
/// result as soon as it is known.
pub fn probe_catalog(
    catalog: &Catalog,
    port: u16,
    timeout: Duration,
    results: Sender<ProbeResult>,
) -> Vec<JoinHandle<()>> {
    let hosts: BTreeSet<String> = catalog.servers.iter().map(|s| s.host.clone()).collect();

    hosts
        .into_iter()
        .map(|host| {
            let results = results.clone();
            tokio::spawn(async move {
                let status = HostStatus::from(probe(&host, port, timeout).await);
                // The receiver may be gone if the launcher already quit.
                let _ = results.send(ProbeResult { host, status });
            })
        })
        .collect()
}
