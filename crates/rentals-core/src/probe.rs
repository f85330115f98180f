//! Reachability check against the remote API.

use std::time::Duration;

use crate::remote::ListingsApi;

/// What a single probe concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reachability {
    Online,
    ServerDown,
}

/// Single round-trip health check with a hard deadline.
///
/// Does not retry; the caller owns the retry cadence.
#[derive(Debug, Clone, Copy)]
pub struct ConnectivityProbe {
    timeout: Duration,
}

impl ConnectivityProbe {
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Ping the remote once; errors and timeouts both mean `ServerDown`.
    pub async fn probe<R: ListingsApi>(&self, remote: &R) -> Reachability {
        match tokio::time::timeout(self.timeout, remote.ping()).await {
            Ok(Ok(())) => Reachability::Online,
            Ok(Err(error)) => {
                tracing::debug!("Probe failed: {}", error);
                Reachability::ServerDown
            }
            Err(_) => {
                tracing::debug!("Probe timed out after {:?}", self.timeout);
                Reachability::ServerDown
            }
        }
    }
}
