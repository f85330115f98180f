//! Background reconnection probing.

use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::gateway::ListingGateway;
use crate::remote::ListingsApi;
use crate::storage::KeyValueStore;

/// Periodically calls [`ListingGateway::reconnect`] until stopped.
///
/// Dropping the monitor aborts the task, so a forgotten monitor never leaks
/// a timer.
#[derive(Debug)]
pub struct ReconnectMonitor {
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ReconnectMonitor {
    /// Spawn the probe loop. The first probe happens after one `interval`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<R, S>(gateway: ListingGateway<R, S>, interval: Duration) -> Self
    where
        R: ListingsApi,
        S: KeyValueStore,
    {
        let (shutdown, mut stopped) = oneshot::channel();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = &mut stopped => break,
                    _ = ticker.tick() => {
                        match gateway.reconnect().await {
                            Ok(state) => tracing::debug!("Reconnect probe finished: {}", state),
                            Err(error) => tracing::warn!("Reconnect attempt failed: {}", error),
                        }
                    }
                }
            }
            tracing::debug!("Reconnect monitor stopped");
        });

        Self {
            shutdown: Some(shutdown),
            handle: Some(handle),
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stop probing and wait for an in-flight reconnect to finish.
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(handle) = self.handle.take() {
            if let Err(error) = handle.await {
                if error.is_panic() {
                    tracing::error!("Reconnect monitor panicked: {}", error);
                }
            }
        }
    }
}

impl Drop for ReconnectMonitor {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
