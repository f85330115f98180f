use std::time::Duration;

use rentals_core::monitor::ReconnectMonitor;
use rentals_core::SyncEvent;
use tokio::sync::broadcast::error::RecvError;

use crate::commands::common::{open_gateway, ClientOptions};
use crate::error::CliError;

pub async fn run_watch(interval: Option<Duration>, options: &ClientOptions) -> Result<(), CliError> {
    let (gateway, config) = open_gateway(options).await?;
    let interval = interval.unwrap_or(config.probe_interval);
    let mut events = gateway.subscribe().await;

    println!(
        "Watching {} every {}s ({}, {} pending). Press Ctrl-C to stop.",
        config.api_base_url,
        interval.as_secs(),
        gateway.state().await,
        gateway.pending_changes_count().await
    );
    let monitor = ReconnectMonitor::start(gateway.clone(), interval);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = &mut shutdown => {
                if let Err(error) = result {
                    tracing::warn!("Failed to listen for Ctrl-C: {}", error);
                }
                break;
            }
            event = events.recv() => match event {
                Ok(event) => println!("{}", describe_event(&event)),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Skipped {} sync events", skipped);
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    monitor.stop().await;
    Ok(())
}

pub fn describe_event(event: &SyncEvent) -> String {
    match event {
        SyncEvent::StateChanged { from, to } => format!("state: {from} -> {to}"),
        SyncEvent::Queued {
            kind,
            listing,
            pending,
        } => format!("queued {kind} {listing} ({pending} pending)"),
        SyncEvent::Replayed { kind, listing } => format!("replayed {kind} {listing}"),
        SyncEvent::DeadLettered {
            kind,
            listing,
            reason,
        } => format!("rejected {kind} {listing}: {reason}"),
        SyncEvent::DrainFinished {
            applied,
            dead_lettered,
            remaining,
        } => format!(
            "sync finished: {applied} applied, {dead_lettered} rejected, {remaining} remaining"
        ),
    }
}
