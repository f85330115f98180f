use std::time::Duration;

use rentals_core::demo::sample_listings;

use crate::commands::common::{mutation_outcome, open_gateway, ClientOptions, Gateway};
use crate::error::CliError;

pub async fn run_seed(
    interval: Duration,
    count: Option<usize>,
    options: &ClientOptions,
) -> Result<(), CliError> {
    let (gateway, _) = open_gateway(options).await?;
    let added = seed_listings(&gateway, interval, count, |line| println!("{line}")).await?;
    println!("Added {added} listing(s)");
    Ok(())
}

/// Add demo listings one per `interval`, reporting each through `on_added`.
pub async fn seed_listings(
    gateway: &Gateway,
    interval: Duration,
    count: Option<usize>,
    mut on_added: impl FnMut(String),
) -> Result<usize, CliError> {
    let drafts = sample_listings();
    let total = count.unwrap_or(drafts.len()).min(drafts.len());
    let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));

    for draft in drafts.into_iter().take(total) {
        ticker.tick().await;
        let listing = gateway.add(draft).await?;
        let outcome = mutation_outcome(
            gateway.state().await,
            gateway.pending_changes_count().await,
        );
        on_added(format!("{} {} {outcome}", listing.id, listing.title));
    }

    Ok(total)
}
