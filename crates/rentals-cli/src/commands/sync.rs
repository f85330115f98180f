use rentals_core::queue::DeadLetter;
use rentals_core::ConnectivityState;

use crate::commands::common::{open_gateway, ClientOptions};
use crate::error::CliError;

pub async fn run_sync(options: &ClientOptions) -> Result<(), CliError> {
    let (gateway, _) = open_gateway(options).await?;

    let state = gateway.reconnect().await?;
    let pending = gateway.pending_changes_count().await;
    match state {
        ConnectivityState::Online => println!("Sync completed"),
        ConnectivityState::OperatorOffline => {
            println!("Offline mode is on; {pending} change(s) waiting");
        }
        _ => println!("Server unreachable; {pending} change(s) still pending"),
    }

    for line in format_dead_letter_lines(&gateway.dead_letters().await) {
        println!("{line}");
    }
    Ok(())
}

pub fn format_dead_letter_lines(dead_letters: &[DeadLetter]) -> Vec<String> {
    dead_letters
        .iter()
        .map(|letter| {
            format!(
                "rejected {} {}: {}",
                letter.item.mutation.kind(),
                letter.item.mutation.listing_id(),
                letter.reason
            )
        })
        .collect()
}
