use std::collections::BTreeMap;

use rentals_core::gateway::count_by_category;
use rentals_core::queue::DeadLetter;
use rentals_core::{Category, ConnectivityState};
use serde::Serialize;

use crate::commands::common::{open_gateway, ClientOptions, Gateway};
use crate::commands::sync::format_dead_letter_lines;
use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub api_url: String,
    pub state: &'static str,
    pub pending: usize,
    pub dead_letters: Vec<DeadLetter>,
    pub listings: usize,
    pub categories: BTreeMap<Category, usize>,
}

pub async fn run_status(as_json: bool, options: &ClientOptions) -> Result<(), CliError> {
    let (gateway, config) = open_gateway(options).await?;
    let report = collect_status(&gateway, config.api_base_url).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for line in format_status_lines(&report) {
            println!("{line}");
        }
    }
    Ok(())
}

pub async fn collect_status(gateway: &Gateway, api_url: String) -> Result<StatusReport, CliError> {
    let listings = gateway.get().await?;
    let state: ConnectivityState = gateway.state().await;
    Ok(StatusReport {
        api_url,
        state: state.label(),
        pending: gateway.pending_changes_count().await,
        dead_letters: gateway.dead_letters().await,
        listings: listings.len(),
        categories: count_by_category(&listings),
    })
}

pub fn format_status_lines(report: &StatusReport) -> Vec<String> {
    let mut lines = vec![
        format!("API:      {}", report.api_url),
        format!("State:    {}", report.state),
        format!("Pending:  {}", report.pending),
        format!("Listings: {}", report.listings),
    ];
    for (category, count) in &report.categories {
        lines.push(format!("  {:<12} {count}", category.as_str()));
    }
    if !report.dead_letters.is_empty() {
        lines.push(format!("Rejected: {}", report.dead_letters.len()));
        lines.extend(
            format_dead_letter_lines(&report.dead_letters)
                .into_iter()
                .map(|line| format!("  {line}")),
        );
    }
    lines
}
