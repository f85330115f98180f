use std::env;
use std::path::{Path, PathBuf};

use rentals_core::config::ClientConfig;
use rentals_core::remote::HttpListingsApi;
use rentals_core::storage::SqliteStore;
use rentals_core::sync::SyncOptions;
use rentals_core::util::compact_text;
use rentals_core::{ConnectivityState, Listing, ListingGateway, ListingId};
use serde::Serialize;

use crate::error::CliError;

pub type Gateway = ListingGateway<HttpListingsApi, SqliteStore>;

/// Options shared by every command that touches listings.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub db_path: PathBuf,
    pub api_url: Option<String>,
    pub offline: bool,
}

#[derive(Debug, Serialize)]
pub struct ListingItem {
    pub id: String,
    pub title: String,
    pub category: String,
    pub price: i64,
    pub description: String,
    pub owner: String,
    pub upload_date: String,
    pub location: String,
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> Result<PathBuf, CliError> {
    if let Some(path) = cli_db_path.or_else(|| env::var_os("RENTALS_DB_PATH").map(PathBuf::from)) {
        return Ok(path);
    }
    default_db_path()
}

pub fn default_db_path() -> Result<PathBuf, CliError> {
    dirs::data_dir()
        .map(|dir| dir.join("rentals").join("rentals.db"))
        .ok_or(CliError::NoDataDir)
}

pub fn load_client_config(api_url: Option<&str>) -> Result<ClientConfig, CliError> {
    let config = ClientConfig::from_env()?;
    match api_url {
        Some(url) => Ok(config.with_api_base_url(url)?),
        None => Ok(config),
    }
}

/// Open the local cache and connect to the API, replaying queued changes if
/// the server is reachable.
pub async fn open_gateway(options: &ClientOptions) -> Result<(Gateway, ClientConfig), CliError> {
    let config = load_client_config(options.api_url.as_deref())?;
    let gateway = open_gateway_with(&config, &options.db_path, options.offline).await?;
    Ok((gateway, config))
}

pub async fn open_gateway_with(
    config: &ClientConfig,
    db_path: &Path,
    offline: bool,
) -> Result<Gateway, CliError> {
    let store = SqliteStore::open(db_path)?;
    let remote = HttpListingsApi::new(config)?;
    let options = SyncOptions {
        operator_offline: offline,
        ..SyncOptions::from(config)
    };
    tracing::debug!(
        db_path = %db_path.display(),
        api = remote.base_url(),
        offline,
        "Opening listing gateway"
    );
    Ok(ListingGateway::connect(remote, store, options).await?)
}

pub fn normalize_listing_id(id: &str) -> Result<ListingId, CliError> {
    id.parse().map_err(|_| CliError::EmptyListingId)
}

/// One-line summary printed after a mutation.
pub fn mutation_outcome(state: ConnectivityState, pending: usize) -> String {
    if state == ConnectivityState::Online {
        "saved".to_string()
    } else {
        format!("queued ({state}, {pending} pending)")
    }
}

pub fn listing_to_item(listing: &Listing) -> ListingItem {
    ListingItem {
        id: listing.id.to_string(),
        title: listing.title.clone(),
        category: listing.category.to_string(),
        price: listing.price,
        description: listing.description.clone(),
        owner: listing.owner.clone(),
        upload_date: listing.upload_date.clone(),
        location: listing.location.clone(),
    }
}

pub fn format_listing_lines(listings: &[Listing]) -> Vec<String> {
    listings
        .iter()
        .map(|listing| {
            format!(
                "{}  {:<12} {:>6}  {}  {} ({}, {})",
                short_id(&listing.id),
                listing.category.as_str(),
                listing.price,
                listing.upload_date,
                compact_text(&listing.title),
                listing.owner,
                listing.location
            )
        })
        .collect()
}

/// First 8 characters of an id, enough to tell listings apart in a table.
pub fn short_id(id: &ListingId) -> &str {
    let id = id.as_str();
    id.char_indices().nth(8).map_or(id, |(index, _)| &id[..index])
}
