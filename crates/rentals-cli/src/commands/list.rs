use rentals_core::gateway::{filter, sort};
use rentals_core::{Category, Listing, SortDirection, SortKey};

use crate::commands::common::{
    format_listing_lines, listing_to_item, open_gateway, ClientOptions, ListingItem,
};
use crate::error::CliError;

pub async fn run_list(
    category: Option<Category>,
    sort_key: Option<SortKey>,
    direction: SortDirection,
    as_json: bool,
    options: &ClientOptions,
) -> Result<(), CliError> {
    let (gateway, _) = open_gateway(options).await?;
    let listings = select_listings(&gateway.get().await?, category, sort_key, direction);

    if as_json {
        let json_items = listings
            .iter()
            .map(listing_to_item)
            .collect::<Vec<ListingItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else if listings.is_empty() {
        println!("No listings.");
    } else {
        for line in format_listing_lines(&listings) {
            println!("{line}");
        }
    }

    Ok(())
}

/// Filter first, then sort; without a sort key the server order is kept.
pub fn select_listings(
    listings: &[Listing],
    category: Option<Category>,
    sort_key: Option<SortKey>,
    direction: SortDirection,
) -> Vec<Listing> {
    let filtered = filter(listings, category);
    match sort_key {
        Some(key) => sort(&filtered, key, direction),
        None => filtered,
    }
}
