use rentals_core::{Listing, ListingPatch};

use crate::cli::UpdateArgs;
use crate::commands::common::{
    mutation_outcome, normalize_listing_id, open_gateway, ClientOptions, Gateway,
};
use crate::error::CliError;

pub async fn run_update(args: UpdateArgs, options: &ClientOptions) -> Result<(), CliError> {
    let (gateway, _) = open_gateway(options).await?;
    let listing = update_listing(&gateway, args).await?;
    let outcome = mutation_outcome(
        gateway.state().await,
        gateway.pending_changes_count().await,
    );
    println!("{} {outcome}", listing.id);
    Ok(())
}

/// Merge the given fields into the current listing and send the result.
pub async fn update_listing(gateway: &Gateway, args: UpdateArgs) -> Result<Listing, CliError> {
    let id = normalize_listing_id(&args.id)?;
    let patch = patch_from_args(args);
    if patch.is_empty() {
        return Err(CliError::EmptyUpdate);
    }
    patch.validate()?;

    let mut listing = gateway.find(&id).await?;
    listing.apply_patch(patch);
    Ok(gateway.update(listing).await?)
}

pub fn patch_from_args(args: UpdateArgs) -> ListingPatch {
    ListingPatch {
        title: args.title,
        category: args.category,
        price: args.price,
        description: args.description,
        owner: args.owner,
        upload_date: args.upload_date,
        location: args.location,
    }
}
