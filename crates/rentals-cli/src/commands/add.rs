use rentals_core::util::today;
use rentals_core::{ListingDraft, ListingId};

use crate::cli::AddArgs;
use crate::commands::common::{mutation_outcome, open_gateway, ClientOptions, Gateway};
use crate::error::CliError;

pub async fn run_add(args: AddArgs, options: &ClientOptions) -> Result<(), CliError> {
    let (gateway, _) = open_gateway(options).await?;
    let (id, outcome) = add_listing(&gateway, args).await?;
    println!("{id} {outcome}");
    Ok(())
}

pub async fn add_listing(gateway: &Gateway, args: AddArgs) -> Result<(ListingId, String), CliError> {
    let listing = gateway.add(draft_from_args(args)?).await?;
    let outcome = mutation_outcome(
        gateway.state().await,
        gateway.pending_changes_count().await,
    );
    Ok((listing.id, outcome))
}

pub fn draft_from_args(args: AddArgs) -> Result<ListingDraft, CliError> {
    let id = args.id.as_deref().map(str::parse::<ListingId>).transpose()?;
    Ok(ListingDraft {
        id,
        title: args.title,
        category: args.category,
        price: args.price,
        description: args.description,
        owner: args.owner,
        upload_date: args.upload_date.unwrap_or_else(today),
        location: args.location,
    })
}
