use crate::commands::common::{mutation_outcome, normalize_listing_id, open_gateway, ClientOptions};
use crate::error::CliError;

pub async fn run_delete(id: &str, options: &ClientOptions) -> Result<(), CliError> {
    let id = normalize_listing_id(id)?;
    let (gateway, _) = open_gateway(options).await?;

    gateway.delete(&id).await?;
    let outcome = mutation_outcome(
        gateway.state().await,
        gateway.pending_changes_count().await,
    );
    println!("{id} {outcome}");
    Ok(())
}
