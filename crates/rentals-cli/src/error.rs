use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] rentals_core::Error),
    #[error(transparent)]
    Config(#[from] rentals_core::config::ConfigError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Listing ID cannot be empty")]
    EmptyListingId,
    #[error("Nothing to update: pass at least one field")]
    EmptyUpdate,
    #[error("Could not determine a data directory; pass --db-path or set RENTALS_DB_PATH")]
    NoDataDir,
}
