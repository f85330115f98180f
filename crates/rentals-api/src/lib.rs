//! rentals-api - REST API serving rental listings
//!
//! Listings live in memory for the lifetime of the process.

pub mod config;
pub mod error;
pub mod routes;
pub mod store;
pub mod validation;

use std::sync::Arc;

use rentals_core::demo;

pub use config::{AppConfig, ConfigError};
pub use error::AppError;
pub use routes::{app_router, AppState};

/// Build the shared state, seeding the demo listings when configured.
pub async fn init_state(config: Arc<AppConfig>) -> Result<AppState, AppError> {
    let state = AppState::from_config(config);
    if state.config.seed_demo {
        let seeded = state.store.seed(demo::server_seed()).await?;
        tracing::info!("Seeded {} demo listings", seeded);
    }
    Ok(state)
}
