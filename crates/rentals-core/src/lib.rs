//! rentals-core - Core library for Rentals
//!
//! This crate contains the listing model, the local persistence layer, and the
//! offline-first sync engine shared by the API server and the CLI.

pub mod cache;
pub mod config;
pub mod demo;
pub mod error;
pub mod gateway;
pub mod models;
pub mod monitor;
pub mod probe;
pub mod queue;
pub mod remote;
pub mod storage;
pub mod sync;
pub mod util;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{Error, Result};
pub use gateway::{ListingGateway, SortDirection, SortKey};
pub use models::{Category, Listing, ListingDraft, ListingId, ListingPatch};
pub use sync::{ConnectivityState, SyncEngine, SyncEvent};
