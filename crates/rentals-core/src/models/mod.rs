//! Data models for Rentals

mod category;
mod listing;

pub use category::{Category, ParseCategoryError};
pub use listing::{Listing, ListingDraft, ListingId, ListingPatch};
