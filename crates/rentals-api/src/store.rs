//! In-memory listing store owned by the server process.

use rentals_core::models::{Listing, ListingDraft, ListingId, ListingPatch};
use tokio::sync::RwLock;

use crate::error::AppError;

/// A window over the listing sequence, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: usize,
    pub limit: usize,
}

#[derive(Debug, Default)]
pub struct ListingStore {
    listings: RwLock<Vec<Listing>>,
}

impl ListingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listings in insertion order, optionally sliced to `page`.
    pub async fn list(&self, page: Option<Page>) -> Vec<Listing> {
        let listings = self.listings.read().await;
        match page {
            None => listings.clone(),
            Some(Page { page, limit }) => listings
                .iter()
                .skip(page.saturating_sub(1).saturating_mul(limit))
                .take(limit)
                .cloned()
                .collect(),
        }
    }

    pub async fn get(&self, id: &ListingId) -> Option<Listing> {
        self.listings
            .read()
            .await
            .iter()
            .find(|listing| &listing.id == id)
            .cloned()
    }

    /// Insert a listing, assigning an id when the draft has none.
    pub async fn create(&self, draft: ListingDraft) -> Result<Listing, AppError> {
        let listing = draft.into_listing();
        let mut listings = self.listings.write().await;
        if listings.iter().any(|existing| existing.id == listing.id) {
            return Err(AppError::conflict(format!(
                "Listing {} already exists",
                listing.id
            )));
        }
        listings.push(listing.clone());
        Ok(listing)
    }

    /// Merge `patch` into the listing with `id`.
    pub async fn update(&self, id: &ListingId, patch: ListingPatch) -> Option<Listing> {
        let mut listings = self.listings.write().await;
        let listing = listings.iter_mut().find(|listing| &listing.id == id)?;
        listing.apply_patch(patch);
        Some(listing.clone())
    }

    /// Remove a listing, returning whether it existed.
    pub async fn delete(&self, id: &ListingId) -> bool {
        let mut listings = self.listings.write().await;
        let before = listings.len();
        listings.retain(|listing| &listing.id != id);
        listings.len() != before
    }

    pub async fn reset(&self) {
        self.listings.write().await.clear();
    }

    pub async fn seed(
        &self,
        drafts: impl IntoIterator<Item = ListingDraft>,
    ) -> Result<usize, AppError> {
        let mut created = 0;
        for draft in drafts {
            self.create(draft).await?;
            created += 1;
        }
        Ok(created)
    }

    pub async fn len(&self) -> usize {
        self.listings.read().await.len()
    }
}
