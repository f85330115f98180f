//! Remote listings API capability.
//!
//! The sync engine only needs success/failure answers from the server; this
//! module defines that capability and the reqwest-backed implementation.

mod http;

use std::future::Future;

use thiserror::Error;

use crate::models::{Listing, ListingId};

pub use http::HttpListingsApi;

/// Upper bound on pages requested by [`fetch_all`].
const MAX_PAGES: usize = 10_000;

/// Outcome classes of a remote call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// Server rejected the payload (400)
    #[error("{0}")]
    Validation(String),
    /// Referenced listing is absent (404)
    #[error("{0}")]
    NotFound(String),
    /// Listing id already exists (409)
    #[error("{0}")]
    Conflict(String),
    /// Timeout, refused connection, 5xx, or an unreadable response
    #[error("{0}")]
    Unavailable(String),
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// The REST surface the client depends on.
///
/// Implementations must bound every call in time; a hung call must come back
/// as [`RemoteError::Unavailable`].
pub trait ListingsApi: Send + Sync + 'static {
    /// Health check against `GET /listings/ping`.
    fn ping(&self) -> impl Future<Output = RemoteResult<()>> + Send;

    /// One page of `GET /listings`; `page` is 1-based.
    fn list_page(
        &self,
        page: usize,
        limit: usize,
    ) -> impl Future<Output = RemoteResult<Vec<Listing>>> + Send;

    /// `GET /listings/{id}`.
    fn fetch(&self, id: &ListingId) -> impl Future<Output = RemoteResult<Listing>> + Send;

    fn create(&self, listing: &Listing) -> impl Future<Output = RemoteResult<Listing>> + Send;

    fn update(&self, listing: &Listing) -> impl Future<Output = RemoteResult<Listing>> + Send;

    fn delete(&self, id: &ListingId) -> impl Future<Output = RemoteResult<()>> + Send;
}

/// Fetch every listing by paging with explicit `page`/`limit` values.
///
/// Stops at the first short page. A page longer than `limit` means the
/// server ignored paging and already returned the whole set.
pub async fn fetch_all<R: ListingsApi>(remote: &R, page_size: usize) -> RemoteResult<Vec<Listing>> {
    let limit = page_size.max(1);
    let mut listings = Vec::new();

    for page in 1..=MAX_PAGES {
        let batch = remote.list_page(page, limit).await?;
        let batch_len = batch.len();
        if batch_len > limit {
            return Ok(batch);
        }
        listings.extend(batch);
        if batch_len < limit {
            break;
        }
    }

    Ok(listings)
}
