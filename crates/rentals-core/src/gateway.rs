//! Public façade over the sync engine plus pure listing helpers.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate};
use tokio::sync::{broadcast, Mutex};

use crate::models::{Category, Listing, ListingDraft, ListingId};
use crate::queue::{DeadLetter, QueueItem};
use crate::remote::ListingsApi;
use crate::storage::KeyValueStore;
use crate::sync::{ConnectivityState, SyncEngine, SyncEvent, SyncOptions};
use crate::{Error, Result};

/// Shared handle to a [`SyncEngine`].
///
/// All operations serialize on one lock, so a background reconnect can never
/// overlap a mutation or another drain.
pub struct ListingGateway<R: ListingsApi, S: KeyValueStore> {
    engine: Arc<Mutex<SyncEngine<R, S>>>,
}

impl<R: ListingsApi, S: KeyValueStore> Clone for ListingGateway<R, S> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
        }
    }
}

impl<R: ListingsApi, S: KeyValueStore> fmt::Debug for ListingGateway<R, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListingGateway").finish_non_exhaustive()
    }
}

impl<R: ListingsApi, S: KeyValueStore> ListingGateway<R, S> {
    /// Build the engine (probing the server) and wrap it.
    pub async fn connect(remote: R, store: S, options: SyncOptions) -> Result<Self> {
        let engine = SyncEngine::new(remote, store, options).await?;
        Ok(Self::from_engine(engine))
    }

    pub fn from_engine(engine: SyncEngine<R, S>) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
        }
    }

    pub async fn get(&self) -> Result<Vec<Listing>> {
        self.engine.lock().await.get().await
    }

    pub async fn add(&self, draft: ListingDraft) -> Result<Listing> {
        self.engine.lock().await.add(draft).await
    }

    pub async fn update(&self, listing: Listing) -> Result<Listing> {
        self.engine.lock().await.update(listing).await
    }

    pub async fn delete(&self, id: &ListingId) -> Result<()> {
        self.engine.lock().await.delete(id).await
    }

    /// Look a listing up in the current view of the data.
    pub async fn find(&self, id: &ListingId) -> Result<Listing> {
        self.get()
            .await?
            .into_iter()
            .find(|listing| &listing.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    pub async fn reconnect(&self) -> Result<ConnectivityState> {
        self.engine.lock().await.reconnect().await
    }

    pub async fn set_operator_offline(&self, offline: bool) -> Result<ConnectivityState> {
        self.engine.lock().await.set_operator_offline(offline).await
    }

    pub async fn state(&self) -> ConnectivityState {
        self.engine.lock().await.state()
    }

    pub async fn pending_changes_count(&self) -> usize {
        self.engine.lock().await.pending_changes_count()
    }

    pub async fn pending_changes(&self) -> Vec<QueueItem> {
        self.engine.lock().await.pending_changes().to_vec()
    }

    pub async fn dead_letters(&self) -> Vec<DeadLetter> {
        self.engine.lock().await.dead_letters().to_vec()
    }

    pub async fn clear_dead_letters(&self) -> Result<usize> {
        self.engine.lock().await.clear_dead_letters()
    }

    pub async fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.engine.lock().await.subscribe()
    }
}

/// Field used by [`sort`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Price,
    UploadDate,
}

impl FromStr for SortKey {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "price" => Ok(Self::Price),
            "uploaddate" | "upload-date" | "upload_date" | "date" => Ok(Self::UploadDate),
            other => Err(Error::Validation(format!(
                "Unknown sort key '{other}' (expected price or uploadDate)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortDirection {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Asc),
            "desc" | "descending" => Ok(Self::Desc),
            other => Err(Error::Validation(format!(
                "Unknown sort direction '{other}' (expected asc or desc)"
            ))),
        }
    }
}

/// Keep listings in `category`, preserving order. `None` keeps everything.
#[must_use]
pub fn filter(listings: &[Listing], category: Option<Category>) -> Vec<Listing> {
    listings
        .iter()
        .filter(|listing| match category {
            Some(category) => listing.category == category,
            None => true,
        })
        .cloned()
        .collect()
}

/// Stable sort by `key` in `direction`.
///
/// Upload dates are parsed as `YYYY-MM-DD` or RFC 3339. Listings whose date
/// does not parse keep their relative order and go after every dated listing
/// in both directions.
#[must_use]
pub fn sort(listings: &[Listing], key: SortKey, direction: SortDirection) -> Vec<Listing> {
    let mut sorted = listings.to_vec();
    match key {
        SortKey::Price => sorted.sort_by(|a, b| directed(a.price.cmp(&b.price), direction)),
        SortKey::UploadDate => sorted.sort_by(|a, b| {
            match (parse_upload_date(&a.upload_date), parse_upload_date(&b.upload_date)) {
                (Some(a), Some(b)) => directed(a.cmp(&b), direction),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        }),
    }
    sorted
}

/// Listing count per category, in declaration order.
#[must_use]
pub fn count_by_category(listings: &[Listing]) -> BTreeMap<Category, usize> {
    let mut counts = BTreeMap::new();
    for listing in listings {
        *counts.entry(listing.category).or_insert(0) += 1;
    }
    counts
}

fn directed(ordering: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

fn parse_upload_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
}
