//! Test doubles shared by the unit tests in this crate.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::models::{Category, Listing, ListingDraft, ListingId};
use crate::remote::{ListingsApi, RemoteError, RemoteResult};
use crate::storage::{KeyValueStore, MemoryStore};
use crate::{Error, Result};

pub fn sample_listing(id: &str) -> Listing {
    Listing {
        id: id.parse().unwrap(),
        title: format!("Listing {id}"),
        category: Category::Garden,
        price: 15,
        description: "Electric lawn mower available for short-term rental.".to_string(),
        owner: "user1".to_string(),
        upload_date: "2025-03-20".to_string(),
        location: "Cluj".to_string(),
    }
}

pub fn sample_draft(id: &str) -> ListingDraft {
    ListingDraft::from(sample_listing(id))
}

/// In-memory listings server that records every call.
#[derive(Clone, Debug, Default)]
pub struct FakeListingsApi {
    state: Arc<Mutex<FakeState>>,
}

#[derive(Debug, Default)]
struct FakeState {
    listings: Vec<Listing>,
    unreachable: bool,
    latency: Option<Duration>,
    calls: Vec<String>,
    mutation_calls: usize,
    fail_mutation_at: Option<usize>,
}

impl FakeListingsApi {
    fn with_state<T>(&self, f: impl FnOnce(&mut FakeState) -> T) -> T {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }

    pub fn seed(&self, listings: impl IntoIterator<Item = Listing>) {
        self.with_state(|state| state.listings.extend(listings));
    }

    pub fn listings(&self) -> Vec<Listing> {
        self.with_state(|state| state.listings.clone())
    }

    /// Change server-side data without recording a call.
    pub fn with_listings_mut(&self, f: impl FnOnce(&mut Vec<Listing>)) {
        self.with_state(|state| f(&mut state.listings));
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.with_state(|state| state.unreachable = !reachable);
    }

    pub fn set_latency(&self, latency: Duration) {
        self.with_state(|state| state.latency = Some(latency));
    }

    /// Make the `n`th mutation call from now (1-based) fail as unavailable.
    pub fn fail_mutation_at(&self, n: usize) {
        self.with_state(|state| {
            state.fail_mutation_at = Some(state.mutation_calls + n);
        });
    }

    pub fn calls(&self) -> Vec<String> {
        self.with_state(|state| state.calls.clone())
    }

    pub fn clear_calls(&self) {
        self.with_state(|state| state.calls.clear());
    }

    async fn enter(&self, call: String) -> RemoteResult<()> {
        let latency = self.with_state(|state| state.latency);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        self.with_state(|state| {
            state.calls.push(call);
            if state.unreachable {
                Err(RemoteError::Unavailable("connection refused".to_string()))
            } else {
                Ok(())
            }
        })
    }

    async fn enter_mutation(&self, call: String) -> RemoteResult<()> {
        self.enter(call).await?;
        self.with_state(|state| {
            state.mutation_calls += 1;
            if state.fail_mutation_at == Some(state.mutation_calls) {
                Err(RemoteError::Unavailable("HTTP 503".to_string()))
            } else {
                Ok(())
            }
        })
    }
}

fn not_found() -> RemoteError {
    RemoteError::NotFound("Listing not found (404)".to_string())
}

impl ListingsApi for FakeListingsApi {
    async fn ping(&self) -> RemoteResult<()> {
        self.enter("ping".to_string()).await
    }

    async fn list_page(&self, page: usize, limit: usize) -> RemoteResult<Vec<Listing>> {
        self.enter(format!("list:{page}:{limit}")).await?;
        Ok(self.with_state(|state| {
            state
                .listings
                .iter()
                .skip((page.max(1) - 1) * limit)
                .take(limit)
                .cloned()
                .collect()
        }))
    }

    async fn fetch(&self, id: &ListingId) -> RemoteResult<Listing> {
        self.enter(format!("fetch:{id}")).await?;
        self.with_state(|state| {
            state
                .listings
                .iter()
                .find(|entry| &entry.id == id)
                .cloned()
                .ok_or_else(not_found)
        })
    }

    async fn create(&self, listing: &Listing) -> RemoteResult<Listing> {
        self.enter_mutation(format!("create:{}", listing.id)).await?;
        listing
            .validate()
            .map_err(|error| RemoteError::Validation(error.to_string()))?;
        self.with_state(|state| {
            if state.listings.iter().any(|entry| entry.id == listing.id) {
                return Err(RemoteError::Conflict("duplicate id (409)".to_string()));
            }
            state.listings.push(listing.clone());
            Ok(listing.clone())
        })
    }

    async fn update(&self, listing: &Listing) -> RemoteResult<Listing> {
        self.enter_mutation(format!("update:{}", listing.id)).await?;
        listing
            .validate()
            .map_err(|error| RemoteError::Validation(error.to_string()))?;
        self.with_state(|state| {
            let existing = state
                .listings
                .iter_mut()
                .find(|entry| entry.id == listing.id)
                .ok_or_else(not_found)?;
            *existing = listing.clone();
            Ok(listing.clone())
        })
    }

    async fn delete(&self, id: &ListingId) -> RemoteResult<()> {
        self.enter_mutation(format!("delete:{id}")).await?;
        self.with_state(|state| {
            let before = state.listings.len();
            state.listings.retain(|entry| &entry.id != id);
            if state.listings.len() == before {
                Err(not_found())
            } else {
                Ok(())
            }
        })
    }
}

/// Memory store whose writes can be switched off, globally or per key.
#[derive(Clone, Debug, Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    fail_writes: Arc<AtomicBool>,
    failing_key: Arc<Mutex<Option<String>>>,
}

impl FlakyStore {
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Fail writes and removals of `key` only.
    pub fn fail_writes_to(&self, key: Option<&str>) {
        *self.failing_key.lock().unwrap() = key.map(str::to_string);
    }

    fn check(&self, key: &str) -> Result<()> {
        let key_fails = self.failing_key.lock().unwrap().as_deref() == Some(key);
        if key_fails || self.fail_writes.load(Ordering::SeqCst) {
            Err(Error::StorageUnavailable("disk full".to_string()))
        } else {
            Ok(())
        }
    }
}

impl KeyValueStore for FlakyStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        self.inner.read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        self.check(key)?;
        self.inner.write(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.check(key)?;
        self.inner.remove(key)
    }
}
