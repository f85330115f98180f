//! Last-known-good snapshot of listings.

use crate::models::Listing;
use crate::queue::Mutation;
use crate::storage::{KeyValueStore, LISTINGS_KEY};
use crate::Result;

/// Passive listing snapshot persisted through the key-value capability.
#[derive(Debug, Clone)]
pub struct LocalCache<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> LocalCache<S> {
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Cached listings; an absent snapshot reads as empty.
    pub fn read(&self) -> Result<Vec<Listing>> {
        match self.store.read(LISTINGS_KEY)? {
            Some(raw) if !raw.trim().is_empty() => match serde_json::from_str(&raw) {
                Ok(listings) => Ok(listings),
                Err(error) => {
                    tracing::warn!("Discarding unreadable listing snapshot: {}", error);
                    Ok(Vec::new())
                }
            },
            _ => Ok(Vec::new()),
        }
    }

    /// Replace the snapshot.
    pub fn write(&self, listings: &[Listing]) -> Result<()> {
        self.store
            .write(LISTINGS_KEY, &serde_json::to_string(listings)?)
    }

    /// Apply one mutation to the snapshot in place.
    ///
    /// Add replaces an existing entry with the same id instead of duplicating
    /// it; Update of an unknown id appends; Delete of an unknown id is a no-op.
    pub fn apply_mutation(&self, mutation: &Mutation) -> Result<()> {
        let mut listings = self.read()?;
        match mutation {
            Mutation::Add(listing) | Mutation::Update(listing) => {
                if let Some(existing) = listings.iter_mut().find(|entry| entry.id == listing.id) {
                    *existing = listing.clone();
                } else {
                    listings.push(listing.clone());
                }
            }
            Mutation::Delete(id) => listings.retain(|entry| &entry.id != id),
        }
        self.write(&listings)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::storage::MemoryStore;
    use crate::test_support::sample_listing;

    #[test]
    fn missing_snapshot_reads_empty() {
        let cache = LocalCache::new(MemoryStore::new());
        assert!(cache.read().unwrap().is_empty());
    }

    #[test]
    fn corrupt_snapshot_reads_empty() {
        let store = MemoryStore::new();
        store.write(LISTINGS_KEY, "{not json").unwrap();
        assert!(LocalCache::new(store).read().unwrap().is_empty());
    }

    #[test]
    fn apply_mutation_add_update_delete() {
        let cache = LocalCache::new(MemoryStore::new());
        cache
            .apply_mutation(&Mutation::Add(sample_listing("a")))
            .unwrap();
        cache
            .apply_mutation(&Mutation::Add(sample_listing("b")))
            .unwrap();

        let mut changed = sample_listing("a");
        changed.price = 99;
        cache.apply_mutation(&Mutation::Update(changed)).unwrap();
        cache
            .apply_mutation(&Mutation::Delete("b".parse().unwrap()))
            .unwrap();

        let listings = cache.read().unwrap();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].id.as_str(), "a");
        assert_eq!(listings[0].price, 99);
    }

    #[test]
    fn duplicate_add_does_not_duplicate() {
        let cache = LocalCache::new(MemoryStore::new());
        cache
            .apply_mutation(&Mutation::Add(sample_listing("a")))
            .unwrap();
        cache
            .apply_mutation(&Mutation::Add(sample_listing("a")))
            .unwrap();
        assert_eq!(cache.read().unwrap().len(), 1);
    }
}
