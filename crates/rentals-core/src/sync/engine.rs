//! The sync engine: routes each operation to the server or the offline queue.

use std::time::Duration;

use tokio::sync::broadcast;

use super::{ConnectivityState, SyncEvent};
use crate::cache::LocalCache;
use crate::config::ClientConfig;
use crate::models::{Listing, ListingDraft, ListingId};
use crate::probe::{ConnectivityProbe, Reachability};
use crate::queue::{ApplyOutcome, DeadLetter, DrainReport, Mutation, OfflineQueue, QueueItem};
use crate::remote::{fetch_all, ListingsApi, RemoteError};
use crate::storage::KeyValueStore;
use crate::{Error, Result};

const EVENT_CAPACITY: usize = 64;

/// Knobs for [`SyncEngine::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    pub probe_timeout: Duration,
    pub page_size: usize,
    /// Start in `OperatorOffline` without probing
    pub operator_offline: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self::from(&ClientConfig::default())
    }
}

impl From<&ClientConfig> for SyncOptions {
    fn from(config: &ClientConfig) -> Self {
        Self {
            probe_timeout: config.request_timeout,
            page_size: config.page_size,
            operator_offline: false,
        }
    }
}

/// Owns connectivity state, the offline queue, and the local cache.
///
/// Operations take `&mut self`; share the engine behind a single mutex when
/// more than one task needs it (see [`crate::ListingGateway`]).
#[derive(Debug)]
pub struct SyncEngine<R: ListingsApi, S: KeyValueStore> {
    remote: R,
    cache: LocalCache<S>,
    queue: OfflineQueue<S>,
    probe: ConnectivityProbe,
    page_size: usize,
    state: ConnectivityState,
    events: broadcast::Sender<SyncEvent>,
}

impl<R: ListingsApi, S: KeyValueStore> SyncEngine<R, S> {
    /// Load persisted state and probe the server.
    ///
    /// A reachable server immediately drains anything queued by a previous run.
    pub async fn new(remote: R, store: S, options: SyncOptions) -> Result<Self> {
        let queue = OfflineQueue::open(store.clone())?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let mut engine = Self {
            remote,
            cache: LocalCache::new(store),
            queue,
            probe: ConnectivityProbe::new(options.probe_timeout),
            page_size: options.page_size,
            state: if options.operator_offline {
                ConnectivityState::OperatorOffline
            } else {
                ConnectivityState::ServerDown
            },
            events,
        };

        if !engine.queue.is_empty() {
            tracing::info!(
                "Loaded {} pending change(s) from a previous session",
                engine.queue.len()
            );
        }
        engine.reconnect().await?;
        Ok(engine)
    }

    pub const fn state(&self) -> ConnectivityState {
        self.state
    }

    /// Number of mutations not yet confirmed by the server.
    pub fn pending_changes_count(&self) -> usize {
        self.queue.len()
    }

    pub fn pending_changes(&self) -> &[QueueItem] {
        self.queue.items()
    }

    /// Mutations the server refused during replay.
    pub fn dead_letters(&self) -> &[DeadLetter] {
        self.queue.dead_letters()
    }

    pub fn clear_dead_letters(&mut self) -> Result<usize> {
        self.queue.clear_dead_letters()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    pub const fn remote(&self) -> &R {
        &self.remote
    }

    /// Listings as best known: from the server when online, else the cache.
    pub async fn get(&mut self) -> Result<Vec<Listing>> {
        if self.state != ConnectivityState::Online {
            return self.cache.read();
        }

        match fetch_all(&self.remote, self.page_size).await {
            Ok(listings) => {
                self.cache.write(&listings)?;
                Ok(listings)
            }
            Err(error) => {
                self.mark_server_down(&error);
                self.cache.read()
            }
        }
    }

    /// Create a listing, generating a client id when the draft has none.
    pub async fn add(&mut self, draft: ListingDraft) -> Result<Listing> {
        let listing = draft.into_listing();
        listing.validate()?;

        if self.state == ConnectivityState::Online {
            match self.remote.create(&listing).await {
                Ok(created) => {
                    self.refresh_cached(&Mutation::Add(created.clone()));
                    return Ok(created);
                }
                Err(RemoteError::Unavailable(reason)) => self.mark_server_down(&reason),
                Err(error) => return Err(error.into()),
            }
        }

        self.ensure_absent(&listing.id)?;
        self.queue_mutation(Mutation::Add(listing.clone()))?;
        Ok(listing)
    }

    /// Replace a listing with `listing` (matched by id).
    pub async fn update(&mut self, listing: Listing) -> Result<Listing> {
        listing.validate()?;

        if self.state == ConnectivityState::Online {
            match self.remote.update(&listing).await {
                Ok(updated) => {
                    self.refresh_cached(&Mutation::Update(updated.clone()));
                    return Ok(updated);
                }
                Err(RemoteError::Unavailable(reason)) => self.mark_server_down(&reason),
                Err(error) => return Err(error.into()),
            }
        }

        self.ensure_cached(&listing.id)?;
        self.queue_mutation(Mutation::Update(listing.clone()))?;
        Ok(listing)
    }

    pub async fn delete(&mut self, id: &ListingId) -> Result<()> {
        if self.state == ConnectivityState::Online {
            match self.remote.delete(id).await {
                Ok(()) => {
                    self.refresh_cached(&Mutation::Delete(id.clone()));
                    return Ok(());
                }
                Err(RemoteError::Unavailable(reason)) => self.mark_server_down(&reason),
                Err(error) => return Err(error.into()),
            }
        }

        self.ensure_cached(id)?;
        self.queue_mutation(Mutation::Delete(id.clone()))?;
        Ok(())
    }

    /// Set or clear the operator-offline flag.
    ///
    /// Clearing it re-probes, which may drain the queue.
    pub async fn set_operator_offline(&mut self, offline: bool) -> Result<ConnectivityState> {
        if offline {
            self.transition(ConnectivityState::OperatorOffline);
            return Ok(self.state);
        }

        if self.state == ConnectivityState::OperatorOffline {
            self.transition(ConnectivityState::ServerDown);
        }
        self.reconnect().await
    }

    /// Probe the server and, when it answers, replay the queue.
    ///
    /// Suppressed entirely while operator-offline.
    pub async fn reconnect(&mut self) -> Result<ConnectivityState> {
        if self.state == ConnectivityState::OperatorOffline {
            tracing::debug!("Operator offline; skipping probe");
            return Ok(self.state);
        }

        match self.probe.probe(&self.remote).await {
            Reachability::ServerDown => {
                self.transition(ConnectivityState::ServerDown);
            }
            Reachability::Online => {
                if self.state != ConnectivityState::Online || !self.queue.is_empty() {
                    self.drain_pending().await?;
                }
            }
        }

        Ok(self.state)
    }

    async fn drain_pending(&mut self) -> Result<DrainReport> {
        self.transition(ConnectivityState::Syncing);

        let remote = &self.remote;
        let events = self.events.clone();
        let drained = self
            .queue
            .drain(move |item| {
                let events = events.clone();
                async move {
                    let outcome = replay(remote, &item.mutation).await;
                    let kind = item.mutation.kind();
                    let listing = item.mutation.listing_id().clone();
                    match &outcome {
                        ApplyOutcome::Applied => {
                            let _ = events.send(SyncEvent::Replayed { kind, listing });
                        }
                        ApplyOutcome::Rejected(reason) => {
                            let _ = events.send(SyncEvent::DeadLettered {
                                kind,
                                listing,
                                reason: reason.clone(),
                            });
                        }
                        ApplyOutcome::Unavailable(_) => {}
                    }
                    outcome
                }
            })
            .await;

        let report = match drained {
            Ok(report) => report,
            Err(error) => {
                self.transition(ConnectivityState::ServerDown);
                return Err(error);
            }
        };

        self.emit(SyncEvent::DrainFinished {
            applied: report.applied,
            dead_lettered: report.dead_lettered,
            remaining: report.remaining,
        });

        if let Some(reason) = &report.stopped_on {
            tracing::warn!(
                "Sync stopped with {} change(s) still pending: {}",
                report.remaining,
                reason
            );
            self.transition(ConnectivityState::ServerDown);
            return Ok(report);
        }

        if report.applied > 0 || report.dead_lettered > 0 {
            tracing::info!(
                applied = report.applied,
                dead_lettered = report.dead_lettered,
                "Replayed offline changes"
            );
        }

        match fetch_all(&self.remote, self.page_size).await {
            Ok(listings) => {
                if let Err(error) = self.cache.write(&listings) {
                    self.transition(ConnectivityState::ServerDown);
                    return Err(error);
                }
                self.transition(ConnectivityState::Online);
            }
            Err(error) => {
                tracing::warn!("Failed to refresh listings after sync: {}", error);
                self.transition(ConnectivityState::ServerDown);
            }
        }

        Ok(report)
    }

    /// Show `mutation` in the cache, then queue it.
    ///
    /// Either both happen or neither does: a failed enqueue puts the previous
    /// snapshot back.
    fn queue_mutation(&mut self, mutation: Mutation) -> Result<()> {
        let snapshot = self.cache.read()?;
        self.cache.apply_mutation(&mutation)?;
        let item = match self.queue.enqueue(mutation) {
            Ok(item) => item,
            Err(error) => {
                if let Err(restore) = self.cache.write(&snapshot) {
                    tracing::warn!("Failed to restore listing snapshot: {}", restore);
                }
                return Err(error);
            }
        };
        self.emit(SyncEvent::Queued {
            kind: item.mutation.kind(),
            listing: item.mutation.listing_id().clone(),
            pending: self.queue.len(),
        });
        Ok(())
    }

    /// Record a change the server already committed.
    ///
    /// The server holds the truth now, so a cache failure is only logged; the
    /// next successful `get` rewrites the snapshot.
    fn refresh_cached(&self, mutation: &Mutation) {
        if let Err(error) = self.cache.apply_mutation(mutation) {
            tracing::warn!(
                listing = %mutation.listing_id(),
                "Server accepted the change but the local cache was not updated: {}",
                error
            );
        }
    }

    fn ensure_absent(&self, id: &ListingId) -> Result<()> {
        if self.cache.read()?.iter().any(|listing| &listing.id == id) {
            Err(Error::Conflict(format!("listing {id} already exists")))
        } else {
            Ok(())
        }
    }

    fn ensure_cached(&self, id: &ListingId) -> Result<()> {
        if self.cache.read()?.iter().any(|listing| &listing.id == id) {
            Ok(())
        } else {
            Err(Error::NotFound(id.to_string()))
        }
    }

    fn mark_server_down(&mut self, reason: &dyn std::fmt::Display) {
        tracing::warn!("Listings API unavailable: {}", reason);
        self.transition(ConnectivityState::ServerDown);
    }

    fn transition(&mut self, to: ConnectivityState) {
        let from = self.state;
        if from == to {
            return;
        }
        self.state = to;
        tracing::info!("Connectivity {} -> {}", from, to);
        self.emit(SyncEvent::StateChanged { from, to });
    }

    fn emit(&self, event: SyncEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

/// Apply one queued mutation and classify the answer.
///
/// Replays are idempotent: a Delete of a listing already gone counts as
/// applied, and so does an Add answered with 409 when the server copy equals
/// the queued listing. A 409 for a different listing is a rejection.
async fn replay<R: ListingsApi>(remote: &R, mutation: &Mutation) -> ApplyOutcome {
    let result = match mutation {
        Mutation::Add(listing) => remote.create(listing).await.map(|_| ()),
        Mutation::Update(listing) => remote.update(listing).await.map(|_| ()),
        Mutation::Delete(id) => remote.delete(id).await,
    };

    match (mutation, result) {
        (_, Ok(())) | (Mutation::Delete(_), Err(RemoteError::NotFound(_))) => {
            ApplyOutcome::Applied
        }
        (Mutation::Add(listing), Err(RemoteError::Conflict(reason))) => {
            match remote.fetch(&listing.id).await {
                Ok(existing) if &existing == listing => ApplyOutcome::Applied,
                Ok(_) | Err(RemoteError::NotFound(_)) => ApplyOutcome::Rejected(format!(
                    "listing {} already exists on the server: {reason}",
                    listing.id
                )),
                Err(RemoteError::Unavailable(reason)) => ApplyOutcome::Unavailable(reason),
                Err(error) => ApplyOutcome::Rejected(error.to_string()),
            }
        }
        (_, Err(RemoteError::Unavailable(reason))) => ApplyOutcome::Unavailable(reason),
        (_, Err(error)) => ApplyOutcome::Rejected(error.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::Category;
    use crate::queue::MutationKind;
    use crate::storage::{MemoryStore, LISTINGS_KEY, PENDING_MUTATIONS_KEY};
    use crate::test_support::{sample_draft, sample_listing, FakeListingsApi, FlakyStore};

    type Engine = SyncEngine<FakeListingsApi, MemoryStore>;

    async fn online_engine(remote: &FakeListingsApi, store: &MemoryStore) -> Engine {
        SyncEngine::new(remote.clone(), store.clone(), SyncOptions::default())
            .await
            .unwrap()
    }

    async fn down_engine(remote: &FakeListingsApi, store: &MemoryStore) -> Engine {
        remote.set_reachable(false);
        let engine = online_engine(remote, store).await;
        assert_eq!(engine.state(), ConnectivityState::ServerDown);
        engine
    }

    #[tokio::test]
    async fn construction_probes_and_caches_remote_state() {
        let remote = FakeListingsApi::default();
        remote.seed([sample_listing("a"), sample_listing("b")]);
        let store = MemoryStore::new();

        let engine = online_engine(&remote, &store).await;
        assert_eq!(engine.state(), ConnectivityState::Online);
        assert_eq!(remote.calls()[0], "ping");
        assert_eq!(LocalCache::new(store).read().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn online_add_then_get_round_trips() {
        let remote = FakeListingsApi::default();
        let store = MemoryStore::new();
        let mut engine = online_engine(&remote, &store).await;

        let mut new_listing = sample_draft("ignored");
        new_listing.id = None;
        let created = engine.add(new_listing.clone()).await.unwrap();
        assert!(!created.id.as_str().is_empty());
        assert_eq!(engine.pending_changes_count(), 0);

        let listings = engine.get().await.unwrap();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].id, created.id);
        assert_eq!(listings[0].title, new_listing.title);
        assert_eq!(listings[0].price, new_listing.price);
    }

    #[tokio::test]
    async fn remote_failure_while_online_queues_and_goes_down() {
        let remote = FakeListingsApi::default();
        let store = MemoryStore::new();
        let mut engine = online_engine(&remote, &store).await;
        remote.set_reachable(false);

        let created = engine.add(sample_draft("a")).await.unwrap();
        assert_eq!(created.id.as_str(), "a");
        assert_eq!(engine.state(), ConnectivityState::ServerDown);
        assert_eq!(engine.pending_changes_count(), 1);
        assert!(remote.listings().is_empty());
    }

    #[tokio::test]
    async fn server_down_mutations_skip_network_and_show_in_get() {
        let remote = FakeListingsApi::default();
        let store = MemoryStore::new();
        let mut engine = down_engine(&remote, &store).await;
        remote.clear_calls();

        engine.add(sample_draft("a")).await.unwrap();
        engine.add(sample_draft("b")).await.unwrap();
        let mut changed = sample_listing("a");
        changed.price = 42;
        engine.update(changed).await.unwrap();
        engine.delete(&"b".parse().unwrap()).await.unwrap();

        let listings = engine.get().await.unwrap();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].price, 42);
        assert!(remote.calls().is_empty());
        assert_eq!(engine.pending_changes_count(), 4);
    }

    #[tokio::test]
    async fn get_falls_back_to_cache_when_remote_fails() {
        let remote = FakeListingsApi::default();
        remote.seed([sample_listing("a")]);
        let store = MemoryStore::new();
        let mut engine = online_engine(&remote, &store).await;
        remote.set_reachable(false);

        let listings = engine.get().await.unwrap();
        assert_eq!(listings, vec![sample_listing("a")]);
        assert_eq!(engine.state(), ConnectivityState::ServerDown);
    }

    #[tokio::test]
    async fn reconnect_replays_add_before_update() {
        let remote = FakeListingsApi::default();
        let store = MemoryStore::new();
        let mut engine = down_engine(&remote, &store).await;

        engine.add(sample_draft("a")).await.unwrap();
        let mut priced = sample_listing("a");
        priced.price = 77;
        engine.update(priced).await.unwrap();

        remote.set_reachable(true);
        remote.clear_calls();
        let state = engine.reconnect().await.unwrap();

        assert_eq!(state, ConnectivityState::Online);
        assert_eq!(engine.pending_changes_count(), 0);
        let calls = remote.calls();
        assert_eq!(&calls[..3], ["ping", "create:a", "update:a"]);
        assert_eq!(remote.listings()[0].price, 77);
    }

    #[tokio::test]
    async fn failed_drain_keeps_remaining_items_and_stays_down() {
        let remote = FakeListingsApi::default();
        let store = MemoryStore::new();
        let mut engine = down_engine(&remote, &store).await;
        for id in ["1", "2", "3"] {
            engine.add(sample_draft(id)).await.unwrap();
        }

        remote.set_reachable(true);
        remote.fail_mutation_at(2);
        let state = engine.reconnect().await.unwrap();

        assert_eq!(state, ConnectivityState::ServerDown);
        let pending: Vec<&str> = engine
            .pending_changes()
            .iter()
            .map(|item| item.mutation.listing_id().as_str())
            .collect();
        assert_eq!(pending, vec!["2", "3"]);

        let state = engine.reconnect().await.unwrap();
        assert_eq!(state, ConnectivityState::Online);
        assert_eq!(remote.listings().len(), 3);
    }

    #[tokio::test]
    async fn queue_survives_restart_and_drains_on_next_start() {
        let remote = FakeListingsApi::default();
        let store = MemoryStore::new();
        {
            let mut engine = down_engine(&remote, &store).await;
            engine.add(sample_draft("persisted")).await.unwrap();
        }

        remote.set_reachable(true);
        let engine = online_engine(&remote, &store).await;
        assert_eq!(engine.state(), ConnectivityState::Online);
        assert_eq!(engine.pending_changes_count(), 0);
        assert_eq!(remote.listings()[0].id.as_str(), "persisted");
    }

    #[tokio::test]
    async fn operator_offline_is_sticky_and_suppresses_probing() {
        let remote = FakeListingsApi::default();
        let store = MemoryStore::new();
        let mut engine = online_engine(&remote, &store).await;

        engine.set_operator_offline(true).await.unwrap();
        remote.clear_calls();

        engine.add(sample_draft("a")).await.unwrap();
        assert_eq!(
            engine.reconnect().await.unwrap(),
            ConnectivityState::OperatorOffline
        );
        assert!(remote.calls().is_empty());
        assert_eq!(engine.pending_changes_count(), 1);

        let state = engine.set_operator_offline(false).await.unwrap();
        assert_eq!(state, ConnectivityState::Online);
        assert_eq!(engine.pending_changes_count(), 0);
        assert_eq!(remote.listings().len(), 1);
    }

    #[tokio::test]
    async fn operator_offline_option_skips_initial_probe() {
        let remote = FakeListingsApi::default();
        let engine = SyncEngine::new(
            remote.clone(),
            MemoryStore::new(),
            SyncOptions {
                operator_offline: true,
                ..SyncOptions::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(engine.state(), ConnectivityState::OperatorOffline);
        assert!(remote.calls().is_empty());
    }

    #[tokio::test]
    async fn validation_errors_are_never_queued() {
        let remote = FakeListingsApi::default();
        let store = MemoryStore::new();
        let mut engine = down_engine(&remote, &store).await;

        let mut invalid = sample_draft("bad");
        invalid.title = "   ".to_string();
        let err = engine.add(invalid).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(engine.pending_changes_count(), 0);
    }

    #[tokio::test]
    async fn not_found_surfaces_online_and_offline() {
        let remote = FakeListingsApi::default();
        let store = MemoryStore::new();
        let mut engine = online_engine(&remote, &store).await;

        let err = engine.update(sample_listing("ghost")).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        let err = engine.delete(&"ghost".parse().unwrap()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(engine.state(), ConnectivityState::Online);

        engine.set_operator_offline(true).await.unwrap();
        let err = engine.delete(&"ghost".parse().unwrap()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(engine.pending_changes_count(), 0);
    }

    #[tokio::test]
    async fn negative_prices_are_accepted() {
        let remote = FakeListingsApi::default();
        let store = MemoryStore::new();
        let mut engine = online_engine(&remote, &store).await;

        let mut cheap = sample_draft("cheap");
        cheap.price = -5;
        let created = engine.add(cheap).await.unwrap();
        assert_eq!(created.price, -5);
    }

    #[tokio::test]
    async fn rejected_replays_are_dead_lettered() {
        let remote = FakeListingsApi::default();
        remote.seed([sample_listing("gone")]);
        let store = MemoryStore::new();
        let mut engine = online_engine(&remote, &store).await;
        engine.set_operator_offline(true).await.unwrap();

        let mut edit = sample_listing("gone");
        edit.category = Category::Sports;
        engine.update(edit).await.unwrap();
        engine.add(sample_draft("fresh")).await.unwrap();

        // Someone else deletes the listing while we are offline.
        remote.with_listings_mut(|listings| listings.clear());

        let mut events = engine.subscribe();
        engine.set_operator_offline(false).await.unwrap();

        assert_eq!(engine.state(), ConnectivityState::Online);
        assert_eq!(engine.pending_changes_count(), 0);
        assert_eq!(engine.dead_letters().len(), 1);
        assert_eq!(
            engine.dead_letters()[0].item.mutation.kind(),
            MutationKind::Update
        );

        let mut dead_lettered = false;
        while let Ok(event) = events.try_recv() {
            if matches!(event, SyncEvent::DeadLettered { .. }) {
                dead_lettered = true;
            }
        }
        assert!(dead_lettered);
        assert_eq!(engine.clear_dead_letters().unwrap(), 1);
    }

    #[tokio::test]
    async fn replay_treats_duplicate_add_and_missing_delete_as_applied() {
        let remote = FakeListingsApi::default();
        remote.seed([sample_listing("dup")]);

        assert_eq!(
            replay(&remote, &Mutation::Add(sample_listing("dup"))).await,
            ApplyOutcome::Applied
        );
        assert_eq!(
            replay(&remote, &Mutation::Delete("missing".parse().unwrap())).await,
            ApplyOutcome::Applied
        );
        let mut different = sample_listing("dup");
        different.price = 999;
        assert!(matches!(
            replay(&remote, &Mutation::Add(different)).await,
            ApplyOutcome::Rejected(reason) if reason.contains("already exists")
        ));
        assert!(matches!(
            replay(&remote, &Mutation::Update(sample_listing("missing"))).await,
            ApplyOutcome::Rejected(_)
        ));
    }

    #[tokio::test]
    async fn events_report_queueing_and_transitions() {
        let remote = FakeListingsApi::default();
        let store = MemoryStore::new();
        let mut engine = online_engine(&remote, &store).await;
        let mut events = engine.subscribe();

        remote.set_reachable(false);
        engine.add(sample_draft("a")).await.unwrap();

        assert_eq!(
            events.try_recv().unwrap(),
            SyncEvent::StateChanged {
                from: ConnectivityState::Online,
                to: ConnectivityState::ServerDown,
            }
        );
        assert_eq!(
            events.try_recv().unwrap(),
            SyncEvent::Queued {
                kind: MutationKind::Add,
                listing: "a".parse().unwrap(),
                pending: 1,
            }
        );
    }

    #[tokio::test]
    async fn storage_failure_propagates_as_storage_unavailable() {
        let remote = FakeListingsApi::default();
        remote.set_reachable(false);
        let store = FlakyStore::default();
        let mut engine = SyncEngine::new(remote, store.clone(), SyncOptions::default())
            .await
            .unwrap();

        store.fail_writes(true);
        let err = engine.add(sample_draft("a")).await.unwrap_err();
        assert!(matches!(err, Error::StorageUnavailable(_)));
        assert_eq!(engine.pending_changes_count(), 0);
    }

    #[tokio::test]
    async fn queued_add_of_a_cached_id_is_a_conflict() {
        let remote = FakeListingsApi::default();
        remote.seed([sample_listing("a")]);
        let store = MemoryStore::new();
        let mut engine = online_engine(&remote, &store).await;
        engine.set_operator_offline(true).await.unwrap();

        let mut clash = sample_draft("a");
        clash.price = 999;
        let err = engine.add(clash).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        assert_eq!(engine.pending_changes_count(), 0);
        assert_eq!(engine.get().await.unwrap(), vec![sample_listing("a")]);
    }

    #[tokio::test]
    async fn replayed_add_clashing_with_another_listing_is_dead_lettered() {
        let remote = FakeListingsApi::default();
        let store = MemoryStore::new();
        let mut engine = down_engine(&remote, &store).await;

        let mut mine = sample_draft("a");
        mine.price = 999;
        engine.add(mine).await.unwrap();

        // Another client creates the same id while we are down.
        remote.with_listings_mut(|listings| listings.push(sample_listing("a")));
        remote.set_reachable(true);
        engine.reconnect().await.unwrap();

        assert_eq!(engine.state(), ConnectivityState::Online);
        assert_eq!(engine.pending_changes_count(), 0);
        assert_eq!(engine.dead_letters().len(), 1);
        assert_eq!(
            engine.dead_letters()[0].item.mutation.kind(),
            MutationKind::Add
        );
        assert_eq!(remote.listings(), vec![sample_listing("a")]);
    }

    #[tokio::test]
    async fn cache_failure_while_queueing_leaves_nothing_queued() {
        let remote = FakeListingsApi::default();
        remote.set_reachable(false);
        let store = FlakyStore::default();
        let mut engine = SyncEngine::new(remote.clone(), store.clone(), SyncOptions::default())
            .await
            .unwrap();

        store.fail_writes_to(Some(LISTINGS_KEY));
        let err = engine.add(sample_draft("x")).await.unwrap_err();
        assert!(matches!(err, Error::StorageUnavailable(_)));
        assert_eq!(engine.pending_changes_count(), 0);

        store.fail_writes_to(None);
        remote.set_reachable(true);
        engine.reconnect().await.unwrap();
        assert!(remote.listings().is_empty());
    }

    #[tokio::test]
    async fn failed_enqueue_restores_the_cached_snapshot() {
        let remote = FakeListingsApi::default();
        remote.set_reachable(false);
        let store = FlakyStore::default();
        let mut engine = SyncEngine::new(remote, store.clone(), SyncOptions::default())
            .await
            .unwrap();

        store.fail_writes_to(Some(PENDING_MUTATIONS_KEY));
        let err = engine.add(sample_draft("x")).await.unwrap_err();
        assert!(matches!(err, Error::StorageUnavailable(_)));
        assert_eq!(engine.pending_changes_count(), 0);
        assert!(engine.get().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn online_commit_survives_a_cache_failure() {
        let remote = FakeListingsApi::default();
        let store = FlakyStore::default();
        let mut engine = SyncEngine::new(remote.clone(), store.clone(), SyncOptions::default())
            .await
            .unwrap();
        assert_eq!(engine.state(), ConnectivityState::Online);

        store.fail_writes_to(Some(LISTINGS_KEY));
        let created = engine.add(sample_draft("x")).await.unwrap();
        assert_eq!(created.id.as_str(), "x");
        assert_eq!(engine.pending_changes_count(), 0);
        assert_eq!(remote.listings(), vec![sample_listing("x")]);
    }
}
