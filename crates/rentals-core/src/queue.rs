//! Offline queue of mutations awaiting confirmation from the remote store.
//!
//! Items are persisted through the key-value capability on every change so a
//! crash never loses an accepted mutation. Replay is strictly in enqueue order
//! and stops at the first transient failure, because applying a later Update
//! or Delete before an earlier Add for the same id would corrupt remote state.

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::models::{Listing, ListingId};
use crate::storage::{KeyValueStore, DEAD_LETTERS_KEY, PENDING_MUTATIONS_KEY};
use crate::util::unix_millis_now;
use crate::Result;

/// A listing change that still has to reach the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload")]
pub enum Mutation {
    Add(Listing),
    Update(Listing),
    Delete(ListingId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MutationKind {
    Add,
    Update,
    Delete,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "add",
            Self::Update => "update",
            Self::Delete => "delete",
        })
    }
}

impl Mutation {
    #[must_use]
    pub const fn kind(&self) -> MutationKind {
        match self {
            Self::Add(_) => MutationKind::Add,
            Self::Update(_) => MutationKind::Update,
            Self::Delete(_) => MutationKind::Delete,
        }
    }

    /// Id of the listing the mutation targets.
    #[must_use]
    pub const fn listing_id(&self) -> &ListingId {
        match self {
            Self::Add(listing) | Self::Update(listing) => &listing.id,
            Self::Delete(id) => id,
        }
    }
}

/// A pending mutation and its bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueItem {
    #[serde(flatten)]
    pub mutation: Mutation,
    /// Unix ms, strictly increasing across the queue
    pub enqueued_at: i64,
    /// Transient replay failures seen so far
    #[serde(default)]
    pub attempts: u32,
}

/// A mutation the server refused during replay; it will never be retried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadLetter {
    pub item: QueueItem,
    pub reason: String,
    pub rejected_at: i64,
}

/// Result of replaying a single item against the remote store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Confirmed applied; remove the item
    Applied,
    /// Permanently refused; dead-letter the item and keep going
    Rejected(String),
    /// Could not reach a verdict; keep the item and stop
    Unavailable(String),
}

/// Summary of one drain pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub applied: usize,
    pub dead_lettered: usize,
    pub remaining: usize,
    /// Reason the pass stopped early, if it did
    pub stopped_on: Option<String>,
}

impl DrainReport {
    /// `true` when every item was resolved.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.stopped_on.is_none()
    }
}

/// Ordered, persisted log of pending mutations.
#[derive(Debug)]
pub struct OfflineQueue<S: KeyValueStore> {
    store: S,
    items: Vec<QueueItem>,
    dead_letters: Vec<DeadLetter>,
}

impl<S: KeyValueStore> OfflineQueue<S> {
    /// Load the queue and dead letters previously persisted in `store`.
    pub fn open(store: S) -> Result<Self> {
        let items = load_json(&store, PENDING_MUTATIONS_KEY)?;
        let dead_letters = load_json(&store, DEAD_LETTERS_KEY)?;
        Ok(Self {
            store,
            items,
            dead_letters,
        })
    }

    /// Append a mutation and persist immediately.
    pub fn enqueue(&mut self, mutation: Mutation) -> Result<QueueItem> {
        let item = QueueItem {
            mutation,
            enqueued_at: self.next_timestamp(),
            attempts: 0,
        };
        self.items.push(item.clone());
        if let Err(error) = self.persist() {
            self.items.pop();
            return Err(error);
        }
        tracing::debug!(
            kind = %item.mutation.kind(),
            listing = %item.mutation.listing_id(),
            pending = self.items.len(),
            "Queued mutation"
        );
        Ok(item)
    }

    /// Replay items in enqueue order through `apply`.
    ///
    /// Each applied item is removed and the queue persisted before the next one
    /// is attempted. The first `Unavailable` outcome stops the pass and leaves
    /// that item and everything after it queued.
    pub async fn drain<F, Fut>(&mut self, mut apply: F) -> Result<DrainReport>
    where
        F: FnMut(QueueItem) -> Fut,
        Fut: Future<Output = ApplyOutcome>,
    {
        let mut report = DrainReport::default();

        while let Some(item) = self.items.first().cloned() {
            match apply(item).await {
                ApplyOutcome::Applied => {
                    self.items.remove(0);
                    self.persist()?;
                    report.applied += 1;
                }
                ApplyOutcome::Rejected(reason) => {
                    let item = self.items.remove(0);
                    tracing::warn!(
                        kind = %item.mutation.kind(),
                        listing = %item.mutation.listing_id(),
                        "Dropping mutation rejected by server: {}",
                        reason
                    );
                    self.dead_letters.push(DeadLetter {
                        item,
                        reason,
                        rejected_at: unix_millis_now(),
                    });
                    self.persist_dead_letters()?;
                    self.persist()?;
                    report.dead_lettered += 1;
                }
                ApplyOutcome::Unavailable(reason) => {
                    if let Some(head) = self.items.first_mut() {
                        head.attempts = head.attempts.saturating_add(1);
                    }
                    self.persist()?;
                    report.stopped_on = Some(reason);
                    break;
                }
            }
        }

        report.remaining = self.items.len();
        Ok(report)
    }

    /// Pending items in replay order.
    #[must_use]
    pub fn items(&self) -> &[QueueItem] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn dead_letters(&self) -> &[DeadLetter] {
        &self.dead_letters
    }

    /// Forget all dead letters, returning how many were dropped.
    pub fn clear_dead_letters(&mut self) -> Result<usize> {
        let count = self.dead_letters.len();
        self.dead_letters.clear();
        self.persist_dead_letters()?;
        Ok(count)
    }

    fn next_timestamp(&self) -> i64 {
        let now = unix_millis_now();
        self.items
            .last()
            .map_or(now, |last| now.max(last.enqueued_at.saturating_add(1)))
    }

    fn persist(&self) -> Result<()> {
        self.store
            .write(PENDING_MUTATIONS_KEY, &serde_json::to_string(&self.items)?)
    }

    fn persist_dead_letters(&self) -> Result<()> {
        self.store
            .write(DEAD_LETTERS_KEY, &serde_json::to_string(&self.dead_letters)?)
    }
}

fn load_json<S, T>(store: &S, key: &str) -> Result<Vec<T>>
where
    S: KeyValueStore,
    T: serde::de::DeserializeOwned,
{
    match store.read(key)? {
        Some(raw) if !raw.trim().is_empty() => Ok(serde_json::from_str(&raw)?),
        _ => Ok(Vec::new()),
    }
}
