//! Key-value persistence used by the listing cache and the offline queue.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::Result;

/// Key holding the last-known-good listing snapshot.
pub const LISTINGS_KEY: &str = "rentals.listings";
/// Key holding pending mutations awaiting replay.
pub const PENDING_MUTATIONS_KEY: &str = "rentals.pending_mutations";
/// Key holding mutations the server permanently rejected during replay.
pub const DEAD_LETTERS_KEY: &str = "rentals.dead_letters";

/// Host-provided string blob storage.
///
/// Failures must surface as [`crate::Error::StorageUnavailable`]; callers never
/// swallow them.
pub trait KeyValueStore: Clone + Send + Sync + 'static {
    /// Read the value stored under `key`, `None` when absent.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn write(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}
