/// Catalog store: the durable table of indexed textures.
///
/// - [`store`]: [`CatalogStore`], records keyed by (identity, category),
///   the ignore list, survivorship pruning and persistence.
/// - [`merge`]: the plan / compute / commit merge split and [`Indexer`].
/// - [`storage`]: the on-disk JSON format.
///
/// The store is shared as a [`SharedCatalog`]. Scans take the write lock
/// only to commit a merge; readers (browse queries, progress displays) can
/// take the read lock at any time.
pub mod merge;
pub mod storage;
pub mod store;

pub use merge::{Indexer, MergeOutcome, MergePlan, MergeWork};
pub use store::CatalogStore;

use parking_lot::RwLock;
use std::sync::Arc;

/// A shared, concurrently-readable catalog.
pub type SharedCatalog = Arc<RwLock<CatalogStore>>;

/// Maximum number of undelivered events queued per subscriber.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Notifications raised by [`CatalogStore::persist`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CatalogEvent {
    /// The catalog was written. Carries the sizes after the write.
    Updated { records: usize, ignored: usize },
}

/// Wrap a store for sharing between the scan thread and readers.
pub fn shared(store: CatalogStore) -> SharedCatalog {
    Arc::new(RwLock::new(store))
}
