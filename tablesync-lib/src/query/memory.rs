//! In-memory query store.

use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use super::{QueryPatch, QueryState, QueryStore};
use crate::error::StoreError;

/// A query store held in process memory.
///
/// Useful for embedding the controller where no URL exists, and in tests.
/// Every applied patch bumps [`revision`](Self::revision), which callers can
/// watch to decide when to refetch.
///
/// # Example
///
/// ```
/// use tablesync_lib::query::{MemoryQueryStore, QueryPatch, QueryStore};
///
/// let store = MemoryQueryStore::new();
/// store.apply(QueryPatch::new().page(3)).unwrap();
///
/// assert_eq!(store.snapshot().unwrap().page, 3);
/// assert_eq!(store.revision(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MemoryQueryStore {
    state: RwLock<QueryState>,
    revision: AtomicU64,
}

impl MemoryQueryStore {
    /// Creates a store at page 1 with the default page size and no filters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `state`.
    pub fn with_state(state: QueryState) -> Self {
        Self {
            state: RwLock::new(state),
            revision: AtomicU64::new(0),
        }
    }

    /// Number of patches applied so far.
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }
}

impl QueryStore for MemoryQueryStore {
    fn snapshot(&self) -> Result<QueryState, StoreError> {
        self.state
            .read()
            .map(|g| g.clone())
            .map_err(|_| StoreError::unavailable("query state lock poisoned"))
    }

    fn apply(&self, patch: QueryPatch) -> Result<(), StoreError> {
        let mut guard = self
            .state
            .write()
            .map_err(|_| StoreError::unavailable("query state lock poisoned"))?;
        guard.apply(&patch);
        self.revision.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
