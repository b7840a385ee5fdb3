//! Pagination state and its mapping to the persisted query.

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::query::{QueryPatch, QueryState, QueryStore};
use crate::update::Update;

/// Table-side pagination: 0-indexed page plus page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationState {
    pub page_index: usize,
    pub page_size: u32,
}

impl PaginationState {
    /// Creates a new pagination state.
    pub fn new(page_index: usize, page_size: u32) -> Self {
        Self {
            page_index,
            page_size,
        }
    }

    /// Derives pagination from a persisted 1-indexed page.
    pub fn from_query(state: &QueryState) -> Self {
        Self {
            page_index: state.page.max(1) as usize - 1,
            page_size: state.per_page,
        }
    }

    /// The 1-indexed page for the query store.
    pub fn page(&self) -> u32 {
        u32::try_from(self.page_index)
            .unwrap_or(u32::MAX - 1)
            .saturating_add(1)
    }

    /// The patch that persists this pagination.
    pub fn to_patch(&self) -> QueryPatch {
        QueryPatch::new().page(self.page()).per_page(self.page_size)
    }
}

impl Default for PaginationState {
    fn default() -> Self {
        Self::from_query(&QueryState::default())
    }
}

/// Writes table pagination events to the query store.
///
/// Writes are immediate and carry both `page` and `perPage` in one patch.
/// Filters and selection are never touched.
pub struct PaginationController<'a> {
    store: &'a dyn QueryStore,
}

impl<'a> PaginationController<'a> {
    /// Creates a controller over `store`.
    pub fn new(store: &'a dyn QueryStore) -> Self {
        Self { store }
    }

    /// Reads the current pagination from the store.
    pub fn current(&self) -> Result<PaginationState, StoreError> {
        Ok(PaginationState::from_query(&self.store.snapshot()?))
    }

    /// Resolves `update` against the current pagination and persists it.
    ///
    /// Returns the pagination that was written. A zero page size is
    /// rejected and nothing is written.
    pub fn on_pagination_change(
        &self,
        update: Update<PaginationState>,
    ) -> Result<PaginationState, StoreError> {
        let current = self.current()?;
        let next = update.resolve(&current);

        if next.page_size == 0 {
            log::warn!("[pagination] ignoring zero page size");
            return Ok(current);
        }

        log::debug!(
            "[pagination] page {} -> {}, per page {} -> {}",
            current.page(),
            next.page(),
            current.page_size,
            next.page_size
        );
        self.store.apply(next.to_patch())?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::MemoryQueryStore;

    #[test]
    fn test_page_round_trip_for_valid_pages() {
        for page in [1u32, 2, 17, 1000] {
            let pagination = PaginationState::from_query(&QueryState::new(page, 10));
            assert_eq!(pagination.page_index, page as usize - 1);
            assert_eq!(pagination.page(), page);
        }
    }

    #[test]
    fn test_change_writes_both_keys_immediately() {
        let store = MemoryQueryStore::with_state(QueryState::new(1, 10).with_filter("name", "ann"));
        let controller = PaginationController::new(&store);

        let written = controller
            .on_pagination_change(Update::derive(|p: &PaginationState| {
                PaginationState::new(p.page_index, 50)
            }))
            .unwrap();

        assert_eq!(written, PaginationState::new(0, 50));
        assert_eq!(store.revision(), 1);
        assert_eq!(
            store.snapshot().unwrap(),
            QueryState::new(1, 50).with_filter("name", "ann")
        );
    }

    #[test]
    fn test_zero_page_size_is_ignored() {
        let store = MemoryQueryStore::with_state(QueryState::new(3, 10));
        let controller = PaginationController::new(&store);

        let written = controller
            .on_pagination_change(Update::Direct(PaginationState::new(0, 0)))
            .unwrap();

        assert_eq!(written, PaginationState::new(2, 10));
        assert_eq!(store.revision(), 0);
    }
}
