//! Debounced synchronization of column filters to the query store.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{ColumnFilter, FilterFields, normalize_filters};
use crate::debounce::Debouncer;
use crate::error::StoreError;
use crate::query::{QueryPatch, QueryStore};
use crate::update::Update;

/// Keeps local column filters and mirrors them into the query store.
///
/// Local filters change synchronously so the UI can reflect every keystroke.
/// The store write is debounced: a burst of edits produces one write that
/// carries the final values, and every filter write resets `page` to 1.
///
/// Patches issued during a burst are merged rather than replaced, so a key
/// cleared early in the burst is still cleared when the write lands.
pub struct FilterSync {
    fields: FilterFields,
    store: Arc<dyn QueryStore>,
    filters: Vec<ColumnFilter>,
    pending: Arc<Mutex<Option<QueryPatch>>>,
    debouncer: Debouncer,
}

impl FilterSync {
    /// Creates the sync, seeding local filters from the store snapshot.
    pub fn new(fields: FilterFields, store: Arc<dyn QueryStore>, delay: Duration) -> Self {
        let filters = match store.snapshot() {
            Ok(state) => fields.initial_filters(&state),
            Err(e) => {
                log::warn!("[filter] could not read initial filters: {}", e);
                Vec::new()
            }
        };

        Self {
            fields,
            store,
            filters,
            pending: Arc::new(Mutex::new(None)),
            debouncer: Debouncer::new(delay),
        }
    }

    /// The current local filters.
    pub fn column_filters(&self) -> &[ColumnFilter] {
        &self.filters
    }

    /// The declared filter fields.
    pub fn fields(&self) -> &FilterFields {
        &self.fields
    }

    /// Applies a filter change locally and schedules the store write.
    pub fn on_column_filters_change(&mut self, update: Update<Vec<ColumnFilter>>) {
        let next = normalize_filters(update.resolve(&self.filters));
        if next == self.filters {
            log::debug!("[filter] change resolved to the current filters, skipping");
            return;
        }

        let patch = self.build_patch(&next);
        self.filters = next;

        let mut slot = lock_slot(&self.pending);
        match slot.as_mut() {
            Some(pending) => pending.merge(patch),
            None => *slot = Some(patch),
        }
        drop(slot);

        let store = self.store.clone();
        let pending = self.pending.clone();
        self.debouncer.schedule(move || {
            if let Err(e) = write_pending(store.as_ref(), &pending) {
                log::warn!("[filter] dropped filter write: {}", e);
            }
        });
    }

    /// Returns `true` if a filter write is waiting for the quiet period.
    pub fn has_pending_write(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Writes any pending filter patch now.
    ///
    /// Returns `true` if a patch was written.
    pub fn flush_pending(&mut self) -> Result<bool, StoreError> {
        self.debouncer.cancel();
        write_pending(self.store.as_ref(), &self.pending)
    }

    /// Cancels any pending write without performing it.
    pub fn teardown(&mut self) {
        if self.debouncer.cancel() {
            log::debug!("[filter] cancelled pending write on teardown");
        }
        lock_slot(&self.pending).take();
    }

    fn build_patch(&self, next: &[ColumnFilter]) -> QueryPatch {
        let mut patch = QueryPatch::new().page(1);

        for filter in next {
            match self.fields.get(&filter.id) {
                Some(field) => {
                    patch = patch.set(filter.id.clone(), field.persisted_value(&filter.value));
                }
                None => log::debug!("[filter] '{}' is not a declared field, not persisted", filter.id),
            }
        }

        for removed in self
            .filters
            .iter()
            .filter(|prev| !next.iter().any(|f| f.id == prev.id))
        {
            patch = patch.clear(removed.id.clone());
        }

        patch
    }
}

impl Drop for FilterSync {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn lock_slot(slot: &Mutex<Option<QueryPatch>>) -> std::sync::MutexGuard<'_, Option<QueryPatch>> {
    slot.lock().unwrap_or_else(|e| e.into_inner())
}

fn write_pending(
    store: &dyn QueryStore,
    slot: &Mutex<Option<QueryPatch>>,
) -> Result<bool, StoreError> {
    let Some(patch) = lock_slot(slot).take() else {
        return Ok(false);
    };
    log::debug!("[filter] writing {:?}", patch);
    store.apply(patch)?;
    Ok(true)
}
