//! The table controller: one state object, one set of handlers.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::columns::{CheckState, ColumnDef, ColumnSetBuilder, TableColumn};
use crate::columns::{toggle_all_update, toggle_row_update};
use crate::config::TableConfig;
use crate::error::{FetchError, StoreError};
use crate::filter::{ColumnFilter, FilterField, FilterFields, FilterSync};
use crate::pagination::{PaginationController, PaginationState};
use crate::query::{QueryState, QueryStore};
use crate::selection::{RowSelection, SelectionStore, TableRow};
use crate::source::{ColumnSort, DataSource, FetchRequest, FetchTicket, FetchTracker, PageData};
use crate::update::Update;

/// Column visibility by column id. Unlisted columns are visible.
pub type ColumnVisibility = BTreeMap<String, bool>;

/// The composed view state handed to the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableState {
    pub pagination: PaginationState,
    pub column_visibility: ColumnVisibility,
    /// Flags for the current page only.
    pub row_selection: RowSelection,
    pub column_filters: Vec<ColumnFilter>,
    pub sorting: Vec<ColumnSort>,
}

/// Data-grid options. Pagination, sorting and filtering are always remote:
/// the grid must show `rows` as the whole current page and never page,
/// sort or filter them itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableOptions {
    pub manual_pagination: bool,
    pub manual_sorting: bool,
    pub manual_filtering: bool,
    pub page_count: usize,
}

impl TableOptions {
    /// Remote-data options for a source reporting `page_count` pages.
    pub fn remote(page_count: usize) -> Self {
        Self {
            manual_pagination: true,
            manual_sorting: true,
            manual_filtering: true,
            page_count,
        }
    }
}

/// Drives a remotely paginated, filterable, selectable table.
///
/// Pagination and filters live in the query store; selection, visibility,
/// sorting and the current rows live here. The rendering layer reads
/// [`state`](Self::state) and reports user actions through the `on_*`
/// handlers and the selection column toggles.
///
/// # Example
///
/// ```ignore
/// let store = Arc::new(UrlQueryStore::parse(location, QuerySchema::from_fields(&fields))?);
/// let mut table = TableController::new(TableConfig::default(), store, columns, fields);
///
/// table.load(&api).await;
/// render(table.state(), table.options(), table.rows());
///
/// table.toggle_row("42");
/// table.on_pagination_change(Update::derive(|p| PaginationState::new(p.page_index + 1, p.page_size)))?;
/// table.load(&api).await;
/// ```
pub struct TableController<T, C> {
    config: TableConfig,
    store: Arc<dyn QueryStore>,
    filters: FilterSync,
    selection: SelectionStore<T>,
    columns: Vec<TableColumn<C>>,
    column_visibility: ColumnVisibility,
    sorting: Vec<ColumnSort>,
    rows: Vec<Arc<T>>,
    page_count: usize,
    fetch: FetchTracker,
}

impl<T: TableRow, C: ColumnDef + Clone> TableController<T, C> {
    /// Builds the controller.
    ///
    /// Column filters are seeded from whatever well-shaped filter values the
    /// store already holds.
    pub fn new(
        config: TableConfig,
        store: Arc<dyn QueryStore>,
        columns: Vec<C>,
        filter_fields: Vec<FilterField>,
    ) -> Self {
        let filters = FilterSync::new(
            FilterFields::new(filter_fields),
            store.clone(),
            config.debounce(),
        );
        let columns = ColumnSetBuilder::new(columns)
            .with_row_selection(config.enable_row_selection)
            .build();

        log::debug!(
            "[table] mounted with {} columns, {} initial filters",
            columns.len(),
            filters.column_filters().len()
        );

        Self {
            column_visibility: config.initial_column_visibility.clone(),
            sorting: config.initial_sorting.clone(),
            config,
            store,
            filters,
            selection: SelectionStore::new(),
            columns,
            rows: Vec::new(),
            page_count: 0,
            fetch: FetchTracker::new(),
        }
    }

    /// The resolved configuration.
    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    fn snapshot(&self) -> QueryState {
        self.store.snapshot().unwrap_or_else(|e| {
            log::warn!("[table] query store unreadable, using defaults: {}", e);
            QueryState::new(1, self.config.default_per_page)
        })
    }

    // -------------------------------------------------------------------------
    // Composed state
    // -------------------------------------------------------------------------

    /// Current pagination, read from the query store.
    pub fn pagination(&self) -> PaginationState {
        PaginationState::from_query(&self.snapshot())
    }

    /// The composed view state.
    pub fn state(&self) -> TableState {
        let pagination = self.pagination();
        TableState {
            pagination,
            column_visibility: self.column_visibility.clone(),
            row_selection: self.selection.keys_for_page(pagination.page_index),
            column_filters: self.filters.column_filters().to_vec(),
            sorting: self.sorting.clone(),
        }
    }

    /// Grid options; always remote mode.
    pub fn options(&self) -> TableOptions {
        TableOptions::remote(self.page_count)
    }

    /// All columns, selection column first when enabled.
    pub fn columns(&self) -> &[TableColumn<C>] {
        &self.columns
    }

    /// Columns not hidden by the visibility state.
    pub fn visible_columns(&self) -> impl Iterator<Item = &TableColumn<C>> {
        self.columns
            .iter()
            .filter(|c| self.column_visibility.get(c.id()).copied().unwrap_or(true))
    }

    /// Rows of the current page, as last fetched.
    pub fn rows(&self) -> &[Arc<T>] {
        &self.rows
    }

    /// Page count reported by the last applied fetch.
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Advisory loading flag. Never blocks any handler.
    pub fn is_fetching(&self) -> bool {
        self.fetch.is_fetching()
    }

    // -------------------------------------------------------------------------
    // Handlers
    // -------------------------------------------------------------------------

    /// Persists a pagination change immediately.
    pub fn on_pagination_change(
        &mut self,
        update: Update<PaginationState>,
    ) -> Result<PaginationState, StoreError> {
        PaginationController::new(self.store.as_ref()).on_pagination_change(update)
    }

    /// Updates local filters now and persists them after the debounce window.
    ///
    /// The write resets the page to 1 when it lands, even if the page was
    /// changed in between.
    pub fn on_column_filters_change(&mut self, update: Update<Vec<ColumnFilter>>) {
        self.filters.on_column_filters_change(update);
    }

    /// Applies a selection flag update to the current page.
    pub fn on_row_selection_change(&mut self, update: Update<RowSelection>) {
        if !self.config.enable_row_selection {
            log::debug!("[table] row selection disabled, ignoring change");
            return;
        }
        let page_index = self.pagination().page_index;
        self.selection
            .on_row_selection_change(page_index, update, &self.rows);
    }

    /// Captures or releases a row payload on the current page.
    pub fn handle_row_selection_change(&mut self, row_id: &str, row: Arc<T>, is_selected: bool) {
        if !self.config.enable_row_selection {
            return;
        }
        let page_index = self.pagination().page_index;
        self.selection
            .handle_row_selection_change(page_index, row_id, row, is_selected);
    }

    /// Updates column visibility.
    pub fn on_column_visibility_change(&mut self, update: Update<ColumnVisibility>) {
        self.column_visibility = update.resolve(&self.column_visibility);
    }

    /// Updates sorting. Sorting is only passed through to the data source.
    pub fn on_sorting_change(&mut self, update: Update<Vec<ColumnSort>>) {
        self.sorting = update.resolve(&self.sorting);
    }

    // -------------------------------------------------------------------------
    // Selection column
    // -------------------------------------------------------------------------

    fn visible_ids(&self) -> Vec<String> {
        self.rows.iter().map(|row| row.id()).collect()
    }

    /// Header checkbox state for the current page.
    pub fn header_check_state(&self) -> CheckState {
        let keys = self.selection.keys_for_page(self.pagination().page_index);
        let ids = self.visible_ids();
        CheckState::for_rows(&keys, ids.iter().map(String::as_str))
    }

    /// Checkbox state of one row on the current page.
    pub fn row_check_state(&self, row_id: &str) -> CheckState {
        CheckState::from_flag(
            self.selection
                .is_selected(self.pagination().page_index, row_id),
        )
    }

    /// Header checkbox toggle: selects every visible row unless all already
    /// are, in which case it deselects them.
    pub fn toggle_all_page_rows(&mut self) {
        let ids = self.visible_ids();
        self.on_row_selection_change(toggle_all_update(ids));
    }

    /// Row checkbox toggle. Returns `false` if the row is not on the page.
    pub fn toggle_row(&mut self, row_id: &str) -> bool {
        let Some(row) = self.rows.iter().find(|r| r.id() == row_id).cloned() else {
            log::debug!("[table] toggle for row '{}' not on this page", row_id);
            return false;
        };
        let selected = self
            .selection
            .is_selected(self.pagination().page_index, row_id);
        self.handle_row_selection_change(row_id, row, !selected);
        self.on_row_selection_change(toggle_row_update(row_id));
        true
    }

    /// The selection store.
    pub fn selection(&self) -> &SelectionStore<T> {
        &self.selection
    }

    /// Every selected row across pages.
    pub fn selected_records(&self) -> Vec<Arc<T>> {
        self.selection.all_selected_records()
    }

    /// Number of selected rows across pages.
    pub fn selected_count(&self) -> usize {
        self.selection.selected_count()
    }

    /// Drops the selection on every page.
    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    // -------------------------------------------------------------------------
    // Fetching
    // -------------------------------------------------------------------------

    /// The request matching the current state.
    pub fn fetch_request(&self) -> FetchRequest {
        let snapshot = self.snapshot();
        let pagination = PaginationState::from_query(&snapshot);
        FetchRequest {
            page_index: pagination.page_index,
            page_size: pagination.page_size,
            filters: snapshot.filters,
            sorting: self.sorting.clone(),
        }
    }

    /// Issues a fetch ticket for the current state and marks loading.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        let request = self.fetch_request();
        self.fetch.begin(request)
    }

    /// Applies a fetch result if `ticket` is still the latest.
    ///
    /// Returns `true` if the rows were replaced. Stale results are dropped;
    /// failures are logged and keep the previous rows.
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<PageData<T>, FetchError>,
    ) -> bool {
        if !self.fetch.finish(&ticket) {
            log::debug!(
                "[table] dropping stale result for page {}",
                ticket.request().page_index
            );
            return false;
        }

        match result {
            Ok(page) => {
                log::debug!(
                    "[table] page {} loaded: {} rows, {} pages",
                    ticket.request().page_index,
                    page.rows.len(),
                    page.page_count
                );
                self.rows = page.rows.into_iter().map(Arc::new).collect();
                self.page_count = page.page_count;
                true
            }
            Err(e) => {
                log::warn!("[table] fetch failed: {}", e);
                false
            }
        }
    }

    /// Fetches the current page from `source` and applies it.
    pub async fn load<S>(&mut self, source: &S) -> bool
    where
        S: DataSource<T> + ?Sized,
        T: Send,
    {
        let ticket = self.begin_fetch();
        let result = source.fetch(ticket.request().clone()).await;
        self.complete_fetch(ticket, result)
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Returns `true` if a filter write is waiting for the quiet period.
    pub fn has_pending_filter_write(&self) -> bool {
        self.filters.has_pending_write()
    }

    /// Writes a pending filter change now.
    pub fn flush_filters(&mut self) -> Result<bool, StoreError> {
        self.filters.flush_pending()
    }

    /// Cancels pending writes. Also happens on drop.
    pub fn teardown(&mut self) {
        self.filters.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::MemoryQueryStore;

    #[derive(Debug, Clone, PartialEq)]
    struct User {
        id: u32,
    }

    impl TableRow for User {
        fn id(&self) -> String {
            self.id.to_string()
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Col(&'static str);

    impl ColumnDef for Col {
        fn id(&self) -> &str {
            self.0
        }
    }

    fn controller(config: TableConfig) -> (Arc<MemoryQueryStore>, TableController<User, Col>) {
        let store = Arc::new(MemoryQueryStore::new());
        let table = TableController::new(
            config,
            store.clone(),
            vec![Col("name"), Col("email")],
            vec![FilterField::searchable("name", "Name")],
        );
        (store, table)
    }

    fn load(table: &mut TableController<User, Col>, ids: std::ops::Range<u32>) {
        let ticket = table.begin_fetch();
        let rows = ids.map(|id| User { id }).collect();
        assert!(table.complete_fetch(ticket, Ok(PageData::new(rows, 5))));
    }

    #[test]
    fn test_state_composes_current_page_selection() {
        let (_store, mut table) = controller(TableConfig::default());
        load(&mut table, 1..4);
        table.toggle_row("2");

        let state = table.state();
        assert_eq!(state.pagination, PaginationState::new(0, 10));
        assert_eq!(state.row_selection, RowSelection::from([("2".to_string(), true)]));
        assert_eq!(table.options(), TableOptions::remote(5));

        table
            .on_pagination_change(Update::Direct(PaginationState::new(1, 10)))
            .unwrap();
        assert!(table.state().row_selection.is_empty());
        assert_eq!(table.selected_count(), 1);
    }

    #[test]
    fn test_selection_survives_refetch_of_same_page() {
        let (_store, mut table) = controller(TableConfig::default());
        load(&mut table, 1..4);
        table.toggle_row("1");

        load(&mut table, 10..12);
        table.toggle_row("10");

        let keys = table.state().row_selection;
        assert_eq!(keys.get("1"), Some(&true));
        assert_eq!(keys.get("10"), Some(&true));
        assert_eq!(table.selection().selected_ids(), vec!["1".to_string(), "10".to_string()]);
        assert_eq!(table.selected_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_filter_write_resets_explicit_paging() {
        let (store, mut table) = controller(TableConfig::default());
        table.on_column_filters_change(Update::Direct(vec![ColumnFilter::new("name", "ann")]));
        table
            .on_pagination_change(Update::Direct(PaginationState::new(3, 10)))
            .unwrap();
        assert_eq!(store.snapshot().unwrap().page, 4);

        tokio::time::sleep(std::time::Duration::from_millis(350)).await;
        assert_eq!(store.snapshot().unwrap().page, 1);
        assert_eq!(table.pagination().page_index, 0);
    }

    #[test]
    fn test_header_toggle_cycles_state() {
        let (_store, mut table) = controller(TableConfig::default());
        load(&mut table, 1..4);
        assert_eq!(table.header_check_state(), CheckState::Unchecked);

        table.toggle_row("1");
        assert_eq!(table.header_check_state(), CheckState::Indeterminate);
        assert_eq!(table.row_check_state("1"), CheckState::Checked);

        table.toggle_all_page_rows();
        assert_eq!(table.header_check_state(), CheckState::Checked);
        assert_eq!(table.selected_count(), 3);

        table.toggle_all_page_rows();
        assert_eq!(table.header_check_state(), CheckState::Unchecked);
        assert_eq!(table.selected_count(), 0);
    }

    #[test]
    fn test_disabled_selection_has_no_column_and_ignores_toggles() {
        let (_store, mut table) = controller(TableConfig::default().with_row_selection(false));
        load(&mut table, 1..3);

        assert!(table.columns().iter().all(|c| !c.is_selection()));
        table.toggle_all_page_rows();
        assert_eq!(table.selected_count(), 0);
    }

    #[test]
    fn test_visibility_hides_columns() {
        let (_store, mut table) =
            controller(TableConfig::default().with_column_visible("email", false));
        let ids: Vec<_> = table.visible_columns().map(TableColumn::id).collect();
        assert_eq!(ids, vec!["select", "name"]);

        table.on_column_visibility_change(Update::derive(|v: &ColumnVisibility| {
            let mut next = v.clone();
            next.insert("email".to_string(), true);
            next
        }));
        assert_eq!(table.visible_columns().count(), 3);
    }

    #[test]
    fn test_failed_fetch_keeps_rows() {
        let (_store, mut table) = controller(TableConfig::default());
        load(&mut table, 1..3);

        let ticket = table.begin_fetch();
        assert!(table.is_fetching());
        assert!(!table.complete_fetch(ticket, Err(FetchError::failed("boom"))));
        assert!(!table.is_fetching());
        assert_eq!(table.rows().len(), 2);
    }

    #[test]
    fn test_stale_fetch_is_dropped() {
        let (_store, mut table) = controller(TableConfig::default());
        let stale = table.begin_fetch();
        let fresh = table.begin_fetch();

        assert!(table.complete_fetch(fresh, Ok(PageData::new(vec![User { id: 9 }], 1))));
        assert!(!table.complete_fetch(stale, Ok(PageData::new(vec![User { id: 1 }], 1))));
        assert_eq!(table.rows()[0].id, 9);
    }

    #[test]
    fn test_sorting_passes_through_to_request() {
        let (_store, mut table) = controller(TableConfig::default());
        table.on_sorting_change(Update::Direct(vec![ColumnSort::desc("name")]));
        assert_eq!(table.fetch_request().sorting, vec![ColumnSort::desc("name")]);
        assert_eq!(table.fetch_request().page_index, 0);
    }
}
