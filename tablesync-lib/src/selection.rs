//! Cross-page row selection.
//!
//! Selection is tracked per page index. For each page the store keeps the
//! selection flags reported by the table widget and the row payloads captured
//! when the rows were selected. Payloads are kept after the page scrolls away
//! or is refetched, so a selection can span many pages.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::update::Update;

/// Selection flags for one page, keyed by row id.
pub type RowSelection = BTreeMap<String, bool>;

/// A row the controller can select.
///
/// The controller never looks inside a row except for its id.
pub trait TableRow: Send + Sync + 'static {
    /// Unique, stable identifier for this row.
    fn id(&self) -> String;
}

/// Row payloads selected on one page, in selection order.
#[derive(Debug)]
pub struct PageRecords<T> {
    entries: Vec<(String, Arc<T>)>,
}

impl<T> Default for PageRecords<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> Clone for PageRecords<T> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<T> PageRecords<T> {
    /// Inserts a row; a row already present keeps its position.
    pub fn insert(&mut self, row_id: String, row: Arc<T>) {
        match self.entries.iter_mut().find(|(id, _)| *id == row_id) {
            Some(entry) => entry.1 = row,
            None => self.entries.push((row_id, row)),
        }
    }

    /// Removes a row. Returns `true` if it was present.
    pub fn remove(&mut self, row_id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(id, _)| id != row_id);
        self.entries.len() != before
    }

    /// Looks up a row by id.
    pub fn get(&self, row_id: &str) -> Option<&Arc<T>> {
        self.entries
            .iter()
            .find(|(id, _)| id == row_id)
            .map(|(_, row)| row)
    }

    /// Returns `true` if the row is present.
    pub fn contains(&self, row_id: &str) -> bool {
        self.get(row_id).is_some()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no rows are selected on this page.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates `(row_id, row)` in selection order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<T>)> {
        self.entries.iter().map(|(id, row)| (id.as_str(), row))
    }

    /// Iterates row ids in selection order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(id, _)| id.as_str())
    }
}

/// Owns selection flags and captured rows for every page.
///
/// Nothing here is persisted; the store lives as long as its controller.
#[derive(Debug)]
pub struct SelectionStore<T> {
    keys: BTreeMap<usize, RowSelection>,
    records: BTreeMap<usize, PageRecords<T>>,
}

impl<T> Default for SelectionStore<T> {
    fn default() -> Self {
        Self {
            keys: BTreeMap::new(),
            records: BTreeMap::new(),
        }
    }
}

impl<T: TableRow> SelectionStore<T> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Captures or releases one row's payload on `page_index`.
    ///
    /// Flags are left alone; the table widget reports those separately
    /// through [`on_row_selection_change`](Self::on_row_selection_change).
    pub fn handle_row_selection_change(
        &mut self,
        page_index: usize,
        row_id: &str,
        row: Arc<T>,
        is_selected: bool,
    ) {
        let records = self.records.entry(page_index).or_default();
        if is_selected {
            records.insert(row_id.to_string(), row);
        } else {
            records.remove(row_id);
        }
        log::debug!(
            "[selection] page {}: row '{}' {}",
            page_index,
            row_id,
            if is_selected { "captured" } else { "released" }
        );
    }

    /// Applies a flag update for `page_index` and rebuilds that page's rows.
    ///
    /// The rebuild keeps exactly the rows whose resolved flag is true.
    /// Visible rows are taken from `visible_rows`; selected rows that are no
    /// longer visible (the page was refetched with different rows) keep the
    /// payload captured earlier. Select-all and clear-all never enumerate
    /// rows individually, so this is what keeps flags and payloads in step.
    /// A flagged row that was never visible has no payload to capture.
    pub fn on_row_selection_change(
        &mut self,
        page_index: usize,
        update: Update<RowSelection>,
        visible_rows: &[Arc<T>],
    ) {
        let next = update.resolve(self.keys.get(&page_index).unwrap_or(&RowSelection::new()));
        let previous = self.records.remove(&page_index).unwrap_or_default();
        let flagged = |id: &str| next.get(id).copied().unwrap_or(false);

        let visible: Vec<(String, &Arc<T>)> =
            visible_rows.iter().map(|row| (row.id(), row)).collect();
        let mut rebuilt = PageRecords::default();
        for (id, row) in previous.iter() {
            if !flagged(id) {
                continue;
            }
            let current = visible
                .iter()
                .find(|(visible_id, _)| visible_id == id)
                .map_or(row, |(_, visible_row)| *visible_row);
            rebuilt.insert(id.to_string(), current.clone());
        }
        for (id, row) in &visible {
            if flagged(id.as_str()) && !rebuilt.contains(id) {
                rebuilt.insert(id.clone(), (*row).clone());
            }
        }

        log::debug!(
            "[selection] page {}: {} rows selected, {} of {} visible",
            page_index,
            rebuilt.len(),
            visible.iter().filter(|(id, _)| flagged(id.as_str())).count(),
            visible_rows.len()
        );
        self.records.insert(page_index, rebuilt);
        self.keys.insert(page_index, next);
    }

    /// Flags for `page_index`; empty when the page has never been touched.
    pub fn keys_for_page(&self, page_index: usize) -> RowSelection {
        self.keys.get(&page_index).cloned().unwrap_or_default()
    }

    /// Captured rows for `page_index`.
    pub fn records_for_page(&self, page_index: usize) -> Option<&PageRecords<T>> {
        self.records.get(&page_index)
    }

    /// Returns `true` if the row is flagged on `page_index`.
    pub fn is_selected(&self, page_index: usize, row_id: &str) -> bool {
        self.keys
            .get(&page_index)
            .and_then(|keys| keys.get(row_id))
            .copied()
            .unwrap_or(false)
    }

    /// Every captured row, by page index then selection order.
    pub fn all_selected_records(&self) -> Vec<Arc<T>> {
        self.records
            .values()
            .flat_map(|page| page.iter().map(|(_, row)| row.clone()))
            .collect()
    }

    /// Ids of every captured row, in the same order as
    /// [`all_selected_records`](Self::all_selected_records).
    pub fn selected_ids(&self) -> Vec<String> {
        self.records
            .values()
            .flat_map(|page| page.ids().map(str::to_string))
            .collect()
    }

    /// Total number of captured rows across pages.
    pub fn selected_count(&self) -> usize {
        self.records.values().map(PageRecords::len).sum()
    }

    /// Drops the selection on every page.
    pub fn clear(&mut self) {
        self.keys.clear();
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Row(&'static str);

    impl TableRow for Row {
        fn id(&self) -> String {
            self.0.to_string()
        }
    }

    fn rows(ids: &[&'static str]) -> Vec<Arc<Row>> {
        ids.iter().map(|&id| Arc::new(Row(id))).collect()
    }

    fn select(ids: &[&str]) -> Update<RowSelection> {
        Update::Direct(ids.iter().map(|id| (id.to_string(), true)).collect())
    }

    fn toggle(row_id: &'static str) -> Update<RowSelection> {
        Update::derive(move |prev: &RowSelection| {
            let mut next = prev.clone();
            let flag = next.get(row_id).copied().unwrap_or(false);
            next.insert(row_id.to_string(), !flag);
            next
        })
    }

    #[test]
    fn test_select_all_on_page_leaves_other_pages_alone() {
        let mut store = SelectionStore::new();
        let page0 = rows(&["x"]);
        store.on_row_selection_change(0, select(&["x"]), &page0);

        let page2 = rows(&["A", "B", "C"]);
        store.on_row_selection_change(2, select(&["A", "B", "C"]), &page2);

        assert_eq!(store.keys_for_page(2), select_map(&["A", "B", "C"]));
        let ids: Vec<_> = store.records_for_page(2).unwrap().ids().collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
        assert_eq!(store.keys_for_page(0), select_map(&["x"]));
        assert_eq!(store.records_for_page(0).unwrap().len(), 1);
    }

    fn select_map(ids: &[&str]) -> RowSelection {
        ids.iter().map(|id| (id.to_string(), true)).collect()
    }

    #[test]
    fn test_selection_survives_page_switch() {
        let mut store = SelectionStore::new();
        let page0 = rows(&["1", "2", "3"]);
        for id in ["1", "2"] {
            let row = page0.iter().find(|r| r.0 == id).unwrap().clone();
            store.handle_row_selection_change(0, id, row, true);
            store.on_row_selection_change(0, toggle(id), &page0);
        }

        // Visit page 1 without selecting anything, then come back.
        assert!(store.keys_for_page(1).is_empty());
        assert!(store.records_for_page(1).is_none());

        assert_eq!(store.keys_for_page(0), select_map(&["1", "2"]));
        let ids: Vec<_> = store.records_for_page(0).unwrap().ids().collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn test_records_outlive_refetched_rows() {
        let mut store = SelectionStore::new();
        let page0 = rows(&["1", "2"]);
        store.on_row_selection_change(0, select(&["1"]), &page0);

        // Page 1 is loaded and selected; page 0's rows are gone from view.
        let page1 = rows(&["3", "4"]);
        store.on_row_selection_change(1, select(&["4"]), &page1);

        let all: Vec<_> = store.all_selected_records().iter().map(|r| r.0).collect();
        assert_eq!(all, vec!["1", "4"]);
        assert_eq!(store.selected_ids(), vec!["1".to_string(), "4".to_string()]);
    }

    #[test]
    fn test_refetched_page_keeps_selected_records() {
        let mut store = SelectionStore::new();
        let first = rows(&["1", "2", "3"]);
        store.handle_row_selection_change(0, "1", first[0].clone(), true);
        store.on_row_selection_change(0, toggle("1"), &first);

        // Same page index, different rows (e.g. after a filter reset).
        let second = rows(&["10", "11"]);
        store.handle_row_selection_change(0, "10", second[0].clone(), true);
        store.on_row_selection_change(0, toggle("10"), &second);

        assert_eq!(store.keys_for_page(0), select_map(&["1", "10"]));
        let ids: Vec<_> = store.records_for_page(0).unwrap().ids().collect();
        assert_eq!(ids, vec!["1", "10"]);
        assert_eq!(store.selected_count(), 2);

        // Deselecting a row that is no longer visible still releases it.
        store.on_row_selection_change(0, toggle("1"), &second);
        assert_eq!(store.selected_ids(), vec!["10".to_string()]);
    }

    #[test]
    fn test_select_all_before_rows_load_selects_nothing() {
        let mut store: SelectionStore<Row> = SelectionStore::new();
        store.on_row_selection_change(0, select(&["1", "2"]), &[]);

        assert_eq!(store.selected_count(), 0);
        assert!(store.records_for_page(0).unwrap().is_empty());
    }

    #[test]
    fn test_deselect_releases_record() {
        let mut store = SelectionStore::new();
        let page0 = rows(&["1", "2"]);
        store.on_row_selection_change(0, select(&["1", "2"]), &page0);

        store.handle_row_selection_change(0, "1", page0[0].clone(), false);
        store.on_row_selection_change(0, toggle("1"), &page0);

        assert!(!store.is_selected(0, "1"));
        assert!(store.is_selected(0, "2"));
        assert_eq!(store.selected_count(), 1);
    }

    #[test]
    fn test_count_matches_sum_of_pages() {
        let mut store = SelectionStore::new();
        store.on_row_selection_change(0, select(&["a", "b"]), &rows(&["a", "b", "c"]));
        store.on_row_selection_change(3, select(&["d"]), &rows(&["d"]));
        store.on_row_selection_change(5, select(&[]), &rows(&["e"]));

        let sum: usize = [0, 3, 5]
            .iter()
            .filter_map(|&p| store.records_for_page(p))
            .map(PageRecords::len)
            .sum();
        assert_eq!(store.selected_count(), sum);
        assert_eq!(sum, 3);

        store.clear();
        assert_eq!(store.selected_count(), 0);
    }
}
