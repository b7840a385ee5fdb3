//! Column set assembly and the synthetic selection column.

use crate::selection::RowSelection;
use crate::update::Update;

/// Id of the injected selection column.
pub const SELECTION_COLUMN_ID: &str = "select";

/// Visual state of a selection checkbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckState {
    #[default]
    Unchecked,
    Checked,
    /// Some, but not all, rows are selected.
    Indeterminate,
}

impl CheckState {
    /// State of a single row's checkbox.
    pub fn from_flag(selected: bool) -> Self {
        if selected {
            CheckState::Checked
        } else {
            CheckState::Unchecked
        }
    }

    /// State of the header checkbox for the rows on the current page.
    ///
    /// An empty page is unchecked.
    pub fn for_rows<'a>(
        selection: &RowSelection,
        row_ids: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let (mut total, mut selected) = (0usize, 0usize);
        for id in row_ids {
            total += 1;
            if selection.get(id).copied().unwrap_or(false) {
                selected += 1;
            }
        }

        match selected {
            0 => CheckState::Unchecked,
            n if n == total => CheckState::Checked,
            _ => CheckState::Indeterminate,
        }
    }

    /// Returns `true` only for the fully checked state.
    pub fn is_checked(&self) -> bool {
        matches!(self, CheckState::Checked)
    }
}

/// The bulk update issued by toggling the header checkbox.
///
/// Every id in `row_ids` is set to the opposite of "all selected"; flags for
/// other ids are kept.
pub fn toggle_all_update(row_ids: Vec<String>) -> Update<RowSelection> {
    Update::derive(move |prev: &RowSelection| {
        let value = !CheckState::for_rows(prev, row_ids.iter().map(String::as_str)).is_checked();
        let mut next = prev.clone();
        for id in row_ids {
            next.insert(id, value);
        }
        next
    })
}

/// The per-row update issued by toggling a row checkbox.
pub fn toggle_row_update(row_id: impl Into<String>) -> Update<RowSelection> {
    let row_id = row_id.into();
    Update::derive(move |prev: &RowSelection| {
        let mut next = prev.clone();
        let flag = next.get(&row_id).copied().unwrap_or(false);
        next.insert(row_id, !flag);
        next
    })
}

/// A caller-supplied column descriptor.
///
/// Everything but the id is render metadata the controller passes through.
pub trait ColumnDef {
    /// Stable column id.
    fn id(&self) -> &str;
}

/// A column as seen by the rendering layer.
#[derive(Debug, Clone, PartialEq)]
pub enum TableColumn<C> {
    /// The injected tri-state selection column.
    Selection,
    /// A caller column, unchanged.
    Data(C),
}

impl<C: ColumnDef> TableColumn<C> {
    /// The column id.
    pub fn id(&self) -> &str {
        match self {
            TableColumn::Selection => SELECTION_COLUMN_ID,
            TableColumn::Data(column) => column.id(),
        }
    }

    /// Returns `true` for the injected selection column.
    pub fn is_selection(&self) -> bool {
        matches!(self, TableColumn::Selection)
    }
}

/// Assembles the final column list.
#[derive(Debug, Clone)]
pub struct ColumnSetBuilder<C> {
    columns: Vec<C>,
    row_selection: bool,
}

impl<C: ColumnDef + Clone> ColumnSetBuilder<C> {
    /// Starts from the caller's columns, in order.
    pub fn new(columns: Vec<C>) -> Self {
        Self {
            columns,
            row_selection: false,
        }
    }

    /// Enables or disables the selection column.
    pub fn with_row_selection(mut self, enabled: bool) -> Self {
        self.row_selection = enabled;
        self
    }

    /// Builds the column list: the selection column first when enabled,
    /// then the caller's columns.
    pub fn build(&self) -> Vec<TableColumn<C>> {
        let selection = self.row_selection.then_some(TableColumn::Selection);
        selection
            .into_iter()
            .chain(self.columns.iter().cloned().map(TableColumn::Data))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Col(&'static str);

    impl ColumnDef for Col {
        fn id(&self) -> &str {
            self.0
        }
    }

    fn flags(pairs: &[(&str, bool)]) -> RowSelection {
        pairs.iter().map(|(id, v)| (id.to_string(), *v)).collect()
    }

    #[test]
    fn test_build_prepends_selection_column() {
        let columns = ColumnSetBuilder::new(vec![Col("name"), Col("email")])
            .with_row_selection(true)
            .build();
        let ids: Vec<_> = columns.iter().map(TableColumn::id).collect();
        assert_eq!(ids, vec!["select", "name", "email"]);
        assert!(columns[0].is_selection());
    }

    #[test]
    fn test_build_without_selection_keeps_columns() {
        let columns = ColumnSetBuilder::new(vec![Col("name"), Col("email")]).build();
        assert_eq!(columns, vec![TableColumn::Data(Col("name")), TableColumn::Data(Col("email"))]);
    }

    #[test]
    fn test_header_state() {
        let ids = ["a", "b", "c"];
        assert_eq!(CheckState::for_rows(&flags(&[]), ids), CheckState::Unchecked);
        assert_eq!(
            CheckState::for_rows(&flags(&[("a", true), ("b", false)]), ids),
            CheckState::Indeterminate
        );
        assert_eq!(
            CheckState::for_rows(&flags(&[("a", true), ("b", true), ("c", true)]), ids),
            CheckState::Checked
        );
        assert_eq!(CheckState::for_rows(&flags(&[("a", true)]), []), CheckState::Unchecked);
    }

    #[test]
    fn test_toggle_all_selects_then_clears() {
        let ids = || vec!["a".to_string(), "b".to_string()];
        let partial = flags(&[("a", true), ("z", true)]);

        let all = toggle_all_update(ids()).resolve(&partial);
        assert_eq!(all, flags(&[("a", true), ("b", true), ("z", true)]));

        let none = toggle_all_update(ids()).resolve(&all);
        assert_eq!(none, flags(&[("a", false), ("b", false), ("z", true)]));
    }

    #[test]
    fn test_toggle_row() {
        let next = toggle_row_update("a").resolve(&flags(&[]));
        assert_eq!(next, flags(&[("a", true)]));
        assert_eq!(toggle_row_update("a").resolve(&next), flags(&[("a", false)]));
    }
}
