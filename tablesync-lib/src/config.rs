//! Controller configuration.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::query::DEFAULT_PER_PAGE;
use crate::source::ColumnSort;

/// Default quiet period before filter edits are persisted.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Every option recognized by the table controller.
///
/// Resolved once when the controller is built. Missing fields in a
/// deserialized config take their defaults.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use tablesync_lib::config::TableConfig;
///
/// let config = TableConfig::default()
///     .with_debounce(Duration::from_millis(500))
///     .with_row_selection(false);
///
/// assert_eq!(config.debounce(), Duration::from_millis(500));
/// assert!(!config.enable_row_selection);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Quiet period, in milliseconds, before a burst of filter edits is
    /// written to the query store. `0` writes every edit immediately.
    ///
    /// Default: 300
    pub debounce_ms: u64,

    /// Whether to inject the tri-state selection column.
    ///
    /// Default: true
    pub enable_row_selection: bool,

    /// Page size used when the query store cannot be read.
    ///
    /// Default: 10
    pub default_per_page: u32,

    /// Column visibility at mount, by column id. Unlisted columns are visible.
    ///
    /// Default: empty
    pub initial_column_visibility: BTreeMap<String, bool>,

    /// Sorting at mount, passed through to the data source.
    ///
    /// Default: empty
    pub initial_sorting: Vec<ColumnSort>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            enable_row_selection: true,
            default_per_page: DEFAULT_PER_PAGE,
            initial_column_visibility: BTreeMap::new(),
            initial_sorting: Vec::new(),
        }
    }
}

impl TableConfig {
    /// Creates a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// The filter debounce window.
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Sets the filter debounce window.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce_ms = u64::try_from(debounce.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Enables or disables the selection column.
    pub fn with_row_selection(mut self, enabled: bool) -> Self {
        self.enable_row_selection = enabled;
        self
    }

    /// Sets the fallback page size.
    pub fn with_default_per_page(mut self, per_page: u32) -> Self {
        self.default_per_page = per_page.max(1);
        self
    }

    /// Sets one column's initial visibility.
    pub fn with_column_visible(mut self, column_id: impl Into<String>, visible: bool) -> Self {
        self.initial_column_visibility.insert(column_id.into(), visible);
        self
    }

    /// Sets the initial sorting.
    pub fn with_sorting(mut self, sorting: Vec<ColumnSort>) -> Self {
        self.initial_sorting = sorting;
        self
    }
}
