//! Persisted query state.
//!
//! The query store is the source of truth for the current page, the page
//! size and every persisted filter. It survives navigation; the controller
//! only reads snapshots and writes partial patches.

mod memory;
mod url_query;

pub use memory::MemoryQueryStore;
pub use url_query::{QuerySchema, UrlQueryStore};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Default 1-indexed page.
pub const DEFAULT_PAGE: u32 = 1;

/// Default number of rows per page.
pub const DEFAULT_PER_PAGE: u32 = 10;

/// A persisted filter value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
    /// Free-text value.
    Text(String),
    /// Ordered list of discrete values.
    List(Vec<String>),
}

impl QueryValue {
    /// Returns `true` if the value carries nothing worth persisting.
    pub fn is_empty(&self) -> bool {
        match self {
            QueryValue::Text(s) => s.is_empty(),
            QueryValue::List(items) => items.is_empty(),
        }
    }

    /// Returns the text value, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            QueryValue::Text(s) => Some(s),
            QueryValue::List(_) => None,
        }
    }

    /// Returns the list value, if this is a list value.
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            QueryValue::Text(_) => None,
            QueryValue::List(items) => Some(items),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Text(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Text(value)
    }
}

impl From<Vec<String>> for QueryValue {
    fn from(value: Vec<String>) -> Self {
        QueryValue::List(value)
    }
}

impl<const N: usize> From<[&str; N]> for QueryValue {
    fn from(value: [&str; N]) -> Self {
        QueryValue::List(value.iter().map(|s| s.to_string()).collect())
    }
}

/// Snapshot of the persisted query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryState {
    /// 1-indexed page, always at least 1.
    pub page: u32,
    /// Rows per page, always at least 1.
    pub per_page: u32,
    /// Persisted filters by key. Absent keys are not set.
    #[serde(flatten)]
    pub filters: BTreeMap<String, QueryValue>,
}

impl Default for QueryState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE, DEFAULT_PER_PAGE)
    }
}

impl QueryState {
    /// Creates a state with no filters.
    ///
    /// Out-of-range values are clamped to 1.
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
            filters: BTreeMap::new(),
        }
    }

    /// Sets a filter value.
    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        let value = value.into();
        if !value.is_empty() {
            self.filters.insert(key.into(), value);
        }
        self
    }

    /// Returns a persisted filter value.
    pub fn filter(&self, key: &str) -> Option<&QueryValue> {
        self.filters.get(key)
    }

    /// Merges a partial update into this state.
    ///
    /// Keys not named by the patch are left alone. A zero page is stored as
    /// 1 and a zero page size is ignored. Empty filter values clear their key.
    pub fn apply(&mut self, patch: &QueryPatch) {
        if let Some(page) = patch.page {
            self.page = page.max(1);
        }
        if let Some(per_page) = patch.per_page.filter(|&n| n > 0) {
            self.per_page = per_page;
        }
        for (key, value) in &patch.filters {
            match value {
                Some(value) if !value.is_empty() => {
                    self.filters.insert(key.clone(), value.clone());
                }
                _ => {
                    self.filters.remove(key);
                }
            }
        }
    }
}

/// A partial update to the persisted query.
///
/// A filter key mapped to `None` is cleared.
///
/// # Example
///
/// ```
/// use tablesync_lib::query::{QueryPatch, QueryState};
///
/// let mut state = QueryState::new(3, 10).with_filter("status", ["active"]);
/// let patch = QueryPatch::new().page(1).clear("status").set("name", "john");
/// state.apply(&patch);
///
/// assert_eq!(state.page, 1);
/// assert!(state.filter("status").is_none());
/// assert_eq!(state.filter("name").and_then(|v| v.as_text()), Some("john"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryPatch {
    /// New 1-indexed page.
    pub page: Option<u32>,
    /// New page size.
    pub per_page: Option<u32>,
    /// Filter writes; `None` clears the key.
    pub filters: BTreeMap<String, Option<QueryValue>>,
}

impl QueryPatch {
    /// Creates an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the page.
    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Sets the page size.
    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page);
        self
    }

    /// Sets a filter value.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.filters.insert(key.into(), Some(value.into()));
        self
    }

    /// Clears a filter key.
    pub fn clear(mut self, key: impl Into<String>) -> Self {
        self.filters.insert(key.into(), None);
        self
    }

    /// Returns `true` if applying this patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self.page.is_none() && self.per_page.is_none() && self.filters.is_empty()
    }

    /// Folds a later patch into this one. Keys in `later` win.
    pub fn merge(&mut self, later: QueryPatch) {
        if later.page.is_some() {
            self.page = later.page;
        }
        if later.per_page.is_some() {
            self.per_page = later.per_page;
        }
        self.filters.extend(later.filters);
    }
}

/// Backend for the persisted query.
///
/// Implementations hold the page, page size and filter keys. Writes are
/// partial: only the keys named by the patch change, and a patch is applied
/// as one unit.
pub trait QueryStore: Send + Sync {
    /// Reads the current state.
    fn snapshot(&self) -> Result<QueryState, StoreError>;

    /// Applies a partial update.
    fn apply(&self, patch: QueryPatch) -> Result<(), StoreError>;
}
