//! Filter fields and column filters.
//!
//! A filter field is either *searchable* (free text) or *filterable* (one or
//! more values picked from a fixed option set). The kind decides how a
//! column filter is written to the query store.

mod sync;

pub use sync::FilterSync;

use serde::{Deserialize, Serialize};

use crate::query::{QueryState, QueryValue};

/// A selectable option of a filterable field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOption {
    /// Display label.
    pub label: String,
    /// Value written to the query store.
    pub value: String,
}

impl FilterOption {
    /// Creates a new option.
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// A filter field declared by the caller.
///
/// When deserialized, a field with an `options` list is filterable and a
/// field without one is searchable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterField {
    /// Discrete field; persisted as a list of option values.
    Filterable {
        id: String,
        label: String,
        options: Vec<FilterOption>,
    },
    /// Free-text field; persisted as a single string.
    Searchable { id: String, label: String },
}

impl FilterField {
    /// Creates a searchable field.
    pub fn searchable(id: impl Into<String>, label: impl Into<String>) -> Self {
        FilterField::Searchable {
            id: id.into(),
            label: label.into(),
        }
    }

    /// Creates a filterable field with the given options.
    pub fn filterable(
        id: impl Into<String>,
        label: impl Into<String>,
        options: impl IntoIterator<Item = FilterOption>,
    ) -> Self {
        FilterField::Filterable {
            id: id.into(),
            label: label.into(),
            options: options.into_iter().collect(),
        }
    }

    /// The field id, shared with the column and the query key.
    pub fn id(&self) -> &str {
        match self {
            FilterField::Filterable { id, .. } | FilterField::Searchable { id, .. } => id,
        }
    }

    /// The display label.
    pub fn label(&self) -> &str {
        match self {
            FilterField::Filterable { label, .. } | FilterField::Searchable { label, .. } => label,
        }
    }

    /// The option set; empty for searchable fields.
    pub fn options(&self) -> &[FilterOption] {
        match self {
            FilterField::Filterable { options, .. } => options,
            FilterField::Searchable { .. } => &[],
        }
    }

    /// Returns `true` for free-text fields.
    pub fn is_searchable(&self) -> bool {
        matches!(self, FilterField::Searchable { .. })
    }

    /// Converts a column filter value into the shape this field persists.
    ///
    /// Text on a filterable field becomes a one-element list; a list on a
    /// searchable field is joined with commas.
    pub fn persisted_value(&self, value: &QueryValue) -> QueryValue {
        match (self, value) {
            (FilterField::Searchable { .. }, QueryValue::List(items)) => {
                QueryValue::Text(items.join(","))
            }
            (FilterField::Filterable { .. }, QueryValue::Text(text)) => {
                QueryValue::List(vec![text.clone()])
            }
            (_, value) => value.clone(),
        }
    }

    /// Returns `true` if a persisted value has the shape this field writes.
    pub fn accepts(&self, value: &QueryValue) -> bool {
        matches!(
            (self, value),
            (FilterField::Searchable { .. }, QueryValue::Text(_))
                | (FilterField::Filterable { .. }, QueryValue::List(_))
        )
    }
}

/// An active column filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnFilter {
    /// Column (and filter field) id.
    pub id: String,
    /// Current value.
    pub value: QueryValue,
}

impl ColumnFilter {
    /// Creates a new column filter.
    pub fn new(id: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        Self {
            id: id.into(),
            value: value.into(),
        }
    }
}

/// Deduplicates filters by id. A later entry replaces an earlier one in place.
pub fn normalize_filters(filters: Vec<ColumnFilter>) -> Vec<ColumnFilter> {
    let mut out: Vec<ColumnFilter> = Vec::with_capacity(filters.len());
    for filter in filters {
        match out.iter_mut().find(|f| f.id == filter.id) {
            Some(existing) => existing.value = filter.value,
            None => out.push(filter),
        }
    }
    out
}

/// The caller's filter field declarations, looked up by id.
#[derive(Debug, Clone, Default)]
pub struct FilterFields {
    fields: Vec<FilterField>,
}

impl FilterFields {
    /// Creates a lookup over the given fields.
    pub fn new(fields: impl IntoIterator<Item = FilterField>) -> Self {
        Self {
            fields: fields.into_iter().collect(),
        }
    }

    /// Finds a field by id.
    pub fn get(&self, id: &str) -> Option<&FilterField> {
        self.fields.iter().find(|f| f.id() == id)
    }

    /// Iterates fields in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &FilterField> {
        self.fields.iter()
    }

    /// Returns `true` if no fields are declared.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Builds the initial column filters from a store snapshot.
    ///
    /// Only declared fields with a well-shaped, non-empty value are picked
    /// up; anything else is treated as absent. Order follows the field
    /// declarations.
    pub fn initial_filters(&self, state: &QueryState) -> Vec<ColumnFilter> {
        self.fields
            .iter()
            .filter_map(|field| {
                let value = state.filter(field.id())?;
                if value.is_empty() || !field.accepts(value) {
                    log::debug!(
                        "[filter] ignoring malformed persisted value for '{}'",
                        field.id()
                    );
                    return None;
                }
                Some(ColumnFilter::new(field.id(), value.clone()))
            })
            .collect()
    }
}
