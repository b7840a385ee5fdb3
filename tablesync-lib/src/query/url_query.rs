//! Query store backed by a URL query string.

use std::collections::BTreeSet;
use std::sync::RwLock;

use url::Url;

use super::{DEFAULT_PAGE, DEFAULT_PER_PAGE, QueryPatch, QueryState, QueryStore, QueryValue};
use crate::error::StoreError;
use crate::filter::FilterField;

const PAGE_KEY: &str = "page";
const PER_PAGE_KEY: &str = "perPage";
const LIST_SEPARATOR: char = ',';

/// Which query keys hold text and which hold lists.
///
/// A URL carries no type information, so the store must know how to parse
/// each filter key. Keys outside the schema are left untouched until a patch
/// writes them.
#[derive(Debug, Clone, Default)]
pub struct QuerySchema {
    text: BTreeSet<String>,
    list: BTreeSet<String>,
}

impl QuerySchema {
    /// Creates an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives the schema from filter fields.
    pub fn from_fields<'a>(fields: impl IntoIterator<Item = &'a FilterField>) -> Self {
        fields
            .into_iter()
            .fold(Self::new(), |schema, field| match field {
                FilterField::Searchable { id, .. } => schema.text(id.clone()),
                FilterField::Filterable { id, .. } => schema.list(id.clone()),
            })
    }

    /// Declares a text key.
    pub fn text(mut self, key: impl Into<String>) -> Self {
        self.text.insert(key.into());
        self
    }

    /// Declares a list key.
    pub fn list(mut self, key: impl Into<String>) -> Self {
        self.list.insert(key.into());
        self
    }

    fn owns(&self, key: &str) -> bool {
        key == PAGE_KEY || key == PER_PAGE_KEY || self.text.contains(key) || self.list.contains(key)
    }

    /// Declares every key `patch` sets that the schema does not know yet.
    fn adopt(&mut self, patch: &QueryPatch) {
        for (key, value) in &patch.filters {
            if self.owns(key) {
                continue;
            }
            match value {
                Some(QueryValue::Text(_)) => self.text.insert(key.clone()),
                Some(QueryValue::List(_)) => self.list.insert(key.clone()),
                None => continue,
            };
            log::debug!("[query] key '{}' written outside the schema, adopting it", key);
        }
    }

    fn parse_value(&self, key: &str, raw: &str) -> Option<QueryValue> {
        if self.text.contains(key) {
            return (!raw.is_empty()).then(|| QueryValue::Text(raw.to_string()));
        }
        if self.list.contains(key) {
            let items: Vec<String> = raw
                .split(LIST_SEPARATOR)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            return (!items.is_empty()).then_some(QueryValue::List(items));
        }
        None
    }
}

/// A query store that reads and writes the query string of a URL.
///
/// `page` and `perPage` are decimal integers; text filters are stored as
/// `key=value` and list filters as one comma-separated `key=a,b` pair.
/// Malformed page values read as the defaults.
///
/// A patch that sets a key outside the schema adds that key to the schema,
/// typed by the written value, so it reads back like a declared key.
///
/// # Example
///
/// ```
/// use tablesync_lib::query::{QueryPatch, QuerySchema, QueryStore, UrlQueryStore};
///
/// let schema = QuerySchema::new().text("name").list("status");
/// let store = UrlQueryStore::parse("https://app.test/users?page=2&perPage=20", schema).unwrap();
///
/// store.apply(QueryPatch::new().page(1).set("status", ["active", "pending"])).unwrap();
/// assert_eq!(
///     store.url().as_str(),
///     "https://app.test/users?page=1&perPage=20&status=active%2Cpending"
/// );
/// ```
#[derive(Debug)]
pub struct UrlQueryStore {
    location: RwLock<Location>,
    default_page: u32,
    default_per_page: u32,
}

#[derive(Debug)]
struct Location {
    url: Url,
    schema: QuerySchema,
}

impl UrlQueryStore {
    /// Creates a store over an existing URL.
    pub fn new(url: Url, schema: QuerySchema) -> Self {
        Self {
            location: RwLock::new(Location { url, schema }),
            default_page: DEFAULT_PAGE,
            default_per_page: DEFAULT_PER_PAGE,
        }
    }

    /// Parses `input` and creates a store over it.
    pub fn parse(input: &str, schema: QuerySchema) -> Result<Self, StoreError> {
        Ok(Self::new(Url::parse(input)?, schema))
    }

    /// Sets the values used when the URL has no usable page or page size.
    pub fn with_defaults(mut self, page: u32, per_page: u32) -> Self {
        self.default_page = page.max(1);
        self.default_per_page = per_page.max(1);
        self
    }

    /// Returns a copy of the current URL.
    pub fn url(&self) -> Url {
        self.location
            .read()
            .map(|g| g.url.clone())
            .unwrap_or_else(|e| e.into_inner().url.clone())
    }

    fn read_state(&self, location: &Location) -> QueryState {
        let mut state = QueryState::new(self.default_page, self.default_per_page);
        for (key, value) in location.url.query_pairs() {
            match &*key {
                PAGE_KEY => {
                    state.page = parse_positive(&value).unwrap_or(self.default_page);
                }
                PER_PAGE_KEY => {
                    state.per_page = parse_positive(&value).unwrap_or(self.default_per_page);
                }
                other => {
                    if let Some(parsed) = location.schema.parse_value(other, &value) {
                        state.filters.insert(other.to_string(), parsed);
                    }
                }
            }
        }
        state
    }

    /// Rewrites the query string from `state`. Pairs outside the schema are
    /// kept unless `patch` names their key.
    fn write_state(location: &mut Location, state: &QueryState, patch: &QueryPatch) {
        let Location { url, schema } = location;
        let foreign: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| !schema.owns(key) && !patch.filters.contains_key(&**key))
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();

        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        for (key, value) in &foreign {
            pairs.append_pair(key, value);
        }
        pairs.append_pair(PAGE_KEY, &state.page.to_string());
        pairs.append_pair(PER_PAGE_KEY, &state.per_page.to_string());
        for (key, value) in &state.filters {
            match value {
                QueryValue::Text(text) => pairs.append_pair(key, text),
                QueryValue::List(items) => {
                    pairs.append_pair(key, &items.join(&LIST_SEPARATOR.to_string()))
                }
            };
        }
    }
}

fn parse_positive(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok().filter(|&n| n > 0)
}

impl QueryStore for UrlQueryStore {
    fn snapshot(&self) -> Result<QueryState, StoreError> {
        let guard = self
            .location
            .read()
            .map_err(|_| StoreError::unavailable("url lock poisoned"))?;
        Ok(self.read_state(&guard))
    }

    fn apply(&self, patch: QueryPatch) -> Result<(), StoreError> {
        let mut guard = self
            .location
            .write()
            .map_err(|_| StoreError::unavailable("url lock poisoned"))?;
        guard.schema.adopt(&patch);
        let mut state = self.read_state(&guard);
        state.apply(&patch);
        Self::write_state(&mut guard, &state, &patch);
        Ok(())
    }
}
