//! Remote data source and fetch bookkeeping.
//!
//! The controller never computes pages itself. It hands the current page,
//! page size, persisted filters and sorting to a [`DataSource`] and shows
//! whatever rows come back, treating them as authoritative for that page.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::FetchError;
use crate::query::QueryValue;

/// One sorted column, passed through to the data source untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSort {
    pub id: String,
    #[serde(default)]
    pub desc: bool,
}

impl ColumnSort {
    /// Ascending sort on `id`.
    pub fn asc(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            desc: false,
        }
    }

    /// Descending sort on `id`.
    pub fn desc(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            desc: true,
        }
    }
}

/// Parameters of one fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// 0-indexed page.
    pub page_index: usize,
    /// Rows per page, always at least 1.
    pub page_size: u32,
    /// Persisted filters at the time of the request.
    pub filters: BTreeMap<String, QueryValue>,
    /// Sorting, in priority order.
    pub sorting: Vec<ColumnSort>,
}

/// One page of rows.
#[derive(Debug, Clone)]
pub struct PageData<T> {
    /// Rows of the requested page.
    pub rows: Vec<T>,
    /// Total number of pages for the current filters.
    pub page_count: usize,
}

impl<T> PageData<T> {
    /// Creates a page.
    pub fn new(rows: Vec<T>, page_count: usize) -> Self {
        Self { rows, page_count }
    }
}

/// The remote fetch collaborator.
///
/// Retries and caching are the implementation's business.
#[async_trait]
pub trait DataSource<T: Send>: Send + Sync {
    /// Fetches one page.
    async fn fetch(&self, request: FetchRequest) -> Result<PageData<T>, FetchError>;
}

/// Handle for an issued fetch.
///
/// Only the most recently issued ticket may apply its result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    request: FetchRequest,
}

impl FetchTicket {
    /// The request this ticket was issued for.
    pub fn request(&self) -> &FetchRequest {
        &self.request
    }
}

/// Tracks issued fetches so the latest one wins.
#[derive(Debug, Default)]
pub struct FetchTracker {
    issued: u64,
    in_flight: bool,
}

impl FetchTracker {
    /// Creates a tracker with nothing in flight.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a ticket for `request`, superseding all earlier tickets.
    pub fn begin(&mut self, request: FetchRequest) -> FetchTicket {
        self.issued += 1;
        self.in_flight = true;
        FetchTicket {
            generation: self.issued,
            request,
        }
    }

    /// Returns `true` if `ticket` is the latest issued.
    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        ticket.generation == self.issued
    }

    /// Marks `ticket` as completed. Returns `false` for a stale ticket,
    /// whose result must be discarded.
    pub fn finish(&mut self, ticket: &FetchTicket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.in_flight = false;
        true
    }

    /// Advisory flag: a fetch is in flight.
    pub fn is_fetching(&self) -> bool {
        self.in_flight
    }
}
