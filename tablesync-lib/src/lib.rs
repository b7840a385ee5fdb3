//! Table state synchronization library
//!
//! Keeps a remotely paginated, filterable, selectable data table in step
//! with a persisted query (typically a page URL). Pagination and filters are
//! read from and written to a [`QueryStore`]; row selection survives page
//! switches; filter edits are debounced and always reset to page 1.

pub mod columns;
pub mod config;
pub mod coordinator;
pub mod debounce;
pub mod error;
pub mod filter;
pub mod pagination;
pub mod query;
pub mod selection;
pub mod source;
pub mod update;

pub use columns::{CheckState, ColumnDef, ColumnSetBuilder, TableColumn};
pub use config::TableConfig;
pub use coordinator::{ColumnVisibility, TableController, TableOptions, TableState};
pub use error::{FetchError, StoreError};
pub use filter::{ColumnFilter, FilterField, FilterOption, FilterSync};
pub use pagination::{PaginationController, PaginationState};
pub use query::{
    MemoryQueryStore, QueryPatch, QuerySchema, QueryState, QueryStore, QueryValue, UrlQueryStore,
};
pub use selection::{RowSelection, SelectionStore, TableRow};
pub use source::{ColumnSort, DataSource, FetchRequest, FetchTicket, PageData};
pub use update::Update;
