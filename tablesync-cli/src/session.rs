//! Scripted demo session against an in-memory user directory.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tablesync_lib::{
    ColumnDef, ColumnFilter, DataSource, FetchError, FetchRequest, FilterField, FilterOption,
    PageData, PaginationState, QuerySchema, QueryValue, TableController, TableOptions, TableRow,
    TableState, Update, UrlQueryStore,
};

use crate::config::DemoConfig;
use crate::error::AppError;

const STATUSES: [&str; 3] = ["active", "pending", "disabled"];

/// A demo row.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: u32,
    pub name: String,
    pub status: &'static str,
}

impl TableRow for User {
    fn id(&self) -> String {
        self.id.to_string()
    }
}

/// A demo column.
#[derive(Debug, Clone)]
pub struct Column(&'static str);

impl ColumnDef for Column {
    fn id(&self) -> &str {
        self.0
    }
}

/// Serves generated users, filtering by `name` substring and `status`.
pub struct Directory {
    users: Vec<User>,
}

impl Directory {
    pub fn new(count: u32) -> Self {
        let users = (1..=count)
            .map(|id| User {
                id,
                name: format!("user{id}"),
                status: STATUSES[id as usize % STATUSES.len()],
            })
            .collect();
        Self { users }
    }
}

#[async_trait]
impl DataSource<User> for Directory {
    async fn fetch(&self, request: FetchRequest) -> Result<PageData<User>, FetchError> {
        log::debug!(
            "directory fetch: page {} size {} filters {:?}",
            request.page_index,
            request.page_size,
            request.filters
        );
        let name = request.filters.get("name").and_then(QueryValue::as_text);
        let status = request.filters.get("status").and_then(QueryValue::as_list);

        let matching: Vec<_> = self
            .users
            .iter()
            .filter(|u| name.is_none_or(|n| u.name.contains(n)))
            .filter(|u| status.is_none_or(|s| s.iter().any(|v| v == u.status)))
            .cloned()
            .collect();

        let size = request.page_size as usize;
        let page_count = matching.len().div_ceil(size);
        let rows = matching
            .into_iter()
            .skip(request.page_index * size)
            .take(size)
            .collect();
        Ok(PageData::new(rows, page_count))
    }
}

/// What the table looks like after one scripted step.
#[derive(Debug, Serialize)]
pub struct StepReport {
    pub step: &'static str,
    pub url: String,
    pub state: TableState,
    pub options: TableOptions,
    pub columns: Vec<String>,
    pub rows: Vec<String>,
    pub selected: Vec<String>,
}

fn filter_fields() -> Vec<FilterField> {
    vec![
        FilterField::searchable("name", "Name"),
        FilterField::filterable(
            "status",
            "Status",
            STATUSES.map(|s| FilterOption::new(s, s)),
        ),
    ]
}

fn columns() -> Vec<Column> {
    vec![Column("name"), Column("status")]
}

struct Session {
    store: Arc<UrlQueryStore>,
    table: TableController<User, Column>,
    source: Directory,
    reports: Vec<StepReport>,
}

impl Session {
    fn record(&mut self, step: &'static str) {
        log::info!("step '{}' at {}", step, self.store.url());
        self.reports.push(StepReport {
            step,
            url: self.store.url().to_string(),
            state: self.table.state(),
            options: self.table.options(),
            columns: self
                .table
                .visible_columns()
                .map(|c| c.id().to_string())
                .collect(),
            rows: self.table.rows().iter().map(|u| u.id()).collect(),
            selected: self.table.selection().selected_ids(),
        });
    }

    async fn reload(&mut self) {
        if !self.table.load(&self.source).await {
            log::warn!("reload did not replace rows");
        }
    }

    async fn settle(&self) {
        let quiet = self.table.config().debounce() + Duration::from_millis(20);
        tokio::time::sleep(quiet).await;
    }
}

/// Runs the scripted session and returns one report per step.
pub async fn run(config: DemoConfig) -> Result<Vec<StepReport>, AppError> {
    let fields = filter_fields();
    let store = Arc::new(UrlQueryStore::parse(
        &config.start_url,
        QuerySchema::from_fields(&fields),
    )?);
    let table = TableController::new(config.table, store.clone(), columns(), fields);

    let mut session = Session {
        store,
        table,
        source: Directory::new(config.row_count),
        reports: Vec::new(),
    };

    session.reload().await;
    session.record("mount");

    let first_two: Vec<String> = session
        .table
        .rows()
        .iter()
        .take(2)
        .map(|u| u.id())
        .collect();
    for id in &first_two {
        session.table.toggle_row(id);
    }
    session.record("select rows");

    session
        .table
        .on_pagination_change(Update::derive(|p: &PaginationState| {
            PaginationState::new(p.page_index + 1, p.page_size)
        }))?;
    session.reload().await;
    session.record("next page");

    session.table.toggle_all_page_rows();
    session.record("select page");

    for typed in ["u", "us", "use", "user", "user1"] {
        session
            .table
            .on_column_filters_change(Update::Direct(vec![ColumnFilter::new("name", typed)]));
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    session.settle().await;
    session.reload().await;
    session.record("search");

    session
        .table
        .on_column_filters_change(Update::derive(|prev: &Vec<ColumnFilter>| {
            let mut next = prev.clone();
            next.push(ColumnFilter::new("status", ["active"]));
            next
        }));
    session.settle().await;
    session.reload().await;
    session.record("filter status");

    session
        .table
        .on_pagination_change(Update::Direct(PaginationState::new(0, 25)))?;
    session.reload().await;
    session.record("page size");

    Ok(session.reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablesync_lib::TableConfig;

    fn step<'a>(reports: &'a [StepReport], name: &str) -> &'a StepReport {
        reports.iter().find(|r| r.step == name).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_scripted_session() {
        let reports = run(DemoConfig::default()).await.unwrap();

        let mount = step(&reports, "mount");
        assert_eq!(mount.rows.len(), 10);
        assert_eq!(mount.options.page_count, 5);
        assert_eq!(mount.columns, vec!["select", "name", "status"]);

        let next = step(&reports, "next page");
        assert!(next.url.contains("page=2"));
        assert!(next.state.row_selection.is_empty());
        assert_eq!(next.selected, vec!["1".to_string(), "2".to_string()]);

        let page = step(&reports, "select page");
        assert_eq!(page.selected.len(), 12);

        let search = step(&reports, "search");
        assert!(search.url.contains("page=1"));
        assert!(search.url.contains("name=user1"));
        assert!(search.rows.iter().all(|id| id.starts_with('1')));

        let sized = step(&reports, "page size");
        assert!(sized.url.contains("perPage=25"));
        assert!(sized.url.contains("status=active"));
    }

    #[tokio::test]
    async fn test_session_without_selection_column() {
        let config = DemoConfig {
            table: TableConfig::default()
                .with_row_selection(false)
                .with_debounce(Duration::ZERO),
            ..DemoConfig::default()
        };
        let reports = run(config).await.unwrap();

        let last = reports.last().unwrap();
        assert_eq!(last.columns, vec!["name", "status"]);
        assert!(last.selected.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_start_url() {
        let config = DemoConfig {
            start_url: "not a url".to_string(),
            ..DemoConfig::default()
        };
        assert!(matches!(run(config).await, Err(AppError::Store(_))));
    }
}
