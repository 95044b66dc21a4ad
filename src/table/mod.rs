//! Generic data table behind every management view.
//!
//! Rows are plain JSON records fetched from a gateway resource. The view is
//! derived on demand: search, then sort, then paginate. Nothing here mutates
//! rows; mutations go through [`TableController`], which refetches afterwards.

pub mod controller;
pub mod http;

use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;

pub use controller::{TableController, TableError, TableSource};
pub use http::HttpTableSource;

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Three-state column sort: unsorted, ascending, descending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum SortState {
    #[default]
    Unsorted,
    Sorted { column: String, direction: SortDirection },
}

impl SortState {
    pub fn ascending(column: impl Into<String>) -> Self {
        SortState::Sorted {
            column: column.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(column: impl Into<String>) -> Self {
        SortState::Sorted {
            column: column.into(),
            direction: SortDirection::Descending,
        }
    }

    /// Header click. A different column always starts at ascending.
    pub fn toggle(&mut self, column: &str) {
        *self = match std::mem::take(self) {
            SortState::Sorted { column: current, direction } if current == column => match direction {
                SortDirection::Ascending => SortState::descending(current),
                SortDirection::Descending => SortState::Unsorted,
            },
            _ => SortState::ascending(column),
        };
    }

    pub fn column(&self) -> Option<&str> {
        match self {
            SortState::Unsorted => None,
            SortState::Sorted { column, .. } => Some(column),
        }
    }
}

/// One page of the derived view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub rows: Vec<Value>,
    /// 1-based, already clamped into range
    pub page: usize,
    pub page_size: usize,
    pub total_rows: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub has_previous: bool,
}

/// View parameters the user controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableQuery {
    pub search: String,
    pub sort: SortState,
    pub page: usize,
}

impl Default for TableQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            sort: SortState::Unsorted,
            page: 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DataTable {
    rows: Vec<Value>,
    search_fields: Vec<String>,
    page_size: usize,
}

impl DataTable {
    pub fn new<I, S>(search_fields: I, page_size: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rows: Vec::new(),
            search_fields: search_fields.into_iter().map(Into::into).collect(),
            page_size: page_size.max(1),
        }
    }

    pub fn with_rows(mut self, rows: Vec<Value>) -> Self {
        self.rows = rows;
        self
    }

    /// Replace every row. Previous rows are discarded, never merged.
    pub fn set_rows(&mut self, rows: Vec<Value>) {
        self.rows = rows;
    }

    pub fn rows(&self) -> &[Value] {
        &self.rows
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Case-insensitive substring match over the configured fields.
    pub fn search(&self, term: &str) -> Vec<&Value> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return self.rows.iter().collect();
        }
        self.rows
            .iter()
            .filter(|row| {
                self.searchable(row)
                    .iter()
                    .any(|text| text.to_lowercase().contains(&needle))
            })
            .collect()
    }

    fn searchable(&self, row: &Value) -> Vec<String> {
        if self.search_fields.is_empty() {
            // no configured fields: every top-level field is searchable
            return row
                .as_object()
                .map(|map| map.keys().filter_map(|key| field_text(row, key)).collect())
                .unwrap_or_default();
        }
        self.search_fields
            .iter()
            .filter_map(|field| field_text(row, field))
            .collect()
    }

    pub fn view(&self, query: &TableQuery) -> Page {
        let mut rows = self.search(&query.search);
        sort_rows(&mut rows, &query.sort);
        paginate(&rows, query.page, self.page_size)
    }
}

fn field_text(row: &Value, field: &str) -> Option<String> {
    match row.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

// Missing values sort after present ones in ascending order
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Greater,
        (_, None | Some(Value::Null)) => Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.to_lowercase().cmp(&y.to_lowercase()),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

/// Stable sort; ties keep their fetched order.
pub fn sort_rows(rows: &mut [&Value], sort: &SortState) {
    if let SortState::Sorted { column, direction } = sort {
        rows.sort_by(|a, b| {
            let ord = compare_values(a.get(column.as_str()), b.get(column.as_str()));
            match direction {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            }
        });
    }
}

/// Slice out one page, clamping `page` into `1..=total_pages`.
pub fn paginate(rows: &[&Value], page: usize, page_size: usize) -> Page {
    let page_size = page_size.max(1);
    let total_rows = rows.len();
    let total_pages = total_rows.div_ceil(page_size).max(1);
    let page = page.clamp(1, total_pages);

    let start = (page - 1) * page_size;
    let end = (start + page_size).min(total_rows);
    let rows = rows
        .get(start..end)
        .unwrap_or_default()
        .iter()
        .map(|row| (*row).clone())
        .collect();

    Page {
        rows,
        page,
        page_size,
        total_rows,
        total_pages,
        has_next: page < total_pages,
        has_previous: page > 1,
    }
}
