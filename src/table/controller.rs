use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use super::{DataTable, Page, TableQuery};
use crate::error::FieldErrors;

#[derive(Error, Debug)]
pub enum TableError {
    #[error("validation failed: {0:?}")]
    Validation(FieldErrors),

    #[error("gateway rejected the request ({status}): {message}")]
    Rejected {
        status: u16,
        message: String,
        errors: FieldErrors,
    },

    #[error("gateway unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl TableError {
    /// Field level messages to show inline next to form inputs.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            TableError::Validation(errors) => Some(errors),
            TableError::Rejected { errors, .. } if !errors.is_empty() => Some(errors),
            _ => None,
        }
    }
}

/// Fetch, validate and mutate contract of one table resource.
#[async_trait]
pub trait TableSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<Value>, TableError>;

    /// Local checks run before anything is sent. Empty map means valid.
    fn validate(&self, _record: &Value) -> FieldErrors {
        FieldErrors::new()
    }

    async fn create(&self, record: Value) -> Result<Value, TableError>;
    async fn update(&self, id: &str, record: Value) -> Result<Value, TableError>;
    async fn delete(&self, id: &str) -> Result<(), TableError>;
}

/// Rows plus view state for one management page.
///
/// Rows only ever come from `fetch`. A successful mutation is followed by a
/// full refetch; local rows are never patched in place.
pub struct TableController<S> {
    source: S,
    table: DataTable,
    query: TableQuery,
}

impl<S: TableSource> TableController<S> {
    pub fn new(source: S, table: DataTable) -> Self {
        Self {
            source,
            table,
            query: TableQuery::default(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn query(&self) -> &TableQuery {
        &self.query
    }

    pub fn rows(&self) -> &[Value] {
        self.table.rows()
    }

    pub async fn refresh(&mut self) -> Result<(), TableError> {
        let rows = self.source.fetch().await?;
        tracing::debug!(rows = rows.len(), "table refreshed");
        self.table.set_rows(rows);
        Ok(())
    }

    /// New search term; back to the first page.
    pub fn set_search(&mut self, term: impl Into<String>) {
        self.query.search = term.into();
        self.query.page = 1;
    }

    pub fn toggle_sort(&mut self, column: &str) {
        self.query.sort.toggle(column);
    }

    pub fn set_page(&mut self, page: usize) {
        self.query.page = page;
    }

    pub fn view(&self) -> Page {
        self.table.view(&self.query)
    }

    fn check(&self, record: &Value) -> Result<(), TableError> {
        let errors = self.source.validate(record);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(TableError::Validation(errors))
        }
    }

    pub async fn create(&mut self, record: Value) -> Result<Value, TableError> {
        self.check(&record)?;
        let created = self.source.create(record).await?;
        self.refresh().await?;
        Ok(created)
    }

    pub async fn update(&mut self, id: &str, record: Value) -> Result<Value, TableError> {
        self.check(&record)?;
        let updated = self.source.update(id, record).await?;
        self.refresh().await?;
        Ok(updated)
    }

    pub async fn delete(&mut self, id: &str) -> Result<(), TableError> {
        self.source.delete(id).await?;
        self.refresh().await
    }
}
