//! Database provider trait
//!
//! This trait defines the read-only interface the viewer needs from a database.

use crate::schema::{ColumnDescriptor, PageRequest, Row};
use async_trait::async_trait;
use thiserror::Error;

/// Database provider trait for schema discovery and data access
///
/// Every method that takes a table name checks it against [`list_tables`]
/// before the name reaches a query string.
///
/// [`list_tables`]: DatabaseProvider::list_tables
#[async_trait]
pub trait DatabaseProvider: Send + Sync + 'static {
    /// List all table names in catalog order
    async fn list_tables(&self) -> Result<Vec<String>, DatabaseError>;

    /// Column names of `table` in declaration order
    async fn list_columns(&self, table: &str) -> Result<Vec<String>, DatabaseError>;

    /// Full column metadata of `table` in declaration order
    async fn describe_columns(&self, table: &str) -> Result<Vec<ColumnDescriptor>, DatabaseError>;

    /// First column flagged as primary key, if any
    ///
    /// Composite keys only report their first column.
    async fn primary_key_column(&self, table: &str) -> Result<Option<String>, DatabaseError>;

    /// Fetch one page of rows, optionally sorted
    ///
    /// # Arguments
    ///
    /// * `table` - Name of the table
    /// * `request` - Page number, page size and sort parameters
    ///
    /// # Returns
    ///
    /// At most `request.page_size` rows; fewer once the table is exhausted
    async fn fetch_page(&self, table: &str, request: &PageRequest) -> Result<Vec<Row>, DatabaseError>;

    /// Fetch every row of `table`, unsorted and unbounded
    async fn fetch_all(&self, table: &str) -> Result<Vec<Row>, DatabaseError>;

    /// Fetch the row whose native identifier is `id`
    ///
    /// Returns `Ok(None)` when no row matches.
    async fn fetch_by_row_id(&self, table: &str, id: i64) -> Result<Option<Row>, DatabaseError>;
}

/// Broad category of a [`DatabaseError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The engine rejected or could not run a query
    DataAccess,
    /// A well-formed lookup matched nothing
    NotFound,
    /// A request parameter failed validation before any query was built
    InvalidInput,
}

/// Database error type
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Generic database error
    #[error("Database error: {0}")]
    Query(String),

    /// The database file is locked by another connection; the request may be retried
    #[error("Database is busy: {0}")]
    Busy(String),

    /// Table not found
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// Invalid column name
    #[error("Invalid column: {0}")]
    InvalidColumn(String),

    /// Rejected request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl DatabaseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DatabaseError::Query(_) | DatabaseError::Busy(_) => ErrorKind::DataAccess,
            DatabaseError::TableNotFound(_) => ErrorKind::NotFound,
            DatabaseError::InvalidColumn(_) | DatabaseError::InvalidInput(_) => {
                ErrorKind::InvalidInput
            }
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, DatabaseError::Busy(_))
    }
}

/// SQLITE_BUSY and SQLITE_LOCKED primary result codes
const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

impl From<sqlx::Error> for DatabaseError {
    fn from(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::Database(database_error) => {
                let primary_code = database_error
                    .code()
                    .and_then(|code| code.parse::<i32>().ok())
                    .map(|code| code & 0xff);
                match primary_code {
                    Some(SQLITE_BUSY) | Some(SQLITE_LOCKED) => DatabaseError::Busy(error.to_string()),
                    _ => DatabaseError::Query(error.to_string()),
                }
            }
            sqlx::Error::PoolTimedOut => DatabaseError::Busy(error.to_string()),
            _ => DatabaseError::Query(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(DatabaseError::Query("x".into()).kind(), ErrorKind::DataAccess);
        assert_eq!(DatabaseError::Busy("x".into()).kind(), ErrorKind::DataAccess);
        assert_eq!(DatabaseError::TableNotFound("x".into()).kind(), ErrorKind::NotFound);
        assert_eq!(DatabaseError::InvalidColumn("x".into()).kind(), ErrorKind::InvalidInput);
        assert_eq!(DatabaseError::InvalidInput("x".into()).kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_only_busy_is_retryable() {
        assert!(DatabaseError::Busy("locked".into()).is_retryable());
        assert!(!DatabaseError::Query("syntax".into()).is_retryable());
    }

    #[test]
    fn test_pool_timeout_maps_to_busy() {
        let error = DatabaseError::from(sqlx::Error::PoolTimedOut);
        assert!(error.is_retryable());
    }

    #[test]
    fn test_row_not_found_maps_to_query() {
        let error = DatabaseError::from(sqlx::Error::RowNotFound);
        assert!(matches!(error, DatabaseError::Query(_)));
    }
}
