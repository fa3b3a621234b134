//! HTTP handlers
//!
//! The HTML viewer page dispatches on `?action=`; a small JSON API exposes
//! the table list and column metadata.

use axum::http::StatusCode;
use std::sync::Arc;

use crate::database::traits::{DatabaseProvider, ErrorKind};
use crate::Error;

pub mod params;
pub mod tables;
pub mod viewer;

// Re-export handlers for convenience
pub use tables::{list_tables_handler, table_columns_handler};
pub use viewer::viewer_page_handler;

/// Shared state for all handlers
pub struct ViewerState<DB> {
    /// Database provider implementation
    pub database: Arc<DB>,

    /// URL prefix the viewer is mounted under ("" for the root)
    pub base_path: Arc<str>,
}

impl<DB: DatabaseProvider> ViewerState<DB> {
    pub fn new(database: Arc<DB>, base_path: impl Into<Arc<str>>) -> Self {
        Self {
            database,
            base_path: base_path.into(),
        }
    }
}

impl<DB> Clone for ViewerState<DB> {
    fn clone(&self) -> Self {
        Self {
            database: self.database.clone(),
            base_path: self.base_path.clone(),
        }
    }
}

/// HTTP status for an error reaching the request boundary
///
/// Rejected input is a 400, an unknown table a 404, a locked database a 503
/// (the client may retry) and any other database failure a 500.
pub fn error_status(error: &Error) -> StatusCode {
    match error {
        Error::Database(error) if error.is_retryable() => StatusCode::SERVICE_UNAVAILABLE,
        Error::Database(error) => match error.kind() {
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::DataAccess => StatusCode::INTERNAL_SERVER_ERROR,
        },
        Error::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
