//! # sqlite-viewer
//!
//! A zero-install viewer for SQLite database files, served as a small web page.
//!
//! ## Features
//!
//! - Table listing straight from the database catalog
//! - Paginated table view (100 rows per page) with column sorting
//! - Single record view
//! - Column structure panel with parsed type, size and scale
//! - Whole-table JSON download
//!
//! ## Security Warning
//!
//! **This is a local development tool!**
//!
//! - No authentication/authorization built-in
//! - Exposes the full database schema and data
//! - Should never be exposed on public networks
//!
//! The viewer never writes. Table names, sort columns, sort directions, page
//! numbers and record ids are validated before any query is built.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use sqlite_viewer::ViewerLayer;
//! use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
//!
//! #[tokio::main]
//! async fn main() {
//!     let options = SqliteConnectOptions::new()
//!         .filename("./database.sqlite")
//!         .read_only(true);
//!     let pool = SqlitePool::connect_with(options).await.unwrap();
//!
//!     let app = ViewerLayer::sqlite("/", pool).into_router();
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8000").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```

// Public modules
pub mod api;
pub mod database;
pub mod format;
pub mod frontend;
pub mod layer;
pub mod schema;

// Public exports
pub use layer::ViewerLayer;
pub use schema::{
    resolve_display_id, CellValue, ColumnDescriptor, NormalizedType, PageRequest, Row,
    SortDirection, TableStructure,
};

// Re-export database providers
pub use database::sqlite::{normalize_type, SqliteProvider};
pub use database::traits::{DatabaseError, DatabaseProvider, ErrorKind};

// Error type
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
