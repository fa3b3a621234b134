//! ViewerLayer - Main Axum integration layer
//!
//! This module builds the viewer's router from a database provider. The
//! command-line launcher serves it at the root; other Axum applications can
//! merge it under a prefix.

use crate::database::sqlite::SqliteProvider;
use crate::database::traits::DatabaseProvider;
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::api::{list_tables_handler, table_columns_handler, viewer_page_handler, ViewerState};
use crate::frontend::create_asset_router;

/// Main layer for serving the viewer from an Axum application
///
/// # Example
///
/// ```rust,no_run
/// use sqlite_viewer::ViewerLayer;
/// use sqlx::SqlitePool;
///
/// # async fn example() {
/// let pool = SqlitePool::connect("sqlite:./data.db?mode=ro").await.unwrap();
/// let app = ViewerLayer::sqlite("/", pool).into_router();
/// # }
/// ```
pub struct ViewerLayer<DB: DatabaseProvider> {
    base_path: String,
    database: Arc<DB>,
}

impl<DB: DatabaseProvider> ViewerLayer<DB> {
    /// Create a new viewer at the given base path
    ///
    /// # Arguments
    ///
    /// * `base_path` - The URL path where the viewer will be mounted ("/" or "" for the root)
    /// * `database` - The database provider implementation
    pub fn new(base_path: impl Into<String>, database: DB) -> Self {
        Self {
            base_path: normalize_base_path(&base_path.into()),
            database: Arc::new(database),
        }
    }

    /// Convert into an Axum Router that can be served or merged
    ///
    /// The returned router includes:
    /// - The viewer page at `{base_path}`
    /// - JSON endpoints at `{base_path}/api/*`
    /// - The embedded stylesheet at `{base_path}/assets/*`
    /// - A request tracing layer
    pub fn into_router(self) -> Router {
        let state = ViewerState::new(self.database, self.base_path.as_str());

        // Note: Axum 0.8 uses {param} syntax instead of :param
        let viewer_router = Router::new()
            .route("/", get(viewer_page_handler::<DB>))
            .route("/api/tables", get(list_tables_handler::<DB>))
            .route("/api/tables/{name}/columns", get(table_columns_handler::<DB>))
            .with_state(state)
            .merge(create_asset_router());

        // Axum does not allow nesting at the root
        let router = if self.base_path.is_empty() {
            viewer_router
        } else {
            Router::new().nest(&self.base_path, viewer_router)
        };

        router.layer(TraceLayer::new_for_http())
    }
}

impl ViewerLayer<SqliteProvider> {
    /// Create a new viewer for SQLite
    ///
    /// # Arguments
    ///
    /// * `base_path` - The URL path where the viewer will be mounted
    /// * `pool` - The SQLite connection pool
    pub fn sqlite(base_path: impl Into<String>, pool: sqlx::SqlitePool) -> Self {
        Self::new(base_path, SqliteProvider::new(pool))
    }
}

/// "/" and "" mean the root; otherwise a leading slash and no trailing slash
fn normalize_base_path(base_path: &str) -> String {
    let trimmed = base_path.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_path() {
        assert_eq!(normalize_base_path("/"), "");
        assert_eq!(normalize_base_path(""), "");
        assert_eq!(normalize_base_path("/viewer/"), "/viewer");
        assert_eq!(normalize_base_path("viewer"), "/viewer");
    }
}
