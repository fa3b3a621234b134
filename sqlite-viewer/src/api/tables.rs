//! Table listing and structure endpoints

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json, Response},
};
use tracing::warn;

use crate::api::{error_status, ViewerState};
use crate::database::traits::DatabaseProvider;
use crate::schema::{TableStructure, TablesResponse};
use crate::Error;

fn json_error(error: Error) -> Response {
    let status = error_status(&error);
    (
        status,
        Json(serde_json::json!({
            "error": error.to_string()
        })),
    )
        .into_response()
}

/// Handler for GET /api/tables
///
/// Returns the table names in catalog order.
pub async fn list_tables_handler<DB: DatabaseProvider>(
    State(state): State<ViewerState<DB>>,
) -> Response {
    match state.database.list_tables().await {
        Ok(tables) => Json(TablesResponse { tables }).into_response(),
        Err(error) => {
            warn!(%error, "failed to list tables");
            json_error(error.into())
        }
    }
}

/// Handler for GET /api/tables/{name}/columns
///
/// Returns the column descriptors and primary key column of a table,
/// the data behind the structure panel.
pub async fn table_columns_handler<DB: DatabaseProvider>(
    State(state): State<ViewerState<DB>>,
    Path(table_name): Path<String>,
) -> Response {
    let structure = async {
        let columns = state.database.describe_columns(&table_name).await?;
        let primary_key = state.database.primary_key_column(&table_name).await?;
        Ok::<_, Error>(TableStructure {
            name: table_name.clone(),
            primary_key,
            columns,
        })
    };

    match structure.await {
        Ok(structure) => Json(structure).into_response(),
        Err(error) => {
            warn!(%error, table = %table_name, "failed to describe table");
            json_error(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::layer::ViewerLayer;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use sqlx::sqlite::SqlitePoolOptions;
    use tower::ServiceExt;

    async fn create_test_router() -> Router {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::query(
            "CREATE TABLE invoices (id INTEGER PRIMARY KEY, total DECIMAL(10,2) NOT NULL, note TEXT DEFAULT 'none')",
        )
        .execute(&pool)
        .await
        .unwrap();
        ViewerLayer::sqlite("/db", pool).into_router()
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_list_tables() {
        let (status, json) = get_json(create_test_router().await, "/db/api/tables").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, serde_json::json!({ "tables": ["invoices"] }));
    }

    #[tokio::test]
    async fn test_table_columns() {
        let (status, json) = get_json(create_test_router().await, "/db/api/tables/invoices/columns").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["name"], "invoices");
        assert_eq!(json["primaryKey"], "id");

        let total = &json["columns"][1];
        assert_eq!(total["name"], "total");
        assert_eq!(
            total["normalizedType"],
            serde_json::json!({ "base": "DECIMAL", "size": 10, "scale": 2 })
        );
        assert_eq!(total["notNull"], true);
        assert_eq!(json["columns"][2]["defaultValue"], "'none'");
    }

    #[tokio::test]
    async fn test_table_columns_unknown_table() {
        let (status, json) = get_json(create_test_router().await, "/db/api/tables/ghost/columns").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "Table not found: ghost");
    }
}
