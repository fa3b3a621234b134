//! The HTML viewer page
//!
//! `GET /?table=&action=&page=&sort=&order=&id=` renders the table list,
//! a single record, or a JSON download depending on `action`.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::api::params::{Action, ViewerParams};
use crate::api::{error_status, ViewerState};
use crate::database::traits::{DatabaseError, DatabaseProvider};
use crate::frontend::{self, ListView};
use crate::Error;

/// Handler for GET /
///
/// Query parameters:
/// - table: Table to show (default: first table in the catalog)
/// - action: "list" (default), "view" or "download_json"
/// - page: 1-based page number (default: 1, values below 1 are clamped)
/// - sort / order: Column name and "ASC" or "DESC"
/// - id: Row identifier for "view"
pub async fn viewer_page_handler<DB: DatabaseProvider>(
    State(state): State<ViewerState<DB>>,
    Query(params): Query<ViewerParams>,
) -> Response {
    match handle_viewer_request(&state, &params).await {
        Ok(response) => response,
        Err(error) => {
            let status = error_status(&error);
            if status.is_server_error() {
                error!(%error, table = ?params.table(), "viewer request failed");
            } else {
                warn!(%error, table = ?params.table(), "viewer request rejected");
            }

            let tables = state.database.list_tables().await.unwrap_or_default();
            let page = frontend::render_page(
                &state.base_path,
                &tables,
                params.table(),
                &frontend::render_error(&error.to_string()),
            );
            (status, Html(page)).into_response()
        }
    }
}

async fn handle_viewer_request<DB: DatabaseProvider>(
    state: &ViewerState<DB>,
    params: &ViewerParams,
) -> Result<Response, Error> {
    let database = state.database.as_ref();
    let base_path = state.base_path.as_ref();

    // Validate every parameter before the first query runs
    let action = params.action();
    let request = params.page_request()?;
    let record_id = match action {
        Action::View => Some(params.record_id()?),
        Action::List | Action::DownloadJson => None,
    };

    let tables = database.list_tables().await?;
    let table = match params.table().or_else(|| tables.first().map(String::as_str)) {
        Some(table) => table.to_string(),
        None => {
            let page = frontend::render_page(base_path, &tables, None, &frontend::render_empty_state());
            return Ok(Html(page).into_response());
        }
    };
    if !tables.contains(&table) {
        return Err(DatabaseError::TableNotFound(table).into());
    }

    debug!(table = %table, ?action, page = request.page, "handling viewer request");

    match (action, record_id) {
        (Action::DownloadJson, _) => export_table(database, &table).await,
        (Action::View, Some(id)) => {
            let (status, content) = match database.fetch_by_row_id(&table, id).await? {
                Some(record) => (
                    StatusCode::OK,
                    frontend::render_record(base_path, &table, &record, request.sort()),
                ),
                None => (
                    StatusCode::NOT_FOUND,
                    frontend::render_missing_record(base_path, &table, id, request.sort()),
                ),
            };
            let page = frontend::render_page(base_path, &tables, Some(&table), &content);
            Ok((status, Html(page)).into_response())
        }
        _ => {
            let rows = database.fetch_page(&table, &request).await?;
            let columns = database.list_columns(&table).await?;
            let primary_key = database.primary_key_column(&table).await?;
            let structure = database.describe_columns(&table).await?;

            let content = frontend::render_list(
                base_path,
                &ListView {
                    table: &table,
                    columns: &columns,
                    rows: &rows,
                    primary_key: primary_key.as_deref(),
                    structure: &structure,
                    request: &request,
                },
            );
            let page = frontend::render_page(base_path, &tables, Some(&table), &content);
            Ok(Html(page).into_response())
        }
    }
}

/// Serve the whole table as an indented JSON array attachment named `<table>.json`
async fn export_table<DB: DatabaseProvider>(database: &DB, table: &str) -> Result<Response, Error> {
    let rows = database.fetch_all(table).await?;
    let body = to_pretty_json(&rows)?;
    debug!(table = %table, rows = rows.len(), bytes = body.len(), "exporting table");

    let disposition = format!("attachment; filename=\"{}.json\"", attachment_name(table));
    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

/// Serialize with four-space indentation
fn to_pretty_json<T: Serialize>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer)?;
    Ok(buffer)
}

/// Table name made safe for a quoted Content-Disposition filename
fn attachment_name(table: &str) -> String {
    table
        .chars()
        .map(|character| match character {
            '"' | '\\' => '_',
            ' ' => ' ',
            character if character.is_ascii_graphic() => character,
            _ => '_',
        })
        .collect()
}
