//! Server-rendered pages and embedded static assets
//!
//! Pages are plain HTML strings built from the database results. The only
//! client-side interactivity is the `<details>` toggle of the structure panel.

use axum::{
    extract::Path,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use include_dir::{include_dir, Dir};

use crate::format::{encode_query_component, escape_html, format_value, format_value_truncated};
use crate::schema::{resolve_display_id, CellValue, ColumnDescriptor, PageRequest, Row, SortDirection};

// Embed the stylesheet directory at compile time
static ASSETS: Dir = include_dir!("$CARGO_MANIFEST_DIR/assets");

/// Longest cell text shown in the table view before it is cut off
pub const MAX_CELL_CHARACTERS: usize = 255;

/// Create a router serving `GET /assets/*` from the embedded directory
pub fn create_asset_router() -> Router {
    Router::new().route("/assets/{*path}", get(serve_static_asset))
}

/// Serve static assets with proper MIME types
///
/// Caching: max-age=3600 (1 hour); the viewer is usually short-lived.
async fn serve_static_asset(Path(path): Path<String>) -> Response {
    match ASSETS.get_file(&path) {
        Some(file) => {
            let mime_type = mime_guess::from_path(&path)
                .first_or_octet_stream()
                .to_string();
            (
                [
                    (header::CONTENT_TYPE, mime_type),
                    (header::CACHE_CONTROL, "public, max-age=3600".to_string()),
                ],
                file.contents(),
            )
                .into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            format!("Asset not found: {}", path),
        )
            .into_response(),
    }
}

/// Everything the table view renders
pub struct ListView<'a> {
    pub table: &'a str,
    pub columns: &'a [String],
    pub rows: &'a [Row],
    pub primary_key: Option<&'a str>,
    pub structure: &'a [ColumnDescriptor],
    pub request: &'a PageRequest,
}

/// Build a link to the viewer page, escaped for use in an attribute
fn viewer_url(base_path: &str, parameters: &[(&str, &str)]) -> String {
    let page = if base_path.is_empty() { "/" } else { base_path };
    let query = parameters
        .iter()
        .map(|(key, value)| format!("{}={}", key, encode_query_component(value)))
        .collect::<Vec<_>>()
        .join("&");
    escape_html(&format!("{}?{}", page, query))
}

/// `table`, plus `sort`/`order` when the page is sorted
fn table_parameters<'a>(table: &'a str, sort: Option<(&'a str, SortDirection)>) -> Vec<(&'a str, &'a str)> {
    let mut parameters = vec![("table", table)];
    if let Some((column, direction)) = sort {
        parameters.push(("sort", column));
        parameters.push(("order", direction.as_sql()));
    }
    parameters
}

/// Wrap `content` in the document layout with the table sidebar
pub fn render_page(
    base_path: &str,
    tables: &[String],
    current_table: Option<&str>,
    content: &str,
) -> String {
    let title = match current_table {
        Some(table) => format!("{} - SQLite Viewer", escape_html(table)),
        None => "SQLite Viewer".to_string(),
    };

    let sidebar_items: String = tables
        .iter()
        .map(|table| {
            let class = if Some(table.as_str()) == current_table { " class=\"current\"" } else { "" };
            format!(
                "<li><a href=\"{}\"{}>{}</a></li>",
                viewer_url(base_path, &[("table", table)]),
                class,
                escape_html(table)
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <link rel="stylesheet" href="{base_path}/assets/viewer.css">
</head>
<body>
<div class="layout">
    <nav class="sidebar">
        <h1>SQLite Viewer</h1>
        <ul>{sidebar_items}</ul>
    </nav>
    <main class="content">
{content}
    </main>
</div>
</body>
</html>
"#,
        title = title,
        base_path = escape_html(base_path),
        sidebar_items = sidebar_items,
        content = content,
    )
}

/// Placeholder shown when no table is selected
pub fn render_empty_state() -> String {
    "<p>Select a table from the sidebar to view its contents.</p>".to_string()
}

/// Error message box
pub fn render_error(message: &str) -> String {
    format!("<div class=\"error\">{}</div>", escape_html(message))
}

fn render_table_header(base_path: &str, table: &str) -> String {
    format!(
        r#"<div class="header">
    <h2>{}</h2>
    <a href="{}" class="button download">Download JSON</a>
</div>"#,
        escape_html(table),
        viewer_url(base_path, &[("table", table), ("action", "download_json")])
    )
}

/// Schema panel listing every column descriptor
fn render_structure(columns: &[ColumnDescriptor]) -> String {
    let body: String = columns
        .iter()
        .map(|column| {
            let optional = |value: Option<u32>| value.map(|value| value.to_string()).unwrap_or_default();
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape_html(&column.name),
                escape_html(&column.normalized_type.base),
                optional(column.normalized_type.size),
                optional(column.normalized_type.scale),
                if column.nullable() { "YES" } else { "NO" },
                if column.is_primary_key { "YES" } else { "" },
                column
                    .default_value
                    .as_deref()
                    .map(escape_html)
                    .unwrap_or_else(|| crate::format::NULL_MARKER.to_string()),
            )
        })
        .collect();

    format!(
        r#"<details class="structure">
    <summary>Structure</summary>
    <table class="rows">
        <thead><tr><th>Column</th><th>Type</th><th>Size</th><th>Scale</th><th>Nullable</th><th>Primary key</th><th>Default</th></tr></thead>
        <tbody>{}</tbody>
    </table>
</details>"#,
        body
    )
}

/// Next state of the header sort cycle: unsorted, ASC, DESC, unsorted
fn next_sort(current: Option<(&str, SortDirection)>, column: &str) -> (Option<SortDirection>, &'static str) {
    match current {
        Some((sorted, SortDirection::Ascending)) if sorted == column => (Some(SortDirection::Descending), "▲"),
        Some((sorted, SortDirection::Descending)) if sorted == column => (None, "▼"),
        _ => (Some(SortDirection::Ascending), ""),
    }
}

/// Table view: structure panel, sortable headers, rows and pagination
pub fn render_list(base_path: &str, view: &ListView<'_>) -> String {
    let sort = view.request.sort();
    let page = view.request.page.to_string();

    let headers: String = view
        .columns
        .iter()
        .map(|column| {
            let (next_direction, indicator) = next_sort(sort, column);
            let mut parameters = vec![("table", view.table)];
            if let Some(direction) = next_direction {
                parameters.push(("sort", column.as_str()));
                parameters.push(("order", direction.as_sql()));
            }
            parameters.push(("page", page.as_str()));
            format!(
                "<th><a href=\"{}\">{} {}</a></th>",
                viewer_url(base_path, &parameters),
                escape_html(column),
                indicator
            )
        })
        .collect();

    let body: String = view
        .rows
        .iter()
        .map(|row| {
            let cells: String = view
                .columns
                .iter()
                .map(|column| {
                    let value = row.get(column).unwrap_or(&CellValue::Null);
                    format!(
                        "<td><div class=\"cell\">{}</div></td>",
                        format_value_truncated(value, MAX_CELL_CHARACTERS)
                    )
                })
                .collect();

            let action = match resolve_display_id(row, view.primary_key) {
                Some(id) => {
                    let mut parameters = table_parameters(view.table, sort);
                    parameters.insert(1, ("action", "view"));
                    parameters.insert(2, ("id", id.as_str()));
                    format!(
                        "<a href=\"{}\" class=\"view-link\">View</a>",
                        viewer_url(base_path, &parameters)
                    )
                }
                None => "<span class=\"muted\">No ID</span>".to_string(),
            };

            format!("<tr>{}<td>{}</td></tr>", cells, action)
        })
        .collect();

    let mut pagination = String::new();
    if view.request.page > 1 {
        let previous = (view.request.page - 1).to_string();
        let mut parameters = table_parameters(view.table, sort);
        parameters.push(("page", previous.as_str()));
        pagination.push_str(&format!(
            "<a href=\"{}\" class=\"button\">Previous</a>",
            viewer_url(base_path, &parameters)
        ));
    }
    // A full page is the only hint that another one may follow
    if view.rows.len() as u64 == view.request.page_size {
        let next = (view.request.page + 1).to_string();
        let mut parameters = table_parameters(view.table, sort);
        parameters.push(("page", next.as_str()));
        pagination.push_str(&format!(
            "<a href=\"{}\" class=\"button\">Next</a>",
            viewer_url(base_path, &parameters)
        ));
    }

    format!(
        r#"{header}
{structure}
<div class="table-wrapper">
    <table class="rows">
        <thead><tr>{headers}<th>Actions</th></tr></thead>
        <tbody>{body}</tbody>
    </table>
</div>
<div class="pagination">{pagination}</div>"#,
        header = render_table_header(base_path, view.table),
        structure = render_structure(view.structure),
        headers = headers,
        body = body,
        pagination = pagination,
    )
}

fn render_back_link(base_path: &str, table: &str, sort: Option<(&str, SortDirection)>) -> String {
    format!(
        "<a href=\"{}\" class=\"button back\">Back to Table</a>",
        viewer_url(base_path, &table_parameters(table, sort))
    )
}

/// Record detail view listing every column with its formatted value
pub fn render_record(
    base_path: &str,
    table: &str,
    record: &Row,
    sort: Option<(&str, SortDirection)>,
) -> String {
    let fields: String = record
        .cells()
        .iter()
        .map(|(column, value)| {
            format!(
                "<div class=\"field\"><strong>{}:</strong> {}</div>",
                escape_html(column),
                format_value(value)
            )
        })
        .collect();

    format!(
        r#"{header}
<h3>Record Details</h3>
<div class="record">{fields}</div>
{back}"#,
        header = render_table_header(base_path, table),
        fields = fields,
        back = render_back_link(base_path, table, sort),
    )
}

/// Record view for an identifier that matched no row
pub fn render_missing_record(
    base_path: &str,
    table: &str,
    id: i64,
    sort: Option<(&str, SortDirection)>,
) -> String {
    format!(
        r#"{header}
<h3>Record Details</h3>
<p class="muted">No such record: {id}</p>
{back}"#,
        header = render_table_header(base_path, table),
        id = id,
        back = render_back_link(base_path, table, sort),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn users_row(row_id: Option<i64>) -> Row {
        Row::new(
            row_id,
            vec![
                ("id".to_string(), CellValue::Integer(1)),
                ("name".to_string(), CellValue::Text("<b>Test User</b>".to_string())),
            ],
        )
    }

    #[test]
    fn test_viewer_url_encodes_and_escapes() {
        assert_eq!(
            viewer_url("", &[("table", "my table"), ("page", "2")]),
            "/?table=my%20table&amp;page=2"
        );
        assert_eq!(viewer_url("/db", &[("table", "a&b")]), "/db?table=a%26b");
    }

    #[test]
    fn test_next_sort_cycle() {
        assert_eq!(next_sort(None, "name"), (Some(SortDirection::Ascending), ""));
        assert_eq!(
            next_sort(Some(("name", SortDirection::Ascending)), "name"),
            (Some(SortDirection::Descending), "▲")
        );
        assert_eq!(next_sort(Some(("name", SortDirection::Descending)), "name"), (None, "▼"));
        assert_eq!(
            next_sort(Some(("id", SortDirection::Descending)), "name"),
            (Some(SortDirection::Ascending), "")
        );
    }

    #[test]
    fn test_render_page_escapes_table_names() {
        let tables = vec!["<evil>".to_string(), "users".to_string()];
        let html = render_page("", &tables, Some("users"), "content");
        assert!(html.contains("&lt;evil&gt;"));
        assert!(!html.contains("<evil>"));
        assert!(html.contains("SQLite Viewer"));
        assert!(html.contains("/assets/viewer.css"));
    }

    #[test]
    fn test_render_list() {
        let rows = vec![users_row(Some(1)), users_row(None)];
        let columns = vec!["id".to_string(), "name".to_string()];
        let request = PageRequest::new(2).with_sort("name", SortDirection::Ascending);
        let view = ListView {
            table: "users",
            columns: &columns,
            rows: &rows,
            primary_key: None,
            structure: &[],
            request: &request,
        };

        let html = render_list("", &view);
        assert!(html.contains("&lt;b&gt;Test User&lt;/b&gt;"));
        assert!(html.contains("action=view&amp;id=1&amp;sort=name&amp;order=ASC"));
        assert!(html.contains("No ID"));
        assert!(html.contains("Previous"));
        assert!(!html.contains("Next"));
        assert!(html.contains("name ▲"));
    }

    #[test]
    fn test_render_list_offers_next_on_full_page() {
        let rows = vec![users_row(Some(1))];
        let columns = vec!["id".to_string()];
        let request = PageRequest::new(1).with_page_size(1);
        let view = ListView {
            table: "users",
            columns: &columns,
            rows: &rows,
            primary_key: Some("id"),
            structure: &[],
            request: &request,
        };

        let html = render_list("", &view);
        assert!(html.contains("page=2"));
        assert!(!html.contains("Previous"));
    }

    #[test]
    fn test_render_record() {
        let html = render_record("", "users", &users_row(Some(1)), None);
        assert!(html.contains("Record Details"));
        assert!(html.contains("<strong>name:</strong> &lt;b&gt;Test User&lt;/b&gt;"));
        assert!(html.contains("Back to Table"));
    }

    #[tokio::test]
    async fn test_serve_stylesheet() {
        let response = create_asset_router()
            .oneshot(
                Request::builder()
                    .uri("/assets/viewer.css")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(header::CONTENT_TYPE).unwrap(), "text/css");
    }

    #[tokio::test]
    async fn test_missing_asset() {
        let response = create_asset_router()
            .oneshot(
                Request::builder()
                    .uri("/assets/missing.js")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
