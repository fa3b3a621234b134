//! Query parameter validation
//!
//! Raw request parameters are checked here before anything reaches the
//! database layer.

use serde::Deserialize;

use crate::database::traits::DatabaseError;
use crate::schema::{PageRequest, SortDirection, DEFAULT_PAGE_SIZE};

/// Raw query string of the viewer page: `?table=&action=&page=&sort=&order=&id=`
///
/// Every field is kept as a string so malformed values reach validation
/// instead of failing extraction.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ViewerParams {
    pub table: Option<String>,
    pub action: Option<String>,
    pub page: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub id: Option<String>,
}

/// What the viewer page should do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    List,
    View,
    DownloadJson,
}

impl Action {
    /// Unknown or missing actions fall back to [`Action::List`]
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("view") => Action::View,
            Some("download_json") => Action::DownloadJson,
            _ => Action::List,
        }
    }
}

impl ViewerParams {
    /// Requested table, if a non-empty one was given
    pub fn table(&self) -> Option<&str> {
        self.table.as_deref().filter(|table| !table.is_empty())
    }

    pub fn action(&self) -> Action {
        Action::parse(self.action.as_deref())
    }

    /// Validated sort column and direction
    pub fn sort(&self) -> Result<Option<(String, SortDirection)>, DatabaseError> {
        parse_sort(self.sort.as_deref(), self.order.as_deref())
    }

    /// Page request built from `page`, `sort` and `order`
    pub fn page_request(&self) -> Result<PageRequest, DatabaseError> {
        let page = parse_page(self.page.as_deref())?;
        let request = PageRequest::new(page).with_page_size(DEFAULT_PAGE_SIZE);
        Ok(match self.sort()? {
            Some((column, direction)) => request.with_sort(column, direction),
            None => request,
        })
    }

    pub fn record_id(&self) -> Result<i64, DatabaseError> {
        parse_record_id(self.id.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Parse a page number; missing means 1 and anything below 1 is clamped to 1
pub fn parse_page(value: Option<&str>) -> Result<u64, DatabaseError> {
    let Some(value) = non_empty(value) else {
        return Ok(1);
    };

    let page: i64 = value
        .parse()
        .map_err(|_| DatabaseError::InvalidInput(format!("page must be a number, got '{}'", value)))?;
    Ok(page.max(1) as u64)
}

/// Parse the sort pair; sorting only applies when both parts are non-empty
///
/// A non-empty direction other than `ASC` or `DESC` is rejected even when no
/// column is given.
pub fn parse_sort(
    column: Option<&str>,
    direction: Option<&str>,
) -> Result<Option<(String, SortDirection)>, DatabaseError> {
    let direction = non_empty(direction)
        .map(str::parse::<SortDirection>)
        .transpose()?;

    // Identifiers are matched exactly, so the column is not trimmed
    Ok(match (column.filter(|column| !column.is_empty()), direction) {
        (Some(column), Some(direction)) => Some((column.to_string(), direction)),
        _ => None,
    })
}

/// Parse a record identifier, which must be an integer
pub fn parse_record_id(value: Option<&str>) -> Result<i64, DatabaseError> {
    let value = non_empty(value)
        .ok_or_else(|| DatabaseError::InvalidInput("a record id is required".to_string()))?;
    value
        .parse()
        .map_err(|_| DatabaseError::InvalidInput(format!("record id must be an integer, got '{}'", value)))
}
