//! Schema and row types for dynamic database introspection
//!
//! These types represent catalog information and row snapshots discovered at
//! request time. Nothing here is cached between requests.

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::database::traits::DatabaseError;

/// Number of rows shown per page in the table view
pub const DEFAULT_PAGE_SIZE: u64 = 100;

/// A declared column type split into its base name and optional size/scale
///
/// `DECIMAL(10,2)` becomes `{ base: "DECIMAL", size: 10, scale: 2 }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedType {
    /// Leading word of the declared type, or the raw declaration if it has none
    pub base: String,

    /// First number of the parenthesized list (length or precision)
    pub size: Option<u32>,

    /// Second number of the parenthesized list
    pub scale: Option<u32>,
}

/// Information about a single column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDescriptor {
    /// Column name
    pub name: String,

    /// Type exactly as written in the table definition (may be empty)
    pub declared_type: String,

    /// Parsed form of `declared_type`
    pub normalized_type: NormalizedType,

    /// Whether the column carries a NOT NULL constraint
    pub not_null: bool,

    /// Whether this column is part of the primary key
    pub is_primary_key: bool,

    /// Default value expression (if any)
    pub default_value: Option<String>,
}

impl ColumnDescriptor {
    pub fn nullable(&self) -> bool {
        !self.not_null
    }
}

/// A single cell value, tagged with the storage class it was read as
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Plain (unescaped) text of the value, `None` for NULL
    pub fn to_plain_string(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            CellValue::Boolean(value) => Some(value.to_string()),
            CellValue::Integer(value) => Some(value.to_string()),
            CellValue::Float(value) => Some(value.to_string()),
            CellValue::Text(value) => Some(value.clone()),
            CellValue::Blob(bytes) => Some(hex_encode(bytes)),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Null => serializer.serialize_none(),
            CellValue::Boolean(value) => serializer.serialize_bool(*value),
            CellValue::Integer(value) => serializer.serialize_i64(*value),
            CellValue::Float(value) => serializer.serialize_f64(*value),
            CellValue::Text(value) => serializer.serialize_str(value),
            CellValue::Blob(bytes) => serializer.serialize_str(&hex_encode(bytes)),
        }
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{:02x}", byte)).collect()
}

/// A read-only snapshot of one table row
///
/// Cells keep the column order of the result set. The native row identifier is
/// held apart from the cells so it never collides with a user column.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    row_id: Option<i64>,
    cells: Vec<(String, CellValue)>,
}

impl Row {
    pub fn new(row_id: Option<i64>, cells: Vec<(String, CellValue)>) -> Self {
        Self { row_id, cells }
    }

    /// Native row identifier, if the query selected one
    pub fn row_id(&self) -> Option<i64> {
        self.row_id
    }

    /// Value of the named column, `None` if the row has no such column
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn cells(&self) -> &[(String, CellValue)] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Rows serialize as JSON objects of their cells; the row identifier is not exported
impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (name, value) in &self.cells {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Identifier used to link a row to its detail view
///
/// Prefers the native row identifier, then the value of the primary key column.
/// `None` means the row cannot be addressed and no "view" action should be offered.
pub fn resolve_display_id(row: &Row, primary_key_column: Option<&str>) -> Option<String> {
    if let Some(row_id) = row.row_id() {
        return Some(row_id.to_string());
    }

    primary_key_column
        .and_then(|column| row.get(column))
        .and_then(CellValue::to_plain_string)
}

/// Sort direction for row queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    #[serde(rename = "ASC")]
    Ascending,
    #[serde(rename = "DESC")]
    Descending,
}

impl SortDirection {
    /// SQL keyword for the ORDER BY clause
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_sql())
    }
}

impl FromStr for SortDirection {
    type Err = DatabaseError;

    /// Only the exact keywords `ASC` and `DESC` are accepted
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "ASC" => Ok(SortDirection::Ascending),
            "DESC" => Ok(SortDirection::Descending),
            other => Err(DatabaseError::InvalidInput(format!(
                "sort direction must be ASC or DESC, got '{}'",
                other
            ))),
        }
    }
}

/// Parameters for fetching one page of rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number, never below 1
    pub page: u64,

    /// Maximum number of rows to return
    pub page_size: u64,

    /// Column name to sort by
    pub sort_column: Option<String>,

    /// Sort direction
    pub sort_direction: Option<SortDirection>,
}

impl PageRequest {
    /// Unsorted request for `page` with the default page size; page 0 is clamped to 1
    pub fn new(page: u64) -> Self {
        Self {
            page: page.max(1),
            page_size: DEFAULT_PAGE_SIZE,
            sort_column: None,
            sort_direction: None,
        }
    }

    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_sort(mut self, column: impl Into<String>, direction: SortDirection) -> Self {
        self.sort_column = Some(column.into());
        self.sort_direction = Some(direction);
        self
    }

    /// Number of rows skipped before this page
    pub fn offset(&self) -> u64 {
        (self.page.max(1) - 1).saturating_mul(self.page_size)
    }

    /// The sort column and direction, only when both are present and the column is non-empty
    pub fn sort(&self) -> Option<(&str, SortDirection)> {
        match (self.sort_column.as_deref(), self.sort_direction) {
            (Some(column), Some(direction)) if !column.is_empty() => Some((column, direction)),
            _ => None,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1)
    }
}

/// Schema panel contents for one table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableStructure {
    /// Name of the table
    pub name: String,

    /// First primary key column (if any)
    pub primary_key: Option<String>,

    /// Columns in declaration order
    pub columns: Vec<ColumnDescriptor>,
}

/// Response from listing tables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TablesResponse {
    /// Table names in catalog order
    pub tables: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row(row_id: Option<i64>, id: CellValue) -> Row {
        Row::new(
            row_id,
            vec![
                ("id".to_string(), id),
                ("name".to_string(), CellValue::Text("Test User".to_string())),
            ],
        )
    }

    #[test]
    fn test_page_request_offset() {
        assert_eq!(PageRequest::new(1).offset(), 0);
        assert_eq!(PageRequest::new(2).offset(), 100);
        assert_eq!(PageRequest::new(3).with_page_size(25).offset(), 50);
    }

    #[test]
    fn test_page_request_clamps_page() {
        let request = PageRequest::new(0);
        assert_eq!(request.page, 1);
        assert_eq!(request.offset(), 0);
    }

    #[test]
    fn test_sort_requires_both_fields() {
        assert!(PageRequest::new(1).sort().is_none());

        let mut request = PageRequest::new(1);
        request.sort_column = Some("name".to_string());
        assert!(request.sort().is_none());

        let request = PageRequest::new(1).with_sort("", SortDirection::Ascending);
        assert!(request.sort().is_none());

        let request = PageRequest::new(1).with_sort("name", SortDirection::Descending);
        assert_eq!(request.sort(), Some(("name", SortDirection::Descending)));
    }

    #[test]
    fn test_sort_direction_parsing() {
        assert_eq!("ASC".parse::<SortDirection>().unwrap(), SortDirection::Ascending);
        assert_eq!("DESC".parse::<SortDirection>().unwrap(), SortDirection::Descending);

        for invalid in ["asc", "", "DESC; DROP TABLE users", "ASCENDING"] {
            let error = invalid.parse::<SortDirection>().unwrap_err();
            assert!(matches!(error, DatabaseError::InvalidInput(_)), "{invalid}");
        }
    }

    #[test]
    fn test_resolve_display_id_prefers_row_id() {
        let row = sample_row(Some(7), CellValue::Integer(42));
        assert_eq!(resolve_display_id(&row, Some("id")), Some("7".to_string()));
    }

    #[test]
    fn test_resolve_display_id_falls_back_to_primary_key() {
        let row = sample_row(None, CellValue::Integer(42));
        assert_eq!(resolve_display_id(&row, Some("id")), Some("42".to_string()));

        let row = sample_row(None, CellValue::Text("abc".to_string()));
        assert_eq!(resolve_display_id(&row, Some("id")), Some("abc".to_string()));
    }

    #[test]
    fn test_resolve_display_id_none_when_both_absent() {
        let row = sample_row(None, CellValue::Null);
        assert_eq!(resolve_display_id(&row, Some("id")), None);
        assert_eq!(resolve_display_id(&row, None), None);
        assert_eq!(resolve_display_id(&row, Some("missing")), None);
    }

    #[test]
    fn test_row_serializes_in_column_order() {
        let row = Row::new(
            Some(1),
            vec![
                ("zeta".to_string(), CellValue::Integer(1)),
                ("alpha".to_string(), CellValue::Null),
                ("flag".to_string(), CellValue::Boolean(true)),
                ("data".to_string(), CellValue::Blob(vec![0xde, 0xad])),
            ],
        );
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(
            json,
            r#"{"zeta":1,"alpha":null,"flag":true,"data":"dead"}"#
        );
    }

    #[test]
    fn test_column_descriptor_serialization() {
        let column = ColumnDescriptor {
            name: "price".to_string(),
            declared_type: "DECIMAL(10,2)".to_string(),
            normalized_type: NormalizedType {
                base: "DECIMAL".to_string(),
                size: Some(10),
                scale: Some(2),
            },
            not_null: true,
            is_primary_key: false,
            default_value: Some("0".to_string()),
        };
        let value = serde_json::to_value(&column).unwrap();
        assert_eq!(value["declaredType"], "DECIMAL(10,2)");
        assert_eq!(value["normalizedType"]["size"], 10);
        assert_eq!(value["notNull"], true);
        assert!(!column.nullable());
    }
}
