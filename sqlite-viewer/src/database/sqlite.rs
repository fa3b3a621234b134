//! SQLite database provider implementation

use crate::database::traits::{DatabaseError, DatabaseProvider};
use crate::schema::{CellValue, ColumnDescriptor, NormalizedType, PageRequest, Row, SortDirection};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteColumn, SqliteRow};
use sqlx::{Column, Row as _, SqlitePool, TypeInfo, ValueRef};
use tracing::debug;

/// Result column alias for the native row identifier
///
/// Selecting plain `rowid` is reported under the name of an INTEGER PRIMARY KEY
/// column when the table has one, so the identifier is always aliased.
const ROWID_ALIAS: &str = "__viewer_rowid";

/// Names SQLite accepts for the native row identifier, in order of preference
const ROWID_NAMES: [&str; 3] = ["rowid", "_rowid_", "oid"];

/// A table found in the catalog, with its columns and row identifier
struct CatalogEntry {
    name: String,
    columns: Vec<ColumnDescriptor>,
    /// Unshadowed name of the native row identifier; `None` for WITHOUT ROWID
    /// tables and for tables declaring columns under all three names
    rowid: Option<&'static str>,
}

/// SQLite database provider
pub struct SqliteProvider {
    pool: SqlitePool,
}

impl SqliteProvider {
    /// Create a new SQLite provider
    ///
    /// # Arguments
    ///
    /// * `pool` - SQLite connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Quote an identifier (table or column name) for interpolation into SQL
    ///
    /// SQLite uses double quotes for identifiers. This function escapes any
    /// double quotes in the identifier by doubling them. Callers only pass
    /// names that were found in the catalog.
    fn quote_identifier(identifier: &str) -> String {
        format!("\"{}\"", identifier.replace('"', "\"\""))
    }

    /// Build an ORDER BY clause from a validated sort column
    ///
    /// Tables with a row identifier get it as a tiebreaker so consecutive pages
    /// never overlap on duplicate sort keys.
    fn build_order_clause(sort: Option<(&str, SortDirection)>, rowid: Option<&str>) -> String {
        match sort {
            Some((column, direction)) => {
                let tiebreaker = rowid.map(|name| format!(", {}", name)).unwrap_or_default();
                format!(
                    " ORDER BY {} {}{}",
                    Self::quote_identifier(column),
                    direction.as_sql(),
                    tiebreaker
                )
            }
            None => String::new(),
        }
    }

    fn projection(entry: &CatalogEntry) -> String {
        match entry.rowid {
            Some(rowid) => format!("*, {} AS {}", rowid, Self::quote_identifier(ROWID_ALIAS)),
            None => "*".to_string(),
        }
    }

    /// Table names in catalog order
    async fn catalog(&self) -> Result<Vec<String>, DatabaseError> {
        let names = sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table'")
            .fetch_all(&self.pool)
            .await?;
        Ok(names)
    }

    /// Look `table` up in the catalog; the only path by which a table name reaches SQL
    async fn resolve_table(&self, table: &str) -> Result<CatalogEntry, DatabaseError> {
        let name = self
            .catalog()
            .await?
            .into_iter()
            .find(|name| name == table)
            .ok_or_else(|| DatabaseError::TableNotFound(table.to_string()))?;

        let without_rowid: Option<i64> =
            sqlx::query_scalar("SELECT wr FROM pragma_table_list WHERE schema = 'main' AND name = ?")
                .bind(&name)
                .fetch_optional(&self.pool)
                .await?;
        let columns = self.table_info(&name).await?;

        let rowid = if without_rowid.unwrap_or(0) != 0 {
            None
        } else {
            unshadowed_rowid(&columns)
        };

        Ok(CatalogEntry { name, columns, rowid })
    }

    /// Run `PRAGMA table_info` for a table already found in the catalog
    async fn table_info(&self, table: &str) -> Result<Vec<ColumnDescriptor>, DatabaseError> {
        let query = format!("PRAGMA table_info({})", Self::quote_identifier(table));
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;

        let mut columns = Vec::with_capacity(rows.len());
        for row in rows {
            // PRAGMA table_info returns: cid, name, type, notnull, dflt_value, pk
            let name: String = row.try_get("name")?;
            let declared_type: String = row.try_get("type")?;
            let not_null: i64 = row.try_get("notnull")?;
            let default_value: Option<String> = row.try_get("dflt_value")?;
            let primary_key: i64 = row.try_get("pk")?;

            columns.push(ColumnDescriptor {
                name,
                normalized_type: normalize_type(&declared_type),
                declared_type,
                not_null: not_null != 0,
                is_primary_key: primary_key > 0,
                default_value,
            });
        }

        Ok(columns)
    }

    /// Convert a SQLite row into a [`Row`], pulling out the aliased row identifier
    fn decode_row(row: &SqliteRow) -> Result<Row, DatabaseError> {
        let mut row_id = None;
        let mut cells = Vec::with_capacity(row.columns().len());

        for column in row.columns() {
            if column.name() == ROWID_ALIAS {
                row_id = row.try_get::<Option<i64>, _>(column.ordinal())?;
                continue;
            }
            cells.push((column.name().to_string(), Self::decode_cell(row, column)?));
        }

        Ok(Row::new(row_id, cells))
    }

    /// Decode one cell by its runtime storage class
    ///
    /// SQLite stores booleans as integers, so an INTEGER in a column declared
    /// BOOLEAN or BOOL becomes [`CellValue::Boolean`].
    fn decode_cell(row: &SqliteRow, column: &SqliteColumn) -> Result<CellValue, DatabaseError> {
        let index = column.ordinal();
        let raw = row.try_get_raw(index)?;
        if raw.is_null() {
            return Ok(CellValue::Null);
        }

        let storage_class = raw.type_info().name().to_string();
        match storage_class.as_str() {
            "INTEGER" => {
                let value: i64 = row.try_get(index)?;
                if is_boolean_declaration(column.type_info().name()) {
                    Ok(CellValue::Boolean(value != 0))
                } else {
                    Ok(CellValue::Integer(value))
                }
            }
            "REAL" => Ok(CellValue::Float(row.try_get(index)?)),
            "BLOB" => Ok(CellValue::Blob(row.try_get(index)?)),
            _ => match row.try_get::<String, _>(index) {
                Ok(text) => Ok(CellValue::Text(text)),
                // Text that is not valid UTF-8
                Err(_) => {
                    let bytes: Vec<u8> = row.try_get_unchecked(index)?;
                    Ok(CellValue::Text(String::from_utf8_lossy(&bytes).into_owned()))
                }
            },
        }
    }
}

#[async_trait]
impl DatabaseProvider for SqliteProvider {
    async fn list_tables(&self) -> Result<Vec<String>, DatabaseError> {
        let tables: Vec<String> = self.catalog().await?;
        debug!(count = tables.len(), "listed tables");
        Ok(tables)
    }

    async fn list_columns(&self, table: &str) -> Result<Vec<String>, DatabaseError> {
        Ok(self
            .describe_columns(table)
            .await?
            .into_iter()
            .map(|column| column.name)
            .collect())
    }

    async fn describe_columns(&self, table: &str) -> Result<Vec<ColumnDescriptor>, DatabaseError> {
        Ok(self.resolve_table(table).await?.columns)
    }

    async fn primary_key_column(&self, table: &str) -> Result<Option<String>, DatabaseError> {
        Ok(self
            .describe_columns(table)
            .await?
            .into_iter()
            .find(|column| column.is_primary_key)
            .map(|column| column.name))
    }

    async fn fetch_page(&self, table: &str, request: &PageRequest) -> Result<Vec<Row>, DatabaseError> {
        let entry = self.resolve_table(table).await?;

        let sort = request.sort();
        if let Some((column, _)) = sort {
            if !entry.columns.iter().any(|descriptor| descriptor.name == column) {
                return Err(DatabaseError::InvalidColumn(column.to_string()));
            }
        }

        let select_query = format!(
            "SELECT {} FROM {}{} LIMIT ? OFFSET ?",
            Self::projection(&entry),
            Self::quote_identifier(&entry.name),
            Self::build_order_clause(sort, entry.rowid)
        );

        debug!(
            table = %entry.name,
            page = request.page,
            page_size = request.page_size,
            sort = ?sort,
            "fetching page"
        );

        let limit = i64::try_from(request.page_size).unwrap_or(i64::MAX);
        let offset = i64::try_from(request.offset()).unwrap_or(i64::MAX);
        let rows = sqlx::query(&select_query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::decode_row).collect()
    }

    async fn fetch_all(&self, table: &str) -> Result<Vec<Row>, DatabaseError> {
        let entry = self.resolve_table(table).await?;
        let select_query = format!("SELECT * FROM {}", Self::quote_identifier(&entry.name));

        let rows = sqlx::query(&select_query).fetch_all(&self.pool).await?;
        debug!(table = %entry.name, rows = rows.len(), "fetched entire table");

        rows.iter().map(Self::decode_row).collect()
    }

    async fn fetch_by_row_id(&self, table: &str, id: i64) -> Result<Option<Row>, DatabaseError> {
        let entry = self.resolve_table(table).await?;

        let key_column = match entry.rowid {
            Some(rowid) => rowid.to_string(),
            // Tables without a usable row identifier are addressed through their primary key
            None => match entry.columns.iter().find(|column| column.is_primary_key) {
                Some(column) => Self::quote_identifier(&column.name),
                None => return Ok(None),
            },
        };

        let select_query = format!(
            "SELECT {} FROM {} WHERE {} = ?",
            Self::projection(&entry),
            Self::quote_identifier(&entry.name),
            key_column
        );

        let row = sqlx::query(&select_query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::decode_row).transpose()
    }
}

/// Split a declared column type into base name, size and scale
///
/// The base is the leading word of the declaration, upper-cased. A parenthesized
/// list of up to two numbers supplies size and scale. A declaration without a
/// leading word keeps its raw text as the base.
pub fn normalize_type(declared_type: &str) -> NormalizedType {
    let trimmed = declared_type.trim();
    let word_end = trimmed
        .find(|character: char| !(character.is_ascii_alphanumeric() || character == '_'))
        .unwrap_or(trimmed.len());
    let word = &trimmed[..word_end];

    if word.is_empty() {
        return NormalizedType {
            base: declared_type.to_string(),
            size: None,
            scale: None,
        };
    }

    let (size, scale) = parse_type_arguments(&trimmed[word_end..]);
    NormalizedType {
        base: word.to_ascii_uppercase(),
        size,
        scale,
    }
}

/// Parse `(10)` or `(10, 2)` out of the remainder of a type declaration
fn parse_type_arguments(remainder: &str) -> (Option<u32>, Option<u32>) {
    let Some(open) = remainder.find('(') else {
        return (None, None);
    };
    let Some(close) = remainder[open..].find(')') else {
        return (None, None);
    };

    let numbers: Option<Vec<u32>> = remainder[open + 1..open + close]
        .split(',')
        .map(|part| part.trim().parse::<u32>().ok())
        .collect();

    match numbers.as_deref() {
        Some([size]) => (Some(*size), None),
        Some([size, scale]) => (Some(*size), Some(*scale)),
        _ => (None, None),
    }
}

fn is_boolean_declaration(declared_type: &str) -> bool {
    matches!(normalize_type(declared_type).base.as_str(), "BOOLEAN" | "BOOL")
}

/// First row identifier name not taken by a declared column
///
/// Column names match case-insensitively, as SQLite identifiers do.
fn unshadowed_rowid(columns: &[ColumnDescriptor]) -> Option<&'static str> {
    ROWID_NAMES.into_iter().find(|candidate| {
        !columns
            .iter()
            .any(|column| column.name.eq_ignore_ascii_case(candidate))
    })
}
