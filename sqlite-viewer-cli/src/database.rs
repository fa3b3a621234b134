use anyhow::{bail, Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// How long a query waits on a lock held by another process before failing
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

const MAX_CONNECTIONS: u32 = 4;

/// Open `path` read-only and check that it is a SQLite database
///
/// Queries blocked by another process's lock fail after `busy_timeout`.
pub async fn open(path: &Path, busy_timeout: Duration) -> Result<SqlitePool> {
    if !path.exists() {
        bail!("Database file not found: {}", path.display());
    }
    if !path.is_file() {
        bail!("Database path is not a file: {}", path.display());
    }

    let options = SqliteConnectOptions::new()
        .filename(path)
        .read_only(true)
        .create_if_missing(false)
        .busy_timeout(busy_timeout);

    let pool = SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open database {}", path.display()))?;

    // Reading the catalog fails for files that are not SQLite databases
    let tables: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'")
        .fetch_one(&pool)
        .await
        .with_context(|| format!("Not a valid SQLite database: {}", path.display()))?;
    debug!(tables, path = %path.display(), "database opened");

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlite_viewer::{DatabaseError, DatabaseProvider, SqliteProvider};
    use sqlx::sqlite::SqliteJournalMode;
    use sqlx::ConnectOptions;
    use std::io::Write;

    const BUSY_TIMEOUT: Duration = Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS);

    async fn create_database(path: &Path) {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Delete);
        let pool = SqlitePool::connect_with(options).await.unwrap();
        sqlx::query("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO users (name) VALUES ('Test User')")
            .execute(&pool)
            .await
            .unwrap();
        pool.close().await;
    }

    #[tokio::test]
    async fn test_open_existing_database() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("database.sqlite");
        create_database(&path).await;

        let pool = open(&path, BUSY_TIMEOUT).await.unwrap();
        let name: String = sqlx::query_scalar("SELECT name FROM users")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(name, "Test User");
    }

    #[tokio::test]
    async fn test_database_is_read_only() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("database.sqlite");
        create_database(&path).await;

        let pool = open(&path, BUSY_TIMEOUT).await.unwrap();
        let result = sqlx::query("DELETE FROM users").execute(&pool).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_missing_file() {
        let directory = tempfile::tempdir().unwrap();
        let error = open(&directory.path().join("missing.sqlite"), BUSY_TIMEOUT).await.unwrap_err();
        assert!(error.to_string().contains("Database file not found"));
    }

    #[tokio::test]
    async fn test_not_a_database() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"this is plain text, not a database file at all").unwrap();

        let error = open(file.path(), BUSY_TIMEOUT).await.unwrap_err();
        let message = format!("{:#}", error);
        assert!(
            message.contains("Not a valid SQLite database") || message.contains("Failed to open database"),
            "{message}"
        );
    }

    #[tokio::test]
    async fn test_locked_database_is_reported_as_busy() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("database.sqlite");
        create_database(&path).await;

        let pool = open(&path, Duration::from_millis(100)).await.unwrap();
        let provider = SqliteProvider::new(pool);

        let mut writer = SqliteConnectOptions::new()
            .filename(&path)
            .journal_mode(SqliteJournalMode::Delete)
            .connect()
            .await
            .unwrap();
        sqlx::query("BEGIN EXCLUSIVE").execute(&mut writer).await.unwrap();

        let error = provider.list_tables().await.unwrap_err();
        assert!(matches!(error, DatabaseError::Busy(_)), "{error:?}");
        assert!(error.is_retryable());

        sqlx::query("ROLLBACK").execute(&mut writer).await.unwrap();
        assert_eq!(provider.list_tables().await.unwrap(), vec!["users"]);
    }
}
