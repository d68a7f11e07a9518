//! `SQLite` backing for reading progress: one `reading_progress` row per
//! document key, schema tracked in `schema_migrations`.

use std::sync::Arc;
use std::time::Duration;

use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use thiserror::Error;

use crate::repository::{ProgressRepository, Storage};

mod migrate;
mod progress_repo;

/// Progress repository over a shared `SQLite` pool.
#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SqliteInitError {
    #[error("could not open progress database: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("could not prepare progress tables: {0}")]
    Migrate(#[source] sqlx::Error),
}

impl SqliteRepository {
    /// Open the progress database at `database_url` (WAL, 5 s busy timeout).
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError::Connect` if the database cannot be opened.
    pub async fn connect(database_url: &str) -> Result<Self, SqliteInitError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    sqlx::query("PRAGMA journal_mode = WAL;")
                        .execute(&mut *conn)
                        .await?;
                    sqlx::query("PRAGMA busy_timeout = 5000;")
                        .execute(&mut *conn)
                        .await?;
                    Ok(())
                })
            })
            .connect(database_url)
            .await
            .map_err(SqliteInitError::Connect)?;
        Ok(Self { pool })
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Bring the progress schema up to date.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError::Migrate` if a migration query fails.
    pub async fn migrate(&self) -> Result<(), SqliteInitError> {
        migrate::run_migrations(&self.pool)
            .await
            .map_err(SqliteInitError::Migrate)
    }
}

impl Storage {
    /// Progress storage in the `SQLite` database at `database_url`.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the database cannot be opened or migrated.
    pub async fn sqlite(database_url: &str) -> Result<Self, SqliteInitError> {
        let repo = SqliteRepository::connect(database_url).await?;
        repo.migrate().await?;
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo);
        Ok(Self { progress })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SqliteRepository>();
    }

    #[tokio::test]
    async fn unreachable_database_names_progress() {
        let err = Storage::sqlite("sqlite:///nonexistent-dir/for/progress.sqlite3?mode=ro")
            .await
            .err()
            .expect("opening should fail");
        assert!(matches!(err, SqliteInitError::Connect(_)));
        assert!(err.to_string().starts_with("could not open progress database"));
    }
}
