use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reading_core::model::{ProgressKey, ProgressRecord};
use sqlx::Row;

use super::SqliteRepository;
use crate::repository::{ProgressRepository, StorageError};

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

#[async_trait]
impl ProgressRepository for SqliteRepository {
    async fn get_progress(&self, key: &ProgressKey) -> Result<Option<ProgressRecord>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT key, segment_index, updated_at
            FROM reading_progress
            WHERE key = ?1
            ",
        )
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let raw_key: String = row.try_get("key").map_err(ser)?;
        let segment_index: i64 = row.try_get("segment_index").map_err(ser)?;
        let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(ser)?;
        let segment_index = usize::try_from(segment_index)
            .map_err(|_| StorageError::Serialization("segment_index sign overflow".into()))?;

        Ok(Some(ProgressRecord::new(
            ProgressKey::from_persisted(raw_key),
            segment_index,
            updated_at,
        )))
    }

    async fn save_progress(&self, record: &ProgressRecord) -> Result<(), StorageError> {
        let segment_index = i64::try_from(record.segment_index())
            .map_err(|_| StorageError::Serialization("segment_index overflow".into()))?;

        sqlx::query(
            r"
            INSERT INTO reading_progress (key, segment_index, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                segment_index = excluded.segment_index,
                updated_at = excluded.updated_at
            ",
        )
        .bind(record.key().as_str())
        .bind(segment_index)
        .bind(record.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(())
    }

    async fn delete_progress(&self, key: &ProgressKey) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM reading_progress WHERE key = ?1")
            .bind(key.as_str())
            .execute(&self.pool)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;
        Ok(())
    }
}
