use async_trait::async_trait;
use reading_core::model::{ProgressKey, ProgressRecord};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository contract for reading progress records.
///
/// One record per key; saving overwrites.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Fetch the record stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get_progress(&self, key: &ProgressKey) -> Result<Option<ProgressRecord>, StorageError>;

    /// Insert or overwrite the record for its key.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn save_progress(&self, record: &ProgressRecord) -> Result<(), StorageError>;

    /// Remove the record for `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn delete_progress(&self, key: &ProgressKey) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    progress: Arc<Mutex<HashMap<ProgressKey, ProgressRecord>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.progress.lock().map(|guard| guard.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn get_progress(&self, key: &ProgressKey) -> Result<Option<ProgressRecord>, StorageError> {
        let guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn save_progress(&self, record: &ProgressRecord) -> Result<(), StorageError> {
        let mut guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(record.key().clone(), record.clone());
        Ok(())
    }

    async fn delete_progress(&self, key: &ProgressKey) -> Result<(), StorageError> {
        let mut guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(key);
        Ok(())
    }
}

/// Repository that fails every call, for hosts without durable storage.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnavailableRepository;

#[async_trait]
impl ProgressRepository for UnavailableRepository {
    async fn get_progress(&self, _key: &ProgressKey) -> Result<Option<ProgressRecord>, StorageError> {
        Err(StorageError::Unavailable("no progress storage".into()))
    }

    async fn save_progress(&self, _record: &ProgressRecord) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("no progress storage".into()))
    }

    async fn delete_progress(&self, _key: &ProgressKey) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("no progress storage".into()))
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            progress: Arc::new(InMemoryRepository::new()),
        }
    }

    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            progress: Arc::new(UnavailableRepository),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reading_core::time::fixed_now;

    fn key(title: &str) -> ProgressKey {
        ProgressKey::derive(Some("2"), "English", Some(title)).unwrap()
    }

    #[tokio::test]
    async fn save_overwrites_and_delete_removes() {
        let repo = InMemoryRepository::new();
        let key = key("Rain");

        repo.save_progress(&ProgressRecord::new(key.clone(), 1, fixed_now()))
            .await
            .unwrap();
        repo.save_progress(&ProgressRecord::new(key.clone(), 4, fixed_now()))
            .await
            .unwrap();

        let fetched = repo.get_progress(&key).await.unwrap().unwrap();
        assert_eq!(fetched.segment_index(), 4);
        assert_eq!(repo.len(), 1);

        repo.delete_progress(&key).await.unwrap();
        assert!(repo.get_progress(&key).await.unwrap().is_none());
        repo.delete_progress(&key).await.unwrap();
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn unavailable_repository_always_errors() {
        let storage = Storage::unavailable();
        let err = storage.progress.get_progress(&key("Rain")).await.unwrap_err();
        assert!(matches!(err, StorageError::Unavailable(_)));
    }
}
