//! Best-effort persistence of the last active segment.
//!
//! Progress is a convenience: every storage failure is logged and then
//! treated as "nothing stored" or "nothing written".

use std::sync::Arc;

use reading_core::Clock;
use reading_core::model::{ProgressKey, ProgressRecord};
use storage::repository::ProgressRepository;

#[derive(Clone)]
pub struct ProgressStore {
    repo: Arc<dyn ProgressRepository>,
    clock: Clock,
}

impl ProgressStore {
    #[must_use]
    pub fn new(repo: Arc<dyn ProgressRepository>) -> Self {
        Self {
            repo,
            clock: Clock::default(),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub async fn save(&self, key: &ProgressKey, segment_index: usize) {
        let record = ProgressRecord::new(key.clone(), segment_index, self.clock.now());
        if let Err(err) = self.repo.save_progress(&record).await {
            tracing::warn!(key = %key, error = %err, "could not save reading progress");
        }
    }

    pub async fn load(&self, key: &ProgressKey) -> Option<usize> {
        match self.repo.get_progress(key).await {
            Ok(record) => record.map(|record| record.segment_index()),
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "could not read reading progress");
                None
            }
        }
    }

    pub async fn remove(&self, key: &ProgressKey) {
        if let Err(err) = self.repo.delete_progress(key).await {
            tracing::warn!(key = %key, error = %err, "could not remove reading progress");
        }
    }
}

impl std::fmt::Debug for ProgressStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressStore")
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reading_core::time::{fixed_clock, fixed_now};
    use storage::repository::{InMemoryRepository, UnavailableRepository};

    fn key() -> ProgressKey {
        ProgressKey::derive(Some("4"), "English", Some("Wind")).unwrap()
    }

    #[tokio::test]
    async fn save_load_remove_round_trip() {
        let repo = Arc::new(InMemoryRepository::new());
        let store = ProgressStore::new(repo.clone()).with_clock(fixed_clock());

        assert_eq!(store.load(&key()).await, None);
        store.save(&key(), 2).await;
        store.save(&key(), 3).await;
        assert_eq!(store.load(&key()).await, Some(3));

        let record = repo.get_progress(&key()).await.unwrap().unwrap();
        assert_eq!(record.updated_at(), fixed_now());

        store.remove(&key()).await;
        assert_eq!(store.load(&key()).await, None);
    }

    #[tokio::test]
    async fn unavailable_storage_is_a_no_op() {
        let store = ProgressStore::new(Arc::new(UnavailableRepository));
        store.save(&key(), 1).await;
        assert_eq!(store.load(&key()).await, None);
        store.remove(&key()).await;
    }
}
