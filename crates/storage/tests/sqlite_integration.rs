use chrono::Duration;
use reading_core::model::{ProgressKey, ProgressRecord};
use reading_core::time::fixed_now;
use storage::repository::{ProgressRepository, Storage};
use storage::sqlite::SqliteRepository;

fn key(title: &str) -> ProgressKey {
    ProgressKey::derive(Some("4"), "Science", Some(title)).unwrap()
}

#[tokio::test]
async fn sqlite_progress_round_trips_and_overwrites() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_progress?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let key = key("Food: Where Does It Come From?");
    assert!(repo.get_progress(&key).await.unwrap().is_none());

    repo.save_progress(&ProgressRecord::new(key.clone(), 2, fixed_now()))
        .await
        .unwrap();
    let later = fixed_now() + Duration::minutes(3);
    repo.save_progress(&ProgressRecord::new(key.clone(), 5, later))
        .await
        .unwrap();

    let fetched = repo.get_progress(&key).await.unwrap().expect("record");
    assert_eq!(fetched.key(), &key);
    assert_eq!(fetched.segment_index(), 5);
    assert_eq!(fetched.updated_at(), later);

    repo.delete_progress(&key).await.unwrap();
    assert!(repo.get_progress(&key).await.unwrap().is_none());
}

#[tokio::test]
async fn sqlite_migrations_are_idempotent() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_migrate?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("first migrate");
    repo.migrate().await.expect("second migrate");

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_migrations")
        .fetch_one(repo.pool())
        .await
        .unwrap();
    assert_eq!(applied, 1);
}

#[tokio::test]
async fn storage_sqlite_keeps_keys_separate() {
    let storage = Storage::sqlite("sqlite:file:memdb_storage?mode=memory&cache=shared")
        .await
        .expect("storage");

    let first = key("Chapter One");
    let second = key("Chapter Two");
    storage
        .progress
        .save_progress(&ProgressRecord::new(first.clone(), 1, fixed_now()))
        .await
        .unwrap();
    storage
        .progress
        .save_progress(&ProgressRecord::new(second.clone(), 7, fixed_now()))
        .await
        .unwrap();
    storage.progress.delete_progress(&first).await.unwrap();

    assert!(storage.progress.get_progress(&first).await.unwrap().is_none());
    let kept = storage.progress.get_progress(&second).await.unwrap().unwrap();
    assert_eq!(kept.segment_index(), 7);
}
