//! Tests for the SQLite store.

use std::time::Duration;

use chrono::Utc;
use tempfile::NamedTempFile;
use tictac_promo::{RewardStore, SqliteStore};

/// Creates a temporary database with schema applied. The file handle must
/// stay in scope to keep the database alive.
fn setup_test_db() -> (NamedTempFile, SqliteStore) {
    let db_file = NamedTempFile::new().expect("Failed to create temp file");
    let db_path = db_file.path().to_str().expect("Invalid path").to_string();
    let store = SqliteStore::open(db_path, Duration::from_secs(10)).expect("Failed to open store");
    (db_file, store)
}

fn codes(list: &[&str]) -> Vec<String> {
    list.iter().map(|c| c.to_string()).collect()
}

#[tokio::test]
async fn test_seed_ignores_duplicates() {
    let (_db, store) = setup_test_db();
    let first = store.seed_codes(codes(&["A1", "B2", "C3"])).await.unwrap();
    let second = store.seed_codes(codes(&["C3", "D4"])).await.unwrap();
    assert_eq!(first, 3);
    assert_eq!(second, 1);

    let stats = store.pool_stats().await.unwrap();
    assert_eq!(*stats.total(), 4);
    assert_eq!(*stats.unused(), 4);
    assert_eq!(stats.used(), 0);
}

#[tokio::test]
async fn test_insert_win_is_insert_or_ignore() {
    let (_db, store) = setup_test_db();
    assert!(store.insert_win("s_0123456789").await.unwrap());
    assert!(!store.insert_win("s_0123456789").await.unwrap());

    let record = store.find_win("s_0123456789").await.unwrap().expect("win stored");
    assert_eq!(record.session_id(), "s_0123456789");
    assert!(store.find_win("s_other").await.unwrap().is_none());
}

#[tokio::test]
async fn test_bind_code_is_guarded_by_unused() {
    let (_db, store) = setup_test_db();
    store.seed_codes(codes(&["ONLY"])).await.unwrap();
    let candidate = store.pick_unused_code().await.unwrap().expect("code available");

    let now = Utc::now().naive_utc();
    let bound = store
        .bind_code(*candidate.id(), Some("tg:1"), now)
        .await
        .unwrap()
        .expect("first bind wins");
    assert!(*bound.is_used());
    assert_eq!(bound.used_by().as_deref(), Some("tg:1"));
    assert_eq!(*bound.used_at(), Some(now));

    // Same row again: the guard no longer matches.
    let again = store.bind_code(*candidate.id(), Some("tg:2"), now).await.unwrap();
    assert!(again.is_none());
    assert!(store.pick_unused_code().await.unwrap().is_none());

    let owner = store.find_code_by_claimant("tg:1").await.unwrap().unwrap();
    assert_eq!(owner.code(), "ONLY");
    assert!(store.find_code_by_claimant("tg:2").await.unwrap().is_none());
}

#[tokio::test]
async fn test_claimant_cannot_bind_two_rows() {
    let (_db, store) = setup_test_db();
    store.seed_codes(codes(&["X1", "X2"])).await.unwrap();
    let now = Utc::now().naive_utc();

    let first = store.pick_unused_code().await.unwrap().unwrap();
    assert!(store.bind_code(*first.id(), Some("tg:7"), now).await.unwrap().is_some());

    let second = store.pick_unused_code().await.unwrap().unwrap();
    let conflict = store.bind_code(*second.id(), Some("tg:7"), now).await.unwrap();
    assert!(conflict.is_none(), "used_by is unique");

    let stats = store.pool_stats().await.unwrap();
    assert_eq!(*stats.unused(), 1);
}

#[tokio::test]
async fn test_anonymous_binds_do_not_collide() {
    let (_db, store) = setup_test_db();
    store.seed_codes(codes(&["N1", "N2"])).await.unwrap();
    let now = Utc::now().naive_utc();
    for _ in 0..2 {
        let row = store.pick_unused_code().await.unwrap().unwrap();
        let bound = store.bind_code(*row.id(), None, now).await.unwrap();
        assert!(bound.is_some());
    }
    assert_eq!(*store.pool_stats().await.unwrap().unused(), 0);
}

#[tokio::test]
async fn test_unreachable_database_is_an_error() {
    let store = SqliteStore::new(
        "/nonexistent-dir/for/tests/promo.db".to_string(),
        Duration::from_secs(5),
    );
    assert!(store.find_win("s_0123456789").await.is_err());
    assert!(store.pick_unused_code().await.is_err());
}
