//! Integration tests for `PgLockStore` against a real database.
//!
//! These need `DATABASE_URL` pointing at a PostgreSQL server that `sqlx::test`
//! may create scratch databases on. Run with `cargo test -- --ignored`.

use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use editlock_core::clock::SystemClock;
use editlock_core::config::LockingConfig;
use editlock_core::engine::{LockEngine, LockUser};
use editlock_core::error::CoreError;
use editlock_core::memory::InMemoryTargets;
use editlock_core::record::{LockHolder, LockMode, LockRecord};
use editlock_core::store::LockStore;
use editlock_core::target::LockTarget;
use editlock_db::store::PgLockStore;
use sqlx::PgPool;

fn article(id: i64) -> LockTarget {
    LockTarget::new("article", id).unwrap()
}

fn held_by(target: LockTarget, user_id: i64) -> LockRecord {
    LockRecord::unlocked(target).held_by(
        LockHolder {
            user_id,
            display_name: Some(format!("user{user_id}")),
            acquired_at: Utc::now(),
        },
        LockMode::Hard,
    )
}

// ---------------------------------------------------------------------------
// Conditional writes
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn insert_is_first_writer_wins(pool: PgPool) {
    let store = PgLockStore::new(pool);

    let stored = store.upsert(&held_by(article(1), 10)).await.unwrap().unwrap();
    assert!(stored.version > 0);
    assert_eq!(stored.owner(), Some(10));
    assert_eq!(stored.owner_name(), Some("user10"));

    let second = store.upsert(&held_by(article(1), 11)).await.unwrap();
    assert!(second.is_none(), "second insert for the same target must lose");
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn update_requires_current_version(pool: PgPool) {
    let store = PgLockStore::new(pool);
    let stored = store.upsert(&held_by(article(1), 10)).await.unwrap().unwrap();

    let released = store.upsert(&stored.released()).await.unwrap().unwrap();
    assert!(released.version > stored.version);
    assert!(released.holder.is_none());
    assert!(released.is_hard(), "mode survives release");

    assert!(store.upsert(&stored).await.unwrap().is_none());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn recreated_row_never_reuses_a_version(pool: PgPool) {
    let store = PgLockStore::new(pool);
    let first = store.upsert(&held_by(article(1), 10)).await.unwrap().unwrap();
    assert!(store.delete(&article(1)).await.unwrap());

    let second = store.upsert(&held_by(article(1), 20)).await.unwrap().unwrap();
    assert_ne!(second.version, first.version);

    assert!(store.upsert(&first.released()).await.unwrap().is_none());
    let current = store.find(&article(1)).await.unwrap().unwrap();
    assert_eq!(current.owner(), Some(20));
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn active_listings_and_dormant_sweep(pool: PgPool) {
    let store = PgLockStore::new(pool);
    let cutoff = Utc::now() - TimeDelta::seconds(5);

    store.upsert(&held_by(article(1), 10)).await.unwrap();
    store.upsert(&held_by(article(2), 20)).await.unwrap();
    let third = store.upsert(&held_by(article(3), 10)).await.unwrap().unwrap();
    store.upsert(&third.released()).await.unwrap();

    let mine = store.find_all_active_for(10, cutoff).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].target, article(1));

    assert_eq!(store.find_all_active(cutoff).await.unwrap().len(), 2);

    // Only the released row is dormant relative to an old cutoff.
    assert_eq!(store.delete_dormant(cutoff).await.unwrap(), 1);
    assert!(store.delete(&article(2)).await.unwrap());
    assert!(store.find(&article(2)).await.unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Engine over Postgres
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn concurrent_first_acquire_has_one_winner(pool: PgPool) {
    let engine = Arc::new(LockEngine::new(
        LockingConfig::default(),
        Arc::new(PgLockStore::new(pool)),
        Arc::new(InMemoryTargets::Any),
        Arc::new(SystemClock),
    ));

    let mut handles = Vec::new();
    for user_id in 1..=8 {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            engine
                .acquire(&article(42), &LockUser::new(user_id, None), LockMode::Soft, false)
                .await
        }));
    }

    let mut winners = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => winners += 1,
            Err(CoreError::LockConflict(_)) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(winners, 1);
}
