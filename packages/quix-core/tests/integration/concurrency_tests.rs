//! Concurrent writers sharing one database directory.

use std::path::PathBuf;
use std::process::Command;
use std::sync::{Arc, Barrier};
use std::thread;

use ntest::timeout;
use quix_core::{connect, row, ColumnType, DbError};

use super::helpers::{entries, users_db};

const CHILD_DIR_ENV: &str = "QUIX_CONCURRENCY_CHILD_DIR";

/// Races `writers` handles inserting the same unique email.
/// Returns (successes, unique violations).
fn race_same_email(writers: usize) -> (tempfile::TempDir, usize, usize) {
    let (dir, _db) = users_db().unwrap();
    let barrier = Arc::new(Barrier::new(writers));
    let root = dir.path().to_path_buf();

    let handles: Vec<_> = (0..writers)
        .map(|i| {
            let barrier = Arc::clone(&barrier);
            let root = root.clone();
            thread::spawn(move || {
                let db = connect(&root).unwrap();
                barrier.wait();
                db.insert(
                    "users",
                    &row! { "Email" => "race@x.com", "Name" => format!("writer-{}", i) },
                )
            })
        })
        .collect();

    let mut ok = 0;
    let mut violations = 0;
    for handle in handles {
        match handle.join().unwrap() {
            Ok(_) => ok += 1,
            Err(DbError::UniqueConstraintViolation { .. }) => violations += 1,
            Err(other) => panic!("unexpected error: {}", other),
        }
    }
    (dir, ok, violations)
}

#[timeout(20000)]
#[test]
fn test_concurrent_inserts_same_unique_value() {
    let writers = 8;
    let (dir, ok, violations) = race_same_email(writers);

    assert_eq!(ok, 1);
    assert_eq!(violations, writers - 1);
    assert_eq!(entries(&dir, "users", "rows"), 1);
    assert_eq!(entries(&dir, "users", "index_Email"), 1);
    assert!(!dir.path().join("users").join("users.lock").exists());
}

#[timeout(20000)]
#[test]
fn test_concurrent_distinct_inserts_all_land() {
    let (dir, _db) = users_db().unwrap();
    let root = dir.path().to_path_buf();

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let root = root.clone();
            thread::spawn(move || {
                let db = connect(&root).unwrap();
                for i in 0..10 {
                    db.insert("users", &row! { "Email" => format!("{}-{}@x.com", t, i) })
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let db = connect(&root).unwrap();
    assert_eq!(db.select("users", &row! {}).unwrap().len(), 40);
    assert_eq!(entries(&dir, "users", "index_Email"), 40);
}

#[timeout(20000)]
#[test]
fn test_concurrent_updates_to_one_value_admit_one_winner() {
    let (dir, db) = users_db().unwrap();
    for i in 0..6 {
        db.insert("users", &row! { "Email" => format!("u{}@x.com", i), "Name" => "N" })
            .unwrap();
    }
    let root = dir.path().to_path_buf();
    let barrier = Arc::new(Barrier::new(6));

    let handles: Vec<_> = (0..6)
        .map(|i| {
            let root = root.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let db = connect(&root).unwrap();
                barrier.wait();
                db.update(
                    "users",
                    &row! { "Email" => format!("u{}@x.com", i) },
                    &row! { "Email" => "winner@x.com" },
                )
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results.iter().filter(|r| matches!(r, Ok(1))).count(), 1);
    assert_eq!(
        results
            .iter()
            .filter(|r| matches!(r, Err(DbError::UniqueConstraintViolation { .. })))
            .count(),
        5
    );
    assert_eq!(db.select("users", &row! {}).unwrap().len(), 6);
    assert_eq!(entries(&dir, "users", "index_Email"), 6);
}

/// Child side of [`test_cross_process_inserts_same_unique_value`]. A no-op
/// unless spawned by that test.
#[test]
fn cross_process_insert_child() {
    let Some(root) = std::env::var_os(CHILD_DIR_ENV).map(PathBuf::from) else {
        return;
    };
    let db = connect(&root).unwrap();
    let outcome = match db.insert("users", &row! { "Email" => "proc@x.com" }) {
        Ok(_) => "ok",
        Err(DbError::UniqueConstraintViolation { .. }) => "violation",
        Err(other) => panic!("unexpected error: {}", other),
    };
    let results = root.join("results");
    std::fs::create_dir_all(&results).unwrap();
    std::fs::write(results.join(std::process::id().to_string()), outcome).unwrap();
}

#[timeout(60000)]
#[test]
fn test_cross_process_inserts_same_unique_value() {
    let (dir, _db) = users_db().unwrap();
    let exe = std::env::current_exe().unwrap();
    let processes = 4;

    let children: Vec<_> = (0..processes)
        .map(|_| {
            Command::new(&exe)
                .args([
                    "concurrency_tests::cross_process_insert_child",
                    "--exact",
                    "--test-threads=1",
                ])
                .env(CHILD_DIR_ENV, dir.path())
                .spawn()
                .unwrap()
        })
        .collect();
    for mut child in children {
        assert!(child.wait().unwrap().success());
    }

    let outcomes: Vec<String> = std::fs::read_dir(dir.path().join("results"))
        .unwrap()
        .map(|e| std::fs::read_to_string(e.unwrap().path()).unwrap())
        .collect();
    assert_eq!(outcomes.len(), processes);
    assert_eq!(outcomes.iter().filter(|o| *o == "ok").count(), 1);
    assert_eq!(outcomes.iter().filter(|o| *o == "violation").count(), processes - 1);

    let db = connect(dir.path()).unwrap();
    assert_eq!(db.select("users", &row! { "Email" => "proc@x.com" }).unwrap().len(), 1);
    assert_eq!(entries(&dir, "users", "rows"), 1);
}

#[timeout(5000)]
#[test]
fn test_lock_timeout_surfaces_to_caller() {
    let dir = tempfile::tempdir().unwrap();
    let config = quix_core::DbConfig {
        lock_timeout_ms: 50,
        ..quix_core::DbConfig::with_data_dir(dir.path())
    };
    let db = quix_core::Database::connect_with_config(config).unwrap();
    db.create_table("t", &[("A", ColumnType::Text)], &[]).unwrap();

    // simulate a crashed holder
    std::fs::write(
        dir.path().join("t").join("t.lock"),
        br#"{"pid":4242,"acquired_at_ms":0}"#,
    )
    .unwrap();

    match db.insert("t", &row! { "A" => "x" }) {
        Err(DbError::LockTimeout { holder, .. }) => {
            assert_eq!(holder.as_deref(), Some("pid 4242"))
        }
        other => panic!("expected LockTimeout, got {:?}", other),
    }
    assert!(db.select("t", &row! {}).unwrap().is_empty());
}
