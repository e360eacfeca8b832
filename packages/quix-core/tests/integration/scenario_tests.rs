//! End-to-end CRUD behavior through the database handle.

use ntest::timeout;
use quix_core::{row, DbError, Value};

use super::helpers::{entries, users_db};

/// Signup flow: unique email, login lookup, email change.
#[timeout(2000)]
#[test]
fn test_user_signup_scenario() {
    let (_dir, db) = users_db().unwrap();

    let id = db.insert(
        "users",
        &row! { "Email" => "a@x.com", "Name" => "A", "Password" => "p" },
    ).unwrap();

    let dup = db.insert(
        "users",
        &row! { "Email" => "a@x.com", "Name" => "Other", "Password" => "q" },
    );
    assert!(matches!(
        dup,
        Err(DbError::UniqueConstraintViolation { ref column, .. }) if column == "Email"
    ));

    let login = db.select("users", &row! { "Email" => "a@x.com", "Password" => "p" }).unwrap();
    assert_eq!(login.len(), 1);
    assert_eq!(login[0].id, id);
    assert_eq!(login[0].get("Name"), Some(&Value::from("A")));

    let wrong_password = db.select("users", &row! { "Email" => "a@x.com", "Password" => "x" }).unwrap();
    assert!(wrong_password.is_empty());

    let updated = db.update(
        "users",
        &row! { "Email" => "a@x.com" },
        &row! { "Email" => "b@x.com" },
    ).unwrap();
    assert_eq!(updated, 1);
    assert!(db.select("users", &row! { "Email" => "a@x.com" }).unwrap().is_empty());

    let moved = db.select_one("users", &row! { "Email" => "b@x.com" }).unwrap();
    let moved = moved.expect("row reachable by new email");
    assert_eq!(moved.id, id);
    assert_eq!(
        moved.fields,
        row! { "Email" => "b@x.com", "Name" => "A", "Password" => "p" }
    );
}

#[timeout(2000)]
#[test]
fn test_create_table_twice_is_noop() {
    let (_dir, db) = users_db().unwrap();
    let before = db.table("users").unwrap().schema().clone();

    let again = db.create_table("users", &[("Email", quix_core::ColumnType::Integer)], &[]).unwrap();
    assert_eq!(again.schema(), &before);

    // a fresh handle goes through the on-disk path
    let other = quix_core::connect(db.path()).unwrap();
    let reopened = other.create_table("users", &[("X", quix_core::ColumnType::Float)], &[]).unwrap();
    assert_eq!(reopened.schema(), &before);
}

#[timeout(2000)]
#[test]
fn test_insert_select_round_trip() {
    let (_dir, db) = users_db().unwrap();
    let data = row! { "Email" => "rt@x.com", "Name" => "Round Trip", "Password" => "🔑" };

    let id = db.insert("users", &data).unwrap();
    let found = db.select("users", &row! { "Name" => "Round Trip" }).unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, id);
    assert_eq!(found[0].fields, data);
}

#[timeout(2000)]
#[test]
fn test_duplicate_insert_leaves_counts_unchanged() {
    let (dir, db) = users_db().unwrap();
    db.insert("users", &row! { "Email" => "a@x.com", "Name" => "A" }).unwrap();

    for name in ["B", "C", "D"] {
        assert!(db
            .insert("users", &row! { "Email" => "a@x.com", "Name" => name })
            .is_err());
    }

    assert_eq!(entries(&dir, "users", "rows"), 1);
    assert_eq!(entries(&dir, "users", "index_Email"), 1);
}

#[timeout(2000)]
#[test]
fn test_delete_then_select_and_repeat_delete() {
    let (dir, db) = users_db().unwrap();
    db.insert("users", &row! { "Email" => "a@x.com", "Name" => "A" }).unwrap();
    db.insert("users", &row! { "Email" => "b@x.com", "Name" => "B" }).unwrap();

    assert_eq!(db.delete("users", &row! { "Name" => "A" }).unwrap(), 1);
    assert!(db.select("users", &row! { "Name" => "A" }).unwrap().is_empty());
    assert_eq!(db.delete("users", &row! { "Name" => "A" }).unwrap(), 0);

    assert_eq!(entries(&dir, "users", "rows"), 1);
    assert_eq!(entries(&dir, "users", "index_Email"), 1);
}

#[timeout(2000)]
#[test]
fn test_typed_columns() {
    let dir = tempfile::tempdir().unwrap();
    let db = quix_core::connect(dir.path()).unwrap();
    db.create_table(
        "items",
        &[
            ("Sku", quix_core::ColumnType::Integer),
            ("Price", quix_core::ColumnType::Float),
            ("Active", quix_core::ColumnType::Boolean),
        ],
        &["Sku"],
    ).unwrap();

    db.insert("items", &row! { "Sku" => 1, "Price" => 9.5, "Active" => true }).unwrap();
    db.insert("items", &row! { "Sku" => 2, "Price" => 0.1, "Active" => false }).unwrap();
    assert!(db.insert("items", &row! { "Sku" => 1 }).is_err());

    assert_eq!(db.select("items", &row! { "Active" => true }).unwrap().len(), 1);
    assert_eq!(db.select("items", &row! { "Price" => 0.1 }).unwrap().len(), 1);
    assert!(matches!(
        db.select("items", &row! { "Sku" => "1" }),
        Err(DbError::SchemaMismatch { .. })
    ));
    assert!(matches!(
        db.insert("items", &row! { "Sku" => 3, "Price" => f64::NAN }),
        Err(DbError::SchemaMismatch { .. })
    ));
}
