//! On-disk layout and reopening.

use std::fs;

use ntest::timeout;
use quix_core::hashing::fingerprint;
use quix_core::{connect, row, ColumnType, Value};

use super::helpers::users_db;

#[timeout(2000)]
#[test]
fn test_layout_matches_documented_format() {
    let (dir, db) = users_db().unwrap();
    let id = db
        .insert("users", &row! { "Email" => "a@x.com", "Name" => "A" })
        .unwrap();
    let table_dir = dir.path().join("users");

    let meta: serde_json::Value =
        serde_json::from_slice(&fs::read(table_dir.join("meta")).unwrap()).unwrap();
    assert_eq!(meta["columns"]["Email"], "text");
    assert_eq!(meta["unique"], serde_json::json!(["Email"]));

    let row_file: serde_json::Value =
        serde_json::from_slice(&fs::read(table_dir.join("rows").join(id.as_str())).unwrap())
            .unwrap();
    assert_eq!(row_file["id"], id.as_str());
    assert_eq!(row_file["fields"]["Name"], "A");

    let index_file = table_dir
        .join("index_Email")
        .join(fingerprint(&Value::from("a@x.com")).to_hex());
    assert_eq!(fs::read_to_string(index_file).unwrap(), id.as_str());
}

#[timeout(2000)]
#[test]
fn test_data_survives_reconnect() {
    let (dir, db) = users_db().unwrap();
    let id = db
        .insert("users", &row! { "Email" => "a@x.com", "Name" => "A" })
        .unwrap();
    drop(db);

    let db = connect(dir.path()).unwrap();
    assert_eq!(db.table_names().unwrap(), vec!["users"]);

    let found = db.select_one("users", &row! { "Email" => "a@x.com" }).unwrap();
    assert_eq!(found.unwrap().id, id);
    assert!(db
        .insert("users", &row! { "Email" => "a@x.com" })
        .is_err());
}

#[timeout(2000)]
#[test]
fn test_index_pointing_at_missing_row_reads_as_empty() {
    let (dir, db) = users_db().unwrap();
    let id = db.insert("users", &row! { "Email" => "a@x.com" }).unwrap();

    // crash between row delete and index cleanup
    fs::remove_file(dir.path().join("users").join("rows").join(id.as_str())).unwrap();

    assert!(db
        .select("users", &row! { "Email" => "a@x.com" })
        .unwrap()
        .is_empty());
    assert!(db.select("users", &row! {}).unwrap().is_empty());
}

#[timeout(2000)]
#[test]
fn test_scan_ignores_in_flight_temp_files() {
    let (dir, db) = users_db().unwrap();
    db.insert("users", &row! { "Email" => "a@x.com" }).unwrap();
    fs::write(
        dir.path().join("users").join("rows").join(".deadbeef.tmp.1"),
        b"{\"half",
    )
    .unwrap();

    assert_eq!(db.select("users", &row! {}).unwrap().len(), 1);
}

#[timeout(2000)]
#[test]
fn test_metadata_written_by_hand_is_readable() {
    let dir = tempfile::tempdir().unwrap();
    let table_dir = dir.path().join("legacy");
    fs::create_dir_all(table_dir.join("rows")).unwrap();
    fs::write(
        table_dir.join("meta"),
        r#"{"version":1,"name":"legacy","columns":{"Email":"str","Visits":"int"},"unique":["Email"]}"#,
    )
    .unwrap();

    let db = connect(dir.path()).unwrap();
    let table = db.table("legacy").unwrap();
    assert_eq!(table.schema().column_type("Visits"), Some(ColumnType::Integer));

    assert!(!table_dir.join("index_Email").exists());
    db.insert("legacy", &row! { "Email" => "a@x.com", "Visits" => 1 })
        .unwrap();
    assert_eq!(
        db.select("legacy", &row! { "Visits" => 1 }).unwrap().len(),
        1
    );
}
