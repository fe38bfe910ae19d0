#![cfg(feature = "storage-rocksdb")]

use assert_cmd::cargo_bin;
use std::process::Command;
use tempfile::tempdir;

fn review(db_path: &std::path::Path, seed: bool) -> String {
    let mut cmd = Command::new(cargo_bin!("foodcart"));
    cmd.env_remove("YANDEX_API_KEY")
        .arg("review")
        .arg("--db-path")
        .arg(db_path);
    if seed {
        cmd.arg("--seed").arg("tests/fixtures/seed.json");
    }
    let output = cmd.output().expect("Failed to execute command");
    assert!(output.status.success());
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_rocksdb_persistence_recovery() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test_db");

    // 1. First run loads the seed and takes the first automatic step
    let first = review(&db_path, true);
    assert!(first.contains("1,in_kitchen,Anna Smirnova"));

    // 2. Second run starts from what the first one stored, cached places included
    let second = review(&db_path, false);
    assert!(second.contains("1,cooking,Anna Smirnova"));
    assert!(second.contains("Star Burger Arbat (1.396 km)"));
    assert!(second.contains("4,created,Gleb Popov"));
}
