#![cfg(feature = "storage-rocksdb")]

use assert_cmd::cargo_bin;
use std::io::Write;
use std::process::Command;
use tempfile::tempdir;

#[test]
fn test_rocksdb_persistence_recovery() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test_db");

    // 1. First run: register alice, who receives the stipend
    let mut ops1 = tempfile::NamedTempFile::new().unwrap();
    writeln!(ops1, r#"{{"op":"register_user","name":"Alice","handle":"alice"}}"#).unwrap();

    let mut cmd1 = Command::new(cargo_bin!("wishledger"));
    cmd1.arg(ops1.path()).arg("--db-path").arg(&db_path);
    let output1 = cmd1.output().expect("Failed to execute command");
    assert!(output1.status.success());
    let stdout1 = String::from_utf8_lossy(&output1.stdout);
    assert!(stdout1.contains("alice,5,0,0"));

    // 2. Second run against the same database: alice resolves from the
    // store by handle and her balance has been recovered
    let mut ops2 = tempfile::NamedTempFile::new().unwrap();
    writeln!(ops2, r#"{{"op":"register_user","name":"Bob","handle":"bob"}}"#).unwrap();
    writeln!(
        ops2,
        r#"{{"op":"request_friend","label":"f1","from":"alice","to":"bob"}}"#
    )
    .unwrap();
    writeln!(ops2, r#"{{"op":"accept_friend","request":"f1","actor":"bob"}}"#).unwrap();
    writeln!(
        ops2,
        r#"{{"op":"gift","sender":"alice","receiver":"bob","currency":"green","amount":2}}"#
    )
    .unwrap();

    let mut cmd2 = Command::new(cargo_bin!("wishledger"));
    cmd2.arg(ops2.path()).arg("--db-path").arg(&db_path);
    let output2 = cmd2.output().expect("Failed to execute command");
    assert!(output2.status.success());
    let stdout2 = String::from_utf8_lossy(&output2.stdout);

    // alice: 5 - 2 gifted, bob: 5 + 2 received
    assert!(stdout2.contains("alice,3,0,0"));
    assert!(stdout2.contains("bob,7,0,0"));
}
