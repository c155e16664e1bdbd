#![cfg(feature = "storage-rocksdb")]

use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;
use tempfile::tempdir;

mod common;

#[test]
fn test_ledger_recovers_across_runs() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("ledger_db");

    // First run: open two accounts and move 300.00 between them.
    let input1 = dir.path().join("run1.jsonl");
    common::write_command_file(
        &input1,
        &[
            &common::open_command(100_000_001, "a@example.com", "555-0001", "1000.00"),
            &common::open_command(100_000_002, "b@example.com", "555-0002", "500.00"),
            &common::transfer_command(100_000_001, 100_000_002, "300.00"),
        ],
    );
    Command::new(cargo_bin!("ledger-core"))
        .arg(&input1)
        .arg("--db-path")
        .arg(&db_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("100000001,Test,Holder,a@example.com,700.00,1"));

    // Second run against the same database: balances are recovered and
    // transfers can address the recovered accounts by number.
    let input2 = dir.path().join("run2.jsonl");
    common::write_command_file(
        &input2,
        &[&common::transfer_command(100_000_002, 100_000_001, "100.00")],
    );
    Command::new(cargo_bin!("ledger-core"))
        .arg(&input2)
        .arg("--db-path")
        .arg(&db_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("100000001,Test,Holder,a@example.com,800.00,2"))
        .stdout(predicate::str::contains("100000002,Test,Holder,b@example.com,700.00,2"));
}
