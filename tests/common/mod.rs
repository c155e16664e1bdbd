#![allow(dead_code)] // each test binary uses its own subset of helpers

use ledger_core::application::engine::TransferEngine;
use ledger_core::domain::account::{Account, AccountHolder, Balance};
use rust_decimal::Decimal;
use std::io::Write;
use std::path::Path;

/// Opens an account with a seeded balance, deriving holder identity from
/// the index so emails and phone numbers never collide within a test.
pub async fn open_seeded(engine: &TransferEngine, index: usize, balance: Decimal) -> Account {
    engine
        .open_account(
            AccountHolder {
                first_name: format!("Holder{index}"),
                last_name: "Test".into(),
                phone_number: format!("555-{index:04}"),
                email: format!("holder{index}@example.com"),
            },
            None,
            Balance::from_decimal(balance).unwrap(),
        )
        .await
        .unwrap()
}

/// Writes a JSON-lines command file for CLI tests.
pub fn write_command_file(path: &Path, lines: &[&str]) {
    let mut file = std::fs::File::create(path).unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
}

pub fn open_command(number: u32, email: &str, phone: &str, opening: &str) -> String {
    format!(
        r#"{{"op":"open_account","first_name":"Test","last_name":"Holder","phone_number":"{phone}","email":"{email}","account_number":{number},"opening_balance":"{opening}"}}"#
    )
}

pub fn transfer_command(sender: u32, receiver: u32, amount: &str) -> String {
    format!(r#"{{"op":"transfer","sender":{sender},"receiver":{receiver},"amount":"{amount}"}}"#)
}
