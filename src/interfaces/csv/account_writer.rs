use crate::domain::account::Account;
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

/// One CSV row of the final account summary.
#[derive(Debug, Serialize)]
struct AccountSummary {
    account_number: u32,
    first_name: String,
    last_name: String,
    email: String,
    balance: Decimal,
    version: u64,
}

impl From<&Account> for AccountSummary {
    fn from(account: &Account) -> Self {
        Self {
            account_number: account.number.value(),
            first_name: account.holder.first_name.clone(),
            last_name: account.holder.last_name.clone(),
            email: account.holder.email.clone(),
            balance: account.balance.to_decimal(),
            version: account.version,
        }
    }
}

/// Writes account summaries as CSV, sorted by account number so the output
/// is stable across runs.
pub struct AccountWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> AccountWriter<W> {
    pub fn new(target: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(target),
        }
    }

    pub fn write_accounts(&mut self, mut accounts: Vec<Account>) -> Result<()> {
        accounts.sort_by_key(|account| account.number.value());
        for account in &accounts {
            self.writer.serialize(AccountSummary::from(account))?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
