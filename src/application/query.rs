use crate::domain::account::{Account, AccountId};
use crate::domain::ports::LedgerStoreRef;
use crate::domain::transaction::TransactionRecord;
use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Aggregate totals over the whole ledger at one snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerTotals {
    pub account_count: usize,
    pub transaction_count: usize,
    pub total_balance: Decimal,
}

/// Read-only projections over the store.
///
/// Queries never touch the lock manager: they read whatever consistent
/// snapshot the store exposes, which is either fully before or fully after
/// any in-flight transfer.
pub struct QueryService {
    store: LedgerStoreRef,
}

impl QueryService {
    pub fn new(store: LedgerStoreRef) -> Self {
        Self { store }
    }

    pub async fn accounts(&self) -> Result<Vec<Account>> {
        self.store.list_accounts().await
    }

    /// Full transfer history, newest first.
    pub async fn history(&self) -> Result<Vec<TransactionRecord>> {
        self.store.list_transactions().await
    }

    pub async fn totals(&self) -> Result<LedgerTotals> {
        let accounts = self.store.list_accounts().await?;
        let transactions = self.store.list_transactions().await?;
        let mut total = 0i64;
        for account in &accounts {
            total = total
                .checked_add(account.balance.minor_units())
                .ok_or(LedgerError::BalanceOverflow)?;
        }
        Ok(LedgerTotals {
            account_count: accounts.len(),
            transaction_count: transactions.len(),
            total_balance: Decimal::new(total, crate::domain::account::MINOR_UNIT_SCALE),
        })
    }

    /// Replays the log against opening balances and returns the accounts
    /// whose cached balance disagrees with it. An empty result means the
    /// ledger reconciles: the log is the source of truth and every balance
    /// is a faithful projection of it.
    pub async fn reconcile(&self) -> Result<Vec<AccountId>> {
        let accounts = self.store.list_accounts().await?;
        let log = self.store.list_transactions().await?;

        let mut deltas: HashMap<AccountId, i64> = HashMap::new();
        for record in &log {
            let units = record.amount.minor_units();
            *deltas.entry(record.sender_id).or_default() -= units;
            *deltas.entry(record.receiver_id).or_default() += units;
        }

        let mut mismatched = Vec::new();
        for account in &accounts {
            let expected =
                account.opening_balance.minor_units() + deltas.get(&account.id).copied().unwrap_or(0);
            if account.balance.minor_units() != expected {
                mismatched.push(account.id);
            }
        }
        Ok(mismatched)
    }
}
