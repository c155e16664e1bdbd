use super::account::{Account, AccountId, Amount, NewAccount};
use super::transaction::{TransactionId, TransactionRecord};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Shared handle to a ledger store backend.
pub type LedgerStoreRef = Arc<dyn LedgerStore>;

/// Durable storage for accounts and the append-only transaction log.
///
/// Implementations must make `apply_transfer` all-or-nothing: on any failure
/// no reader may observe a partially applied transfer. Reads return
/// consistent snapshots and never block behind an in-flight write beyond the
/// backend's own read path.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Inserts a new account. Fails with `DuplicateIdentity` when the
    /// account number, email, or phone number collides with an existing
    /// account.
    async fn create_account(&self, new: NewAccount) -> Result<Account>;

    /// Fetches an account by internal id. Fails with `NotFound` if absent.
    async fn get_account(&self, id: AccountId) -> Result<Account>;

    /// Atomically debits the sender, credits the receiver, bumps both
    /// versions, and appends the log entry. The store assigns the commit
    /// sequence and timestamp and returns the committed record.
    async fn apply_transfer(
        &self,
        sender_id: AccountId,
        receiver_id: AccountId,
        amount: Amount,
        tx_id: TransactionId,
    ) -> Result<TransactionRecord>;

    /// Snapshot of all accounts.
    async fn list_accounts(&self) -> Result<Vec<Account>>;

    /// Snapshot of the transaction log, newest first.
    async fn list_transactions(&self) -> Result<Vec<TransactionRecord>>;
}
