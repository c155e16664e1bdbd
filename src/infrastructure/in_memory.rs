use crate::domain::account::{Account, AccountId, Amount, NewAccount};
use crate::domain::ports::LedgerStore;
use crate::domain::transaction::{TransactionId, TransactionRecord, TransactionStatus};
use crate::error::{IdentityField, LedgerError, Result, TransferSide};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Everything the in-memory backend knows, behind one lock.
///
/// Keeping accounts, the identity indexes, and the log in a single guarded
/// struct is what makes `apply_transfer` atomic here: writers hold the write
/// guard across the whole multi-row mutation, readers see either the state
/// before it or after it.
#[derive(Default)]
struct LedgerState {
    accounts: HashMap<AccountId, Account>,
    numbers: HashSet<u32>,
    emails: HashSet<String>,
    phones: HashSet<String>,
    log: Vec<TransactionRecord>,
    next_seq: u64,
}

/// In-memory ledger store.
///
/// The reference backend: used by default in the binary and throughout the
/// test suite. `Clone` shares the underlying state.
#[derive(Default, Clone)]
pub struct InMemoryLedger {
    state: Arc<RwLock<LedgerState>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedger {
    async fn create_account(&self, new: NewAccount) -> Result<Account> {
        let mut state = self.state.write().await;

        if state.numbers.contains(&new.number.value()) {
            return Err(LedgerError::DuplicateIdentity {
                field: IdentityField::AccountNumber,
            });
        }
        if state.emails.contains(&new.holder.email) {
            return Err(LedgerError::DuplicateIdentity {
                field: IdentityField::Email,
            });
        }
        if state.phones.contains(&new.holder.phone_number) {
            return Err(LedgerError::DuplicateIdentity {
                field: IdentityField::Phone,
            });
        }

        let account = Account {
            id: new.id,
            number: new.number,
            holder: new.holder,
            balance: new.opening_balance,
            opening_balance: new.opening_balance,
            version: 0,
            created_at: Utc::now(),
        };

        state.numbers.insert(account.number.value());
        state.emails.insert(account.holder.email.clone());
        state.phones.insert(account.holder.phone_number.clone());
        state.accounts.insert(account.id, account.clone());

        Ok(account)
    }

    async fn get_account(&self, id: AccountId) -> Result<Account> {
        let state = self.state.read().await;
        state
            .accounts
            .get(&id)
            .cloned()
            .ok_or(LedgerError::NotFound { id })
    }

    async fn apply_transfer(
        &self,
        sender_id: AccountId,
        receiver_id: AccountId,
        amount: Amount,
        tx_id: TransactionId,
    ) -> Result<TransactionRecord> {
        let mut state = self.state.write().await;

        // Stage both mutations on clones; nothing is written back until
        // every step has succeeded, so a failure leaves no partial effect.
        let mut sender = state
            .accounts
            .get(&sender_id)
            .cloned()
            .ok_or(LedgerError::AccountNotFound {
                side: TransferSide::Sender,
                id: sender_id,
            })?;
        let mut receiver =
            state
                .accounts
                .get(&receiver_id)
                .cloned()
                .ok_or(LedgerError::AccountNotFound {
                    side: TransferSide::Receiver,
                    id: receiver_id,
                })?;

        sender.apply_debit(amount)?;
        receiver.apply_credit(amount)?;

        let record = TransactionRecord {
            id: tx_id,
            seq: state.next_seq,
            sender_id,
            receiver_id,
            amount,
            created_at: Utc::now(),
            status: TransactionStatus::Committed,
        };

        state.next_seq += 1;
        state.accounts.insert(sender_id, sender);
        state.accounts.insert(receiver_id, receiver);
        state.log.push(record.clone());

        Ok(record)
    }

    async fn list_accounts(&self) -> Result<Vec<Account>> {
        let state = self.state.read().await;
        Ok(state.accounts.values().cloned().collect())
    }

    async fn list_transactions(&self) -> Result<Vec<TransactionRecord>> {
        let state = self.state.read().await;
        // The log is appended in seq order; newest first is a reverse scan.
        Ok(state.log.iter().rev().cloned().collect())
    }
}
