use super::locking::AccountLockManager;
use crate::domain::account::{
    Account, AccountHolder, AccountId, AccountNumber, Amount, Balance, NewAccount,
};
use crate::domain::ports::LedgerStoreRef;
use crate::domain::transaction::{TransactionId, TransactionRecord};
use crate::error::{IdentityField, LedgerError, Result, TransferSide};

/// Attempts at generating a fresh nine-digit number before giving up.
const NUMBER_GENERATION_RETRIES: u32 = 8;

/// Executes transfers atomically against the ledger store.
///
/// The engine owns the only write path into account balances: it validates a
/// request, serializes it against conflicting transfers through the
/// [`AccountLockManager`], re-validates under the lock, and hands the store a
/// single all-or-nothing mutation. Reads for reporting bypass the engine
/// entirely (see `QueryService`).
pub struct TransferEngine {
    store: LedgerStoreRef,
    locks: AccountLockManager,
}

impl TransferEngine {
    pub fn new(store: LedgerStoreRef) -> Self {
        Self {
            store,
            locks: AccountLockManager::new(),
        }
    }

    pub fn store(&self) -> &LedgerStoreRef {
        &self.store
    }

    /// Opens an account with a zero-or-seeded opening balance.
    ///
    /// When no number is supplied a random nine-digit one is generated;
    /// collisions with existing numbers are retried a bounded number of
    /// times. A caller-supplied number that collides fails immediately.
    pub async fn open_account(
        &self,
        holder: AccountHolder,
        number: Option<AccountNumber>,
        opening_balance: Balance,
    ) -> Result<Account> {
        let id = AccountId::generate();

        if let Some(number) = number {
            let account = self
                .store
                .create_account(NewAccount {
                    id,
                    number,
                    holder,
                    opening_balance,
                })
                .await?;
            tracing::info!(account = %account.id, number = %account.number, "account opened");
            return Ok(account);
        }

        for _ in 0..NUMBER_GENERATION_RETRIES {
            let number = AccountNumber::generate(&mut rand::thread_rng());
            match self
                .store
                .create_account(NewAccount {
                    id,
                    number,
                    holder: holder.clone(),
                    opening_balance,
                })
                .await
            {
                Err(LedgerError::DuplicateIdentity {
                    field: IdentityField::AccountNumber,
                }) => {
                    tracing::debug!(%number, "account number collision, regenerating");
                    continue;
                }
                other => {
                    if let Ok(account) = &other {
                        tracing::info!(account = %account.id, number = %account.number, "account opened");
                    }
                    return other;
                }
            }
        }

        Err(LedgerError::DuplicateIdentity {
            field: IdentityField::AccountNumber,
        })
    }

    /// Transfers `amount` from `sender_id` to `receiver_id` and returns the
    /// committed log entry.
    ///
    /// Positivity of the amount is guaranteed by the `Amount` type; interface
    /// layers surface `InvalidAmount` before a request reaches the engine.
    /// The remaining validation order is fixed: self-transfer, account
    /// existence (naming the missing side), then sufficiency. The unlocked
    /// sufficiency pre-check is an optimization only; the decision that
    /// counts happens on balances re-read under the pair lock.
    pub async fn transfer(
        &self,
        sender_id: AccountId,
        receiver_id: AccountId,
        amount: Amount,
    ) -> Result<TransactionRecord> {
        if sender_id == receiver_id {
            return Err(LedgerError::SelfTransfer);
        }

        let sender = self.get_side(sender_id, TransferSide::Sender).await?;
        self.get_side(receiver_id, TransferSide::Receiver).await?;
        if !sender.balance.covers(amount) {
            return Err(LedgerError::InsufficientFunds {
                available: sender.balance.minor_units(),
                requested: amount.minor_units(),
            });
        }

        let _guard = self.locks.acquire_pair(sender_id, receiver_id).await;

        // The pre-check above ran unlocked; a concurrent transfer may have
        // drained the sender in the meantime. Decide on fresh state.
        let sender = self.get_side(sender_id, TransferSide::Sender).await?;
        if !sender.balance.covers(amount) {
            return Err(LedgerError::InsufficientFunds {
                available: sender.balance.minor_units(),
                requested: amount.minor_units(),
            });
        }

        let tx_id = TransactionId::generate();
        match self
            .store
            .apply_transfer(sender_id, receiver_id, amount, tx_id)
            .await
        {
            Ok(record) => {
                tracing::info!(
                    tx = %record.id,
                    seq = record.seq,
                    sender = %sender_id,
                    receiver = %receiver_id,
                    amount = %record.amount,
                    "transfer committed"
                );
                Ok(record)
            }
            Err(
                err @ (LedgerError::StorageFailure(_) | LedgerError::Io(_) | LedgerError::Json(_)),
            ) => {
                tracing::warn!(sender = %sender_id, receiver = %receiver_id, error = %err, "transfer aborted at commit");
                Err(LedgerError::TransferFailed(Box::new(err)))
            }
            Err(err) => Err(err),
        }
    }

    async fn get_side(&self, id: AccountId, side: TransferSide) -> Result<Account> {
        match self.store.get_account(id).await {
            Err(LedgerError::NotFound { id }) => Err(LedgerError::AccountNotFound { side, id }),
            other => other,
        }
    }
}
