use crate::domain::account::{Account, AccountId, Amount, NewAccount};
use crate::domain::ports::LedgerStore;
use crate::domain::transaction::{TransactionId, TransactionRecord, TransactionStatus};
use crate::error::{IdentityField, LedgerError, Result, TransferSide};
use async_trait::async_trait;
use chrono::Utc;
use rocksdb::{ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

/// Column family for account rows, keyed by internal id.
pub const CF_ACCOUNTS: &str = "accounts";
/// Column family mapping identity keys (number, email, phone) to account ids.
pub const CF_ACCOUNT_INDEX: &str = "account_index";
/// Column family for the transaction log, keyed by big-endian commit sequence.
pub const CF_TRANSACTIONS: &str = "transactions";

/// Persistent ledger store on RocksDB.
///
/// A transfer commits as a single `WriteBatch` spanning both account rows
/// and the log entry, which is the atomic multi-key write the ledger
/// requires: either the whole batch lands or none of it does. Writers
/// additionally serialize through an internal mutex so check-then-write
/// sections (identity uniqueness, balance staging) stay consistent; readers
/// go straight to the database.
#[derive(Clone)]
pub struct RocksDbLedger {
    db: Arc<DB>,
    next_seq: Arc<AtomicU64>,
    write_lock: Arc<Mutex<()>>,
}

fn number_key(number: u32) -> Vec<u8> {
    let mut key = b"num:".to_vec();
    key.extend_from_slice(&number.to_be_bytes());
    key
}

fn email_key(email: &str) -> Vec<u8> {
    [b"email:", email.as_bytes()].concat()
}

fn phone_key(phone: &str) -> Vec<u8> {
    [b"phone:", phone.as_bytes()].concat()
}

impl RocksDbLedger {
    /// Opens or creates the database at `path`, ensuring all column
    /// families exist and recovering the next commit sequence from the
    /// newest log entry.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cfs = vec![
            ColumnFamilyDescriptor::new(CF_ACCOUNTS, Options::default()),
            ColumnFamilyDescriptor::new(CF_ACCOUNT_INDEX, Options::default()),
            ColumnFamilyDescriptor::new(CF_TRANSACTIONS, Options::default()),
        ];
        let db = DB::open_cf_descriptors(&opts, path, cfs).map_err(LedgerError::storage)?;

        let next_seq = {
            let cf = db
                .cf_handle(CF_TRANSACTIONS)
                .ok_or_else(|| LedgerError::storage(std::io::Error::other("missing cf")))?;
            match db.iterator_cf(cf, IteratorMode::End).next() {
                Some(Ok((key, _))) => {
                    let bytes: [u8; 8] = key
                        .as_ref()
                        .try_into()
                        .map_err(|_| LedgerError::storage(std::io::Error::other("bad seq key")))?;
                    u64::from_be_bytes(bytes) + 1
                }
                Some(Err(e)) => return Err(LedgerError::storage(e)),
                None => 0,
            }
        };

        Ok(Self {
            db: Arc::new(db),
            next_seq: Arc::new(AtomicU64::new(next_seq)),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            LedgerError::storage(std::io::Error::other(format!(
                "column family {name} not found"
            )))
        })
    }

    fn load_account(&self, id: AccountId) -> Result<Option<Account>> {
        let cf = self.cf(CF_ACCOUNTS)?;
        let bytes = self
            .db
            .get_cf(cf, id.as_uuid().as_bytes())
            .map_err(LedgerError::storage)?;
        match bytes {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn index_occupied(&self, key: &[u8]) -> Result<bool> {
        let cf = self.cf(CF_ACCOUNT_INDEX)?;
        Ok(self
            .db
            .get_pinned_cf(cf, key)
            .map_err(LedgerError::storage)?
            .is_some())
    }
}

#[async_trait]
impl LedgerStore for RocksDbLedger {
    async fn create_account(&self, new: NewAccount) -> Result<Account> {
        let _write = self.write_lock.lock().await;

        if self.index_occupied(&number_key(new.number.value()))? {
            return Err(LedgerError::DuplicateIdentity {
                field: IdentityField::AccountNumber,
            });
        }
        if self.index_occupied(&email_key(&new.holder.email))? {
            return Err(LedgerError::DuplicateIdentity {
                field: IdentityField::Email,
            });
        }
        if self.index_occupied(&phone_key(&new.holder.phone_number))? {
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

        let accounts_cf = self.cf(CF_ACCOUNTS)?;
        let index_cf = self.cf(CF_ACCOUNT_INDEX)?;
        let id_bytes = account.id.as_uuid().into_bytes();

        let mut batch = WriteBatch::default();
        batch.put_cf(accounts_cf, id_bytes, serde_json::to_vec(&account)?);
        batch.put_cf(index_cf, number_key(account.number.value()), id_bytes);
        batch.put_cf(index_cf, email_key(&account.holder.email), id_bytes);
        batch.put_cf(index_cf, phone_key(&account.holder.phone_number), id_bytes);
        self.db.write(batch).map_err(LedgerError::storage)?;

        Ok(account)
    }

    async fn get_account(&self, id: AccountId) -> Result<Account> {
        self.load_account(id)?.ok_or(LedgerError::NotFound { id })
    }

    async fn apply_transfer(
        &self,
        sender_id: AccountId,
        receiver_id: AccountId,
        amount: Amount,
        tx_id: TransactionId,
    ) -> Result<TransactionRecord> {
        let _write = self.write_lock.lock().await;

        let mut sender = self
            .load_account(sender_id)?
            .ok_or(LedgerError::AccountNotFound {
                side: TransferSide::Sender,
                id: sender_id,
            })?;
        let mut receiver = self
            .load_account(receiver_id)?
            .ok_or(LedgerError::AccountNotFound {
                side: TransferSide::Receiver,
                id: receiver_id,
            })?;

        sender.apply_debit(amount)?;
        receiver.apply_credit(amount)?;

        let record = TransactionRecord {
            id: tx_id,
            seq: self.next_seq.load(Ordering::Acquire),
            sender_id,
            receiver_id,
            amount,
            created_at: Utc::now(),
            status: TransactionStatus::Committed,
        };

        let accounts_cf = self.cf(CF_ACCOUNTS)?;
        let transactions_cf = self.cf(CF_TRANSACTIONS)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(
            accounts_cf,
            sender.id.as_uuid().into_bytes(),
            serde_json::to_vec(&sender)?,
        );
        batch.put_cf(
            accounts_cf,
            receiver.id.as_uuid().into_bytes(),
            serde_json::to_vec(&receiver)?,
        );
        batch.put_cf(
            transactions_cf,
            record.seq.to_be_bytes(),
            serde_json::to_vec(&record)?,
        );
        self.db.write(batch).map_err(LedgerError::storage)?;

        // Only advance the sequence once the batch is durable.
        self.next_seq.store(record.seq + 1, Ordering::Release);

        Ok(record)
    }

    async fn list_accounts(&self) -> Result<Vec<Account>> {
        let cf = self.cf(CF_ACCOUNTS)?;
        let mut accounts = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item.map_err(LedgerError::storage)?;
            accounts.push(serde_json::from_slice(&value)?);
        }
        Ok(accounts)
    }

    async fn list_transactions(&self) -> Result<Vec<TransactionRecord>> {
        let cf = self.cf(CF_TRANSACTIONS)?;
        let mut log = Vec::new();
        // Keys are big-endian sequence numbers; End-to-Start is newest first.
        for item in self.db.iterator_cf(cf, IteratorMode::End) {
            let (_key, value) = item.map_err(LedgerError::storage)?;
            log.push(serde_json::from_slice(&value)?);
        }
        Ok(log)
    }
}
