use super::account::{AccountId, Amount};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique transaction log entry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(Uuid);

impl TransactionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Failed transfers never reach the log, so the only recorded status is
/// `Committed`. The variant exists so readers of serialized records see an
/// explicit status rather than inferring one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Committed,
}

/// An immutable entry in the append-only transfer log.
///
/// `seq` is the store-assigned commit sequence: strictly increasing across
/// the whole ledger, so newest-first ordering is total even when wall-clock
/// timestamps collide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: TransactionId,
    pub seq: u64,
    pub sender_id: AccountId,
    pub receiver_id: AccountId,
    pub amount: Amount,
    pub created_at: DateTime<Utc>,
    pub status: TransactionStatus,
}
