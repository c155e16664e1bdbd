use crate::domain::account::AccountId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Which side of a transfer a missing account belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferSide {
    Sender,
    Receiver,
}

impl std::fmt::Display for TransferSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferSide::Sender => write!(f, "sender"),
            TransferSide::Receiver => write!(f, "receiver"),
        }
    }
}

/// The identity field that collided when opening an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityField {
    AccountNumber,
    Email,
    Phone,
}

impl std::fmt::Display for IdentityField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentityField::AccountNumber => write!(f, "account number"),
            IdentityField::Email => write!(f, "email"),
            IdentityField::Phone => write!(f, "phone number"),
        }
    }
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("amount must be positive with at most two decimal places")]
    InvalidAmount,
    #[error("sender and receiver must be different accounts")]
    SelfTransfer,
    #[error("account {id} not found")]
    NotFound { id: AccountId },
    #[error("{side} account {id} not found")]
    AccountNotFound { side: TransferSide, id: AccountId },
    #[error("insufficient funds: available {available} minor units, requested {requested}")]
    InsufficientFunds { available: i64, requested: i64 },
    #[error("an account with this {field} already exists")]
    DuplicateIdentity { field: IdentityField },
    #[error("balance arithmetic overflow")]
    BalanceOverflow,
    #[error("account number must have exactly nine digits")]
    InvalidAccountNumber,
    #[error("storage failure: {0}")]
    StorageFailure(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("transfer failed during commit: {0}")]
    TransferFailed(#[source] Box<LedgerError>),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("malformed command: {0}")]
    Json(#[from] serde_json::Error),
}

impl LedgerError {
    /// Wraps a backend error as an opaque storage failure.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        LedgerError::StorageFailure(Box::new(err))
    }

    /// Whether a caller may reasonably retry the same request.
    ///
    /// Validation failures are deterministic and will fail again; only
    /// storage-side failures are transient.
    pub fn retryable(&self) -> bool {
        match self {
            LedgerError::StorageFailure(_) | LedgerError::Io(_) => true,
            LedgerError::TransferFailed(cause) => cause.retryable(),
            _ => false,
        }
    }
}
