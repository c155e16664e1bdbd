use crate::domain::account::{AccountHolder, AccountId, AccountNumber, Amount, Balance};
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Deserialize;

/// Payload for opening an account.
///
/// `account_number` and `opening_balance` are optional: collaborators that
/// seed ledgers (test fixtures, data importers) may pin both, ordinary
/// account opening leaves them out and gets a generated number and a zero
/// balance.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAccountRequest {
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub email: String,
    #[serde(default)]
    pub account_number: Option<u32>,
    #[serde(default)]
    pub opening_balance: Option<Decimal>,
}

impl OpenAccountRequest {
    pub fn holder(&self) -> AccountHolder {
        AccountHolder {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            phone_number: self.phone_number.clone(),
            email: self.email.clone(),
        }
    }

    pub fn account_number(&self) -> Result<Option<AccountNumber>> {
        self.account_number.map(AccountNumber::new).transpose()
    }

    pub fn opening_balance(&self) -> Result<Balance> {
        match self.opening_balance {
            Some(value) => Balance::from_decimal(value),
            None => Ok(Balance::ZERO),
        }
    }
}

/// Payload for a transfer between two accounts, addressed by internal id.
///
/// The amount arrives as a decimal value; converting it to minor units is
/// the `InvalidAmount` gate, so a non-positive or over-precise amount never
/// reaches the engine.
#[derive(Debug, Clone, Deserialize)]
pub struct TransferRequest {
    pub sender_id: AccountId,
    pub receiver_id: AccountId,
    pub amount: Decimal,
}

impl TransferRequest {
    pub fn amount(&self) -> Result<Amount> {
        Amount::from_decimal(self.amount)
    }
}
