use crate::error::{LedgerError, Result};
use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of decimal places carried by the minor-unit representation.
pub const MINOR_UNIT_SCALE: u32 = 2;

/// Opaque internal account key. Never shown to account holders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(Uuid);

impl AccountId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for AccountId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Externally visible nine-digit account number. Globally unique and
/// immutable once assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountNumber(u32);

impl AccountNumber {
    pub const MIN: u32 = 100_000_000;
    pub const MAX: u32 = 999_999_999;

    pub fn new(value: u32) -> Result<Self> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(LedgerError::InvalidAccountNumber)
        }
    }

    pub fn generate<R: Rng>(rng: &mut R) -> Self {
        Self(rng.gen_range(Self::MIN..=Self::MAX))
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A positive monetary amount in integer minor units (cents).
///
/// Non-positive values are unrepresentable, which makes the engine's
/// first validation rule a type-level guarantee. Decimal values are only
/// converted at the interface boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(i64);

impl Amount {
    pub fn from_minor_units(value: i64) -> Result<Self> {
        if value > 0 {
            Ok(Self(value))
        } else {
            Err(LedgerError::InvalidAmount)
        }
    }

    /// Converts a decimal value (e.g. `300.00`) to minor units.
    ///
    /// Fails with `InvalidAmount` when the value is not positive or carries
    /// more precision than the minor unit can hold.
    pub fn from_decimal(value: Decimal) -> Result<Self> {
        let scaled = value
            .checked_mul(Decimal::from(10i64.pow(MINOR_UNIT_SCALE)))
            .ok_or(LedgerError::InvalidAmount)?;
        if scaled.fract() != Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }
        let units = scaled.to_i64().ok_or(LedgerError::InvalidAmount)?;
        Self::from_minor_units(units)
    }

    pub fn minor_units(&self) -> i64 {
        self.0
    }

    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, MINOR_UNIT_SCALE)
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.to_decimal().fmt(f)
    }
}

/// A non-negative account balance in integer minor units.
///
/// All arithmetic is checked: a debit below zero is `InsufficientFunds`,
/// a credit past `i64::MAX` is `BalanceOverflow`. Committed states can
/// therefore never hold a negative balance.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Balance(i64);

impl Balance {
    pub const ZERO: Self = Self(0);

    pub fn from_minor_units(value: i64) -> Result<Self> {
        if value >= 0 {
            Ok(Self(value))
        } else {
            Err(LedgerError::InvalidAmount)
        }
    }

    pub fn from_decimal(value: Decimal) -> Result<Self> {
        if value == Decimal::ZERO {
            return Ok(Self::ZERO);
        }
        Amount::from_decimal(value).map(|a| Self(a.minor_units()))
    }

    pub fn minor_units(&self) -> i64 {
        self.0
    }

    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, MINOR_UNIT_SCALE)
    }

    pub fn covers(&self, amount: Amount) -> bool {
        self.0 >= amount.minor_units()
    }

    pub fn credit(self, amount: Amount) -> Result<Self> {
        self.0
            .checked_add(amount.minor_units())
            .map(Self)
            .ok_or(LedgerError::BalanceOverflow)
    }

    pub fn debit(self, amount: Amount) -> Result<Self> {
        if self.covers(amount) {
            Ok(Self(self.0 - amount.minor_units()))
        } else {
            Err(LedgerError::InsufficientFunds {
                available: self.0,
                requested: amount.minor_units(),
            })
        }
    }
}

impl std::fmt::Display for Balance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.to_decimal().fmt(f)
    }
}

/// Identity fields of the person holding an account. Email and phone
/// number participate in duplicate detection at account opening.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountHolder {
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub email: String,
}

/// A ledger account.
///
/// `balance` is a cached projection of the transaction log relative to
/// `opening_balance`; the log remains the source of truth. `version`
/// increments on every balance mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub number: AccountNumber,
    pub holder: AccountHolder,
    pub balance: Balance,
    pub opening_balance: Balance,
    pub version: u64,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Debits the balance and bumps the version. Fails with
    /// `InsufficientFunds` without mutating on a short balance.
    pub fn apply_debit(&mut self, amount: Amount) -> Result<()> {
        self.balance = self.balance.debit(amount)?;
        self.version += 1;
        Ok(())
    }

    /// Credits the balance and bumps the version.
    pub fn apply_credit(&mut self, amount: Amount) -> Result<()> {
        self.balance = self.balance.credit(amount)?;
        self.version += 1;
        Ok(())
    }
}

/// The fields required to create an account row. Ids and numbers are
/// generated by the transfer engine, not by the store.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub id: AccountId,
    pub number: AccountNumber,
    pub holder: AccountHolder,
    pub opening_balance: Balance,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn holder() -> AccountHolder {
        AccountHolder {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            phone_number: "555-0100".into(),
            email: "ada@example.com".into(),
        }
    }

    #[test]
    fn test_amount_from_decimal() {
        assert_eq!(
            Amount::from_decimal(dec!(300.00)).unwrap().minor_units(),
            30_000
        );
        assert_eq!(Amount::from_decimal(dec!(0.01)).unwrap().minor_units(), 1);
        assert!(matches!(
            Amount::from_decimal(dec!(0.0)),
            Err(LedgerError::InvalidAmount)
        ));
        assert!(matches!(
            Amount::from_decimal(dec!(-5.00)),
            Err(LedgerError::InvalidAmount)
        ));
        // Sub-cent precision is rejected, not silently rounded.
        assert!(matches!(
            Amount::from_decimal(dec!(1.005)),
            Err(LedgerError::InvalidAmount)
        ));
    }

    #[test]
    fn test_amount_renders_as_decimal() {
        let amount = Amount::from_minor_units(30_000).unwrap();
        assert_eq!(amount.to_decimal(), dec!(300.00));
        assert_eq!(amount.to_string(), "300.00");
    }

    #[test]
    fn test_balance_debit_and_credit() {
        let balance = Balance::from_minor_units(100_000).unwrap();
        let amount = Amount::from_minor_units(30_000).unwrap();

        let after = balance.debit(amount).unwrap();
        assert_eq!(after.minor_units(), 70_000);

        let after = after.credit(amount).unwrap();
        assert_eq!(after.minor_units(), 100_000);
    }

    #[test]
    fn test_balance_debit_insufficient() {
        let balance = Balance::from_minor_units(100).unwrap();
        let amount = Amount::from_minor_units(200).unwrap();
        assert!(matches!(
            balance.debit(amount),
            Err(LedgerError::InsufficientFunds {
                available: 100,
                requested: 200
            })
        ));
    }

    #[test]
    fn test_balance_credit_overflow() {
        let balance = Balance::from_minor_units(i64::MAX).unwrap();
        let amount = Amount::from_minor_units(1).unwrap();
        assert!(matches!(
            balance.credit(amount),
            Err(LedgerError::BalanceOverflow)
        ));
    }

    #[test]
    fn test_account_number_bounds() {
        assert!(AccountNumber::new(100_000_000).is_ok());
        assert!(AccountNumber::new(999_999_999).is_ok());
        assert!(matches!(
            AccountNumber::new(99_999_999),
            Err(LedgerError::InvalidAccountNumber)
        ));
        assert!(matches!(
            AccountNumber::new(1_000_000_000),
            Err(LedgerError::InvalidAccountNumber)
        ));
    }

    #[test]
    fn test_account_number_generation_in_range() {
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            let number = AccountNumber::generate(&mut rng);
            assert!((AccountNumber::MIN..=AccountNumber::MAX).contains(&number.value()));
        }
    }

    #[test]
    fn test_account_mutation_bumps_version() {
        let mut account = Account {
            id: AccountId::generate(),
            number: AccountNumber::new(123_456_789).unwrap(),
            holder: holder(),
            balance: Balance::from_minor_units(10_000).unwrap(),
            opening_balance: Balance::from_minor_units(10_000).unwrap(),
            version: 0,
            created_at: Utc::now(),
        };

        let amount = Amount::from_minor_units(2_500).unwrap();
        account.apply_debit(amount).unwrap();
        assert_eq!(account.version, 1);
        account.apply_credit(amount).unwrap();
        assert_eq!(account.version, 2);
        assert_eq!(account.balance.minor_units(), 10_000);
    }

    #[test]
    fn test_failed_debit_leaves_account_untouched() {
        let mut account = Account {
            id: AccountId::generate(),
            number: AccountNumber::new(123_456_789).unwrap(),
            holder: holder(),
            balance: Balance::from_minor_units(100).unwrap(),
            opening_balance: Balance::ZERO,
            version: 3,
            created_at: Utc::now(),
        };

        let amount = Amount::from_minor_units(500).unwrap();
        assert!(account.apply_debit(amount).is_err());
        assert_eq!(account.balance.minor_units(), 100);
        assert_eq!(account.version, 3);
    }
}
