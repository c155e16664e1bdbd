//! Core ledger types and the storage port.

pub mod account;
pub mod ports;
pub mod transaction;
