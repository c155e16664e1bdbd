//! A small ledger engine: account balances plus a durable, ordered,
//! append-only transaction log, safe under concurrent transfer requests.
//!
//! The write path runs through [`application::engine::TransferEngine`],
//! which serializes conflicting transfers per account pair and commits each
//! transfer as one atomic store mutation. Reads go through
//! [`application::query::QueryService`] against store snapshots. Storage
//! backends implement [`domain::ports::LedgerStore`]; an in-memory backend
//! is always available and a RocksDB backend sits behind the
//! `storage-rocksdb` feature.

pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod interfaces;
