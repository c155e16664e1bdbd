//! Application layer: the transfer engine, the per-account lock manager it
//! serializes through, and the read-only query service.

pub mod engine;
pub mod locking;
pub mod query;
