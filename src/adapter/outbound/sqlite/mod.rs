//! SQLite persistence adapters.
//!
//! Provides the SQLite-backed ledger store and its database plumbing using
//! Diesel ORM.

pub mod database;
pub mod store;

pub use store::SqliteLedgerStore;
