//! Wheelhouse - stock and option position lifecycle ledger.
//!
//! Tracks a portfolio the way wheel-strategy traders think about it: one
//! blended stock lot per ticker, individually tracked option positions,
//! and an append-style history of realized closes.
//!
//! # Architecture
//!
//! The crate uses a hexagonal layout:
//!
//! - [`domain`] - Plain types: lots, option positions, closed records,
//!   trade codes, portfolio statistics
//! - [`port`] - Trait seams, notably the [`port::outbound::LedgerStore`]
//!   persistence port
//! - [`service`] - Lifecycle logic: lot merging, option opening and
//!   closing, CSV import reconciliation, statistics
//! - [`adapter`] - SQLite and in-memory store implementations plus the
//!   clap-based CLI
//! - [`config`] - TOML configuration loading
//! - [`error`] - Error types for the crate

pub mod adapter;
pub mod config;
pub mod domain;
pub mod error;
pub mod port;
pub mod service;
