//! Per-key mutation locks.
//!
//! Every read-modify-write on a lot or position takes the key's lock for
//! its whole duration, so concurrent mutations of the same key serialize
//! while unrelated keys proceed in parallel. Services that touch both an
//! option position and a stock lot always lock the option first.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::domain::{PositionId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum LockKey {
    Stock(UserId, String),
    Option(UserId, PositionId),
}

/// Registry of keyed mutation locks. Lock handles are created on first use
/// and shared by all holders of the same key.
#[derive(Debug, Default)]
pub struct MutationLocks {
    locks: DashMap<LockKey, Arc<Mutex<()>>>,
}

impl MutationLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock handle for an owner's lot in one ticker.
    pub fn stock(&self, owner: UserId, ticker: &str) -> Arc<Mutex<()>> {
        self.handle(LockKey::Stock(owner, ticker.to_string()))
    }

    /// Lock handle for one option position.
    pub fn option(&self, owner: UserId, id: PositionId) -> Arc<Mutex<()>> {
        self.handle(LockKey::Option(owner, id))
    }

    fn handle(&self, key: LockKey) -> Arc<Mutex<()>> {
        self.locks
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
