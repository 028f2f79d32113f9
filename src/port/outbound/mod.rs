pub mod store;

pub use store::LedgerStore;
