//! Lifecycle services built on the ledger store port.

pub mod editor;
pub mod importer;
pub mod locks;
pub mod merger;
pub mod opener;
pub mod resolver;
pub mod statistics;

pub use editor::{
    ClosedOptionEdit, ClosedStockEdit, LedgerEditor, ListFilter, OptionPositionEdit, StockLotEdit,
};
pub use importer::{ImportReconciler, ImportSummary};
pub use locks::MutationLocks;
pub use merger::{LotMerger, SellOutcome};
pub use opener::{OpenRequest, OptionOpener};
pub use resolver::{CloseRequest, CloseResolver, OptionCloseResult, StockEffect};
pub use statistics::StatsService;
