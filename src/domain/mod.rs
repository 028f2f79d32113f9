//! Pure domain types and arithmetic for the position ledger.
//!
//! Everything here is data plus invariant-preserving math; persistence and
//! IO live behind the ports.

pub mod error;
pub mod ids;
pub mod money;
pub mod option;
pub mod outcome;
pub mod stats;
pub mod stock;
pub mod trade;

pub use error::DomainError;
pub use ids::{PositionId, RecordId, UserId};
pub use money::{Price, Quantity, SHARES_PER_CONTRACT};
pub use option::{ClosedOption, OptionKind, OptionPosition};
pub use outcome::CloseOutcome;
pub use stats::PortfolioStats;
pub use stock::{ClosedStock, StockLot};
pub use trade::{ImportedTrades, OptionTrade, StockTrade, TradeCode};
