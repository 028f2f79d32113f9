//! Invariant violations raised by the lifecycle services.

use rust_decimal::Decimal;
use thiserror::Error;

use super::option::OptionKind;
use super::outcome::CloseOutcome;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Close request for more contracts than the position holds, or for a
    /// non-positive quantity.
    #[error("invalid quantity {requested} (available {available})")]
    InvalidQuantity {
        requested: Decimal,
        available: Decimal,
    },

    /// Quantity fields on manual entry must be strictly positive.
    #[error("quantity must be positive, got {0}")]
    NonPositiveQuantity(Decimal),

    /// Outcome does not apply to the position's kind, e.g. assignment of a
    /// long call.
    #[error("outcome '{outcome}' is not allowed for {kind} positions")]
    OutcomeNotAllowed {
        kind: OptionKind,
        outcome: CloseOutcome,
    },

    /// A plain close needs the closing price.
    #[error("sell price is required to close this position")]
    MissingSellPrice,

    /// A called-away close needs the price the shares were delivered at.
    #[error("share price is required for a called-away close")]
    MissingSharePrice,
}
