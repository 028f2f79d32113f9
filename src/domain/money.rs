//! Monetary aliases shared across the ledger.

use rust_decimal::Decimal;

/// Per-share or per-contract price.
pub type Price = Decimal;

/// Share or contract count. Fractional shares are allowed.
pub type Quantity = Decimal;

/// Shares delivered per option contract.
pub const SHARES_PER_CONTRACT: Decimal = Decimal::ONE_HUNDRED;
