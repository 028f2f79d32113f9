//! Aggregated portfolio statistics, read-side only.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioStats {
    pub stock_count: usize,
    pub option_count: usize,
    pub closed_count: usize,
    pub total_pl: Decimal,
    pub total_gains: Decimal,
    /// Sum of losing P/L, kept negative.
    pub total_losses: Decimal,
    pub win_count: usize,
    pub loss_count: usize,
}

impl PortfolioStats {
    #[must_use]
    pub fn total_positions(&self) -> usize {
        self.stock_count + self.option_count
    }

    /// Percentage of decided trades that won. Break-even closes do not
    /// count either way. Zero when nothing has been decided.
    #[must_use]
    pub fn win_rate(&self) -> Decimal {
        let decided = self.win_count + self.loss_count;
        if decided == 0 {
            return Decimal::ZERO;
        }
        Decimal::from(self.win_count) / Decimal::from(decided) * Decimal::ONE_HUNDRED
    }

    /// Gross gains over gross losses. Zero when there are no losses.
    #[must_use]
    pub fn profit_factor(&self) -> Decimal {
        if self.total_losses.is_zero() {
            return Decimal::ZERO;
        }
        self.total_gains / -self.total_losses
    }
}
