//! Stock lots and closed-stock history records.
//!
//! Each owner holds at most one blended lot per ticker. Buys fold into the
//! lot at a weighted-average cost basis; sells realize P/L against that
//! basis without touching it.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ids::{RecordId, UserId};
use super::money::{Price, Quantity};

/// One blended open lot of shares. Keyed by `(owner, ticker)` in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockLot {
    pub owner: UserId,
    pub ticker: String,
    pub quantity: Quantity,
    pub cost_basis: Price,
    pub open_date: NaiveDate,
}

impl StockLot {
    #[must_use]
    pub fn open(
        owner: UserId,
        ticker: impl Into<String>,
        quantity: Quantity,
        cost_basis: Price,
        open_date: NaiveDate,
    ) -> Self {
        Self {
            owner,
            ticker: ticker.into(),
            quantity,
            cost_basis,
            open_date,
        }
    }

    /// Folds a buy into the lot: quantity adds, cost basis becomes the
    /// weighted average of old and new shares. The original open date is
    /// kept.
    pub fn apply_buy(&mut self, quantity: Quantity, price: Price) {
        let total = self.quantity + quantity;
        if total.is_zero() {
            return;
        }
        self.cost_basis = (self.cost_basis * self.quantity + price * quantity) / total;
        self.quantity = total;
    }

    /// Market value of the lot at its cost basis.
    #[must_use]
    pub fn book_value(&self) -> Decimal {
        self.cost_basis * self.quantity
    }
}

/// A realized stock sale. Sales of the same lot on different days blend into
/// one row per `(owner, ticker, open_date)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedStock {
    pub id: Option<RecordId>,
    pub owner: UserId,
    pub ticker: String,
    pub open_date: NaiveDate,
    pub close_date: NaiveDate,
    pub quantity: Quantity,
    pub cost_basis: Price,
    pub sell_price: Price,
    pub profit_loss: Decimal,
}

impl ClosedStock {
    /// Records a sale of `quantity` shares out of `lot` at `sell_price`.
    #[must_use]
    pub fn from_sale(
        lot: &StockLot,
        quantity: Quantity,
        sell_price: Price,
        close_date: NaiveDate,
    ) -> Self {
        Self {
            id: None,
            owner: lot.owner,
            ticker: lot.ticker.clone(),
            open_date: lot.open_date,
            close_date,
            quantity,
            cost_basis: lot.cost_basis,
            sell_price,
            profit_loss: (sell_price - lot.cost_basis) * quantity,
        }
    }

    /// Blends another sale of the same lot into this record: quantities sum,
    /// cost basis and sell price become weighted averages, P/L sums, and the
    /// close date moves to the newer sale.
    pub fn blend(&mut self, other: &ClosedStock) {
        let total = self.quantity + other.quantity;
        if total.is_zero() {
            return;
        }
        self.cost_basis =
            (self.cost_basis * self.quantity + other.cost_basis * other.quantity) / total;
        self.sell_price =
            (self.sell_price * self.quantity + other.sell_price * other.quantity) / total;
        self.quantity = total;
        self.profit_loss += other.profit_loss;
        self.close_date = other.close_date;
    }

    /// Return on the per-share cost basis. Zero when the basis is zero.
    #[must_use]
    pub fn ror(&self) -> Decimal {
        if self.cost_basis.is_zero() {
            return Decimal::ZERO;
        }
        self.profit_loss / self.cost_basis
    }

    /// P/L as a percentage of the total capital in the sale.
    #[must_use]
    pub fn pl_percent(&self) -> Decimal {
        let deployed = self.cost_basis * self.quantity;
        if deployed.is_zero() {
            return Decimal::ZERO;
        }
        self.profit_loss / deployed * Decimal::ONE_HUNDRED
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn lot(qty: Decimal, cb: Decimal) -> StockLot {
        StockLot::open(UserId::new(1), "AAPL", qty, cb, date("2024-01-02"))
    }

    #[test]
    fn buy_blends_cost_basis() {
        let mut lot = lot(dec!(100), dec!(150));
        lot.apply_buy(dec!(100), dec!(170));
        assert_eq!(lot.quantity, dec!(200));
        assert_eq!(lot.cost_basis, dec!(160));
    }

    #[test]
    fn buy_keeps_open_date() {
        let mut lot = lot(dec!(10), dec!(50));
        lot.apply_buy(dec!(5), dec!(80));
        assert_eq!(lot.open_date, date("2024-01-02"));
    }

    #[test]
    fn sale_realizes_pl_against_basis() {
        let lot = lot(dec!(200), dec!(160));
        let closed = ClosedStock::from_sale(&lot, dec!(150), dec!(180), date("2024-03-01"));
        assert_eq!(closed.profit_loss, dec!(3000));
        assert_eq!(closed.cost_basis, dec!(160));
        assert_eq!(closed.open_date, date("2024-01-02"));
    }

    #[test]
    fn blend_weighted_averages_prices_and_sums_pl() {
        let lot = lot(dec!(300), dec!(100));
        let mut first = ClosedStock::from_sale(&lot, dec!(100), dec!(110), date("2024-02-01"));
        let second = ClosedStock::from_sale(&lot, dec!(100), dec!(130), date("2024-02-15"));
        first.blend(&second);
        assert_eq!(first.quantity, dec!(200));
        assert_eq!(first.sell_price, dec!(120));
        assert_eq!(first.profit_loss, dec!(4000));
        assert_eq!(first.close_date, date("2024-02-15"));
    }

    #[test]
    fn pl_percent_over_deployed_capital() {
        let lot = lot(dec!(100), dec!(50));
        let closed = ClosedStock::from_sale(&lot, dec!(100), dec!(55), date("2024-02-01"));
        assert_eq!(closed.pl_percent(), dec!(10));
    }

    #[test]
    fn zero_basis_yields_zero_ratios() {
        let lot = lot(dec!(100), dec!(0));
        let closed = ClosedStock::from_sale(&lot, dec!(100), dec!(5), date("2024-02-01"));
        assert_eq!(closed.ror(), Decimal::ZERO);
        assert_eq!(closed.pl_percent(), Decimal::ZERO);
    }
}
