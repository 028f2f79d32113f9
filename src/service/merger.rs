//! Lot merger: folds buys into blended lots and realizes sells against
//! them.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};

use crate::domain::{ClosedStock, DomainError, StockLot, UserId};
use crate::error::{Error, Result};
use crate::port::outbound::LedgerStore;
use crate::service::locks::MutationLocks;

/// Result of a sell: the recorded slice, what is left in the lot, and
/// whether the request was clamped to the available quantity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SellOutcome {
    pub closed: ClosedStock,
    pub remaining: Decimal,
    pub clamped: bool,
}

/// Maintains the one-blended-lot-per-ticker invariant.
pub struct LotMerger<S> {
    store: Arc<S>,
    locks: Arc<MutationLocks>,
}

impl<S> Clone for LotMerger<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            locks: Arc::clone(&self.locks),
        }
    }
}

impl<S: LedgerStore> LotMerger<S> {
    pub fn new(store: Arc<S>, locks: Arc<MutationLocks>) -> Self {
        Self { store, locks }
    }

    /// Buy shares: folds into the existing lot at a weighted-average cost
    /// basis, or opens a new lot dated `date`. Returns the resulting lot.
    pub async fn merge_buy(
        &self,
        owner: UserId,
        ticker: &str,
        quantity: Decimal,
        price: Decimal,
        date: NaiveDate,
    ) -> Result<StockLot> {
        if quantity <= Decimal::ZERO {
            return Err(DomainError::NonPositiveQuantity(quantity).into());
        }

        let lock = self.locks.stock(owner, ticker);
        let _guard = lock.lock().await;

        let lot = match self.store.stock_lot(owner, ticker).await? {
            Some(mut lot) => {
                lot.apply_buy(quantity, price);
                debug!(%owner, ticker, %quantity, %price, cost_basis = %lot.cost_basis, "merged buy into lot");
                lot
            }
            None => {
                debug!(%owner, ticker, %quantity, %price, "opened new lot");
                StockLot::open(owner, ticker, quantity, price, date)
            }
        };
        self.store.upsert_stock_lot(&lot).await?;
        Ok(lot)
    }

    /// Sell shares against the lot. A missing quantity sells the whole
    /// lot; a non-positive one is rejected; an over-sized one is clamped
    /// to what is held. The sale blends into the history row sharing the
    /// lot's open date, and the lot shrinks or disappears. Cost basis
    /// never changes on a sell.
    pub async fn merge_sell(
        &self,
        owner: UserId,
        ticker: &str,
        quantity: Option<Decimal>,
        sell_price: Decimal,
        close_date: NaiveDate,
    ) -> Result<SellOutcome> {
        if let Some(q) = quantity {
            if q <= Decimal::ZERO {
                return Err(DomainError::NonPositiveQuantity(q).into());
            }
        }

        let lock = self.locks.stock(owner, ticker);
        let _guard = lock.lock().await;

        let lot = self
            .store
            .stock_lot(owner, ticker)
            .await?
            .ok_or_else(|| Error::not_found(format!("no open lot for {ticker}")))?;

        let clamped = matches!(quantity, Some(q) if q > lot.quantity);
        let to_sell = quantity.map_or(lot.quantity, |q| q.min(lot.quantity));

        let outcome = self
            .record_sale(&lot, to_sell, sell_price, close_date, clamped)
            .await?;
        info!(%owner, ticker, quantity = %to_sell, %sell_price, pl = %outcome.closed.profit_loss, clamped, "sold shares");
        Ok(outcome)
    }

    /// Records a sale slice and shrinks the lot. Callers must hold the
    /// ticker's stock lock.
    pub(crate) async fn record_sale(
        &self,
        lot: &StockLot,
        quantity: Decimal,
        sell_price: Decimal,
        close_date: NaiveDate,
        clamped: bool,
    ) -> Result<SellOutcome> {
        let slice = ClosedStock::from_sale(lot, quantity, sell_price, close_date);

        match self
            .store
            .find_closed_stock(lot.owner, &lot.ticker, lot.open_date)
            .await?
        {
            Some(mut existing) => {
                existing.blend(&slice);
                self.store.update_closed_stock(&existing).await?;
            }
            None => {
                self.store.insert_closed_stock(&slice).await?;
            }
        }

        let remaining = lot.quantity - quantity;
        if remaining > Decimal::ZERO {
            let mut shrunk = lot.clone();
            shrunk.quantity = remaining;
            self.store.upsert_stock_lot(&shrunk).await?;
        } else {
            self.store.delete_stock_lot(lot.owner, &lot.ticker).await?;
        }

        Ok(SellOutcome {
            closed: slice,
            remaining: remaining.max(Decimal::ZERO),
            clamped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::memory::MemoryLedgerStore;
    use rust_decimal_macros::dec;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn owner() -> UserId {
        UserId::new(1)
    }

    fn merger() -> LotMerger<MemoryLedgerStore> {
        LotMerger::new(
            Arc::new(MemoryLedgerStore::new()),
            Arc::new(MutationLocks::new()),
        )
    }

    #[tokio::test]
    async fn buys_blend_into_one_lot() {
        let merger = merger();
        merger
            .merge_buy(owner(), "AAPL", dec!(100), dec!(150), date("2024-01-02"))
            .await
            .unwrap();
        let lot = merger
            .merge_buy(owner(), "AAPL", dec!(100), dec!(170), date("2024-02-01"))
            .await
            .unwrap();

        assert_eq!(lot.quantity, dec!(200));
        assert_eq!(lot.cost_basis, dec!(160));
        assert_eq!(lot.open_date, date("2024-01-02"));
    }

    #[tokio::test]
    async fn buy_rejects_non_positive_quantity() {
        let merger = merger();
        let err = merger
            .merge_buy(owner(), "AAPL", dec!(0), dec!(150), date("2024-01-02"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Domain(DomainError::NonPositiveQuantity(_))
        ));
    }

    #[tokio::test]
    async fn partial_sell_keeps_cost_basis() {
        let merger = merger();
        merger
            .merge_buy(owner(), "AAPL", dec!(100), dec!(150), date("2024-01-02"))
            .await
            .unwrap();
        merger
            .merge_buy(owner(), "AAPL", dec!(100), dec!(170), date("2024-02-01"))
            .await
            .unwrap();

        let outcome = merger
            .merge_sell(owner(), "AAPL", Some(dec!(150)), dec!(180), date("2024-03-01"))
            .await
            .unwrap();

        assert_eq!(outcome.closed.profit_loss, dec!(3000));
        assert_eq!(outcome.remaining, dec!(50));
        assert!(!outcome.clamped);

        let lot = merger
            .store
            .stock_lot(owner(), "AAPL")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(lot.quantity, dec!(50));
        assert_eq!(lot.cost_basis, dec!(160));
    }

    #[tokio::test]
    async fn full_sell_deletes_lot() {
        let merger = merger();
        merger
            .merge_buy(owner(), "AAPL", dec!(100), dec!(150), date("2024-01-02"))
            .await
            .unwrap();

        let outcome = merger
            .merge_sell(owner(), "AAPL", None, dec!(160), date("2024-03-01"))
            .await
            .unwrap();

        assert_eq!(outcome.closed.quantity, dec!(100));
        assert_eq!(outcome.remaining, dec!(0));
        assert!(merger
            .store
            .stock_lot(owner(), "AAPL")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn sell_rejects_explicit_non_positive_quantity() {
        let merger = merger();
        merger
            .merge_buy(owner(), "AAPL", dec!(100), dec!(150), date("2024-01-02"))
            .await
            .unwrap();

        for quantity in [dec!(0), dec!(-5)] {
            let err = merger
                .merge_sell(owner(), "AAPL", Some(quantity), dec!(160), date("2024-03-01"))
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                Error::Domain(DomainError::NonPositiveQuantity(_))
            ));
        }

        // the lot is untouched; only an absent quantity means "sell all"
        let lot = merger
            .store
            .stock_lot(owner(), "AAPL")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(lot.quantity, dec!(100));
        assert!(merger
            .store
            .list_closed_stocks(owner())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn oversized_sell_clamps_to_available() {
        let merger = merger();
        merger
            .merge_buy(owner(), "AAPL", dec!(100), dec!(150), date("2024-01-02"))
            .await
            .unwrap();

        let outcome = merger
            .merge_sell(owner(), "AAPL", Some(dec!(250)), dec!(160), date("2024-03-01"))
            .await
            .unwrap();

        assert!(outcome.clamped);
        assert_eq!(outcome.closed.quantity, dec!(100));
        assert_eq!(outcome.remaining, dec!(0));
    }

    #[tokio::test]
    async fn sell_without_lot_is_not_found() {
        let merger = merger();
        let err = merger
            .merge_sell(owner(), "AAPL", Some(dec!(10)), dec!(160), date("2024-03-01"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn sales_of_same_lot_blend_in_history() {
        let merger = merger();
        merger
            .merge_buy(owner(), "AAPL", dec!(300), dec!(100), date("2024-01-02"))
            .await
            .unwrap();

        merger
            .merge_sell(owner(), "AAPL", Some(dec!(100)), dec!(110), date("2024-02-01"))
            .await
            .unwrap();
        merger
            .merge_sell(owner(), "AAPL", Some(dec!(100)), dec!(130), date("2024-02-15"))
            .await
            .unwrap();

        let history = merger.store.list_closed_stocks(owner()).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].quantity, dec!(200));
        assert_eq!(history[0].sell_price, dec!(120));
        assert_eq!(history[0].profit_loss, dec!(4000));
        assert_eq!(history[0].close_date, date("2024-02-15"));
    }

    #[tokio::test]
    async fn sells_of_different_lots_stay_separate() {
        let merger = merger();
        merger
            .merge_buy(owner(), "AAPL", dec!(100), dec!(150), date("2024-01-02"))
            .await
            .unwrap();
        merger
            .merge_sell(owner(), "AAPL", None, dec!(160), date("2024-02-01"))
            .await
            .unwrap();

        // new lot, different open date
        merger
            .merge_buy(owner(), "AAPL", dec!(50), dec!(155), date("2024-03-01"))
            .await
            .unwrap();
        merger
            .merge_sell(owner(), "AAPL", None, dec!(165), date("2024-04-01"))
            .await
            .unwrap();

        let history = merger.store.list_closed_stocks(owner()).await.unwrap();
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn concurrent_buys_serialize_per_ticker() {
        let merger = merger();
        let mut handles = Vec::new();
        for _ in 0..10 {
            let merger = merger.clone();
            handles.push(tokio::spawn(async move {
                merger
                    .merge_buy(owner(), "AAPL", dec!(10), dec!(100), date("2024-01-02"))
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let lot = merger
            .store
            .stock_lot(owner(), "AAPL")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(lot.quantity, dec!(100));
        assert_eq!(lot.cost_basis, dec!(100));
    }
}
