//! Statistics aggregator: read-side rollup of the ledger.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::domain::{PortfolioStats, UserId};
use crate::error::Result;
use crate::port::outbound::LedgerStore;

/// Computes portfolio statistics from the current ledger state. Never
/// writes.
pub struct StatsService<S> {
    store: Arc<S>,
}

impl<S: LedgerStore> StatsService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn summarize(&self, owner: UserId) -> Result<PortfolioStats> {
        let lots = self.store.list_stock_lots(owner).await?;
        let positions = self.store.list_option_positions(owner).await?;
        let closed_stocks = self.store.list_closed_stocks(owner).await?;
        let closed_options = self.store.list_closed_options(owner).await?;

        let mut stats = PortfolioStats {
            stock_count: lots.len(),
            option_count: positions.len(),
            closed_count: closed_stocks.len() + closed_options.len(),
            ..PortfolioStats::default()
        };

        let realized = closed_stocks
            .iter()
            .map(|r| r.profit_loss)
            .chain(closed_options.iter().map(|r| r.profit_loss));
        for pl in realized {
            stats.total_pl += pl;
            if pl > Decimal::ZERO {
                stats.total_gains += pl;
                stats.win_count += 1;
            } else if pl < Decimal::ZERO {
                stats.total_losses += pl;
                stats.loss_count += 1;
            }
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::memory::MemoryLedgerStore;
    use crate::domain::{ClosedStock, StockLot};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn owner() -> UserId {
        UserId::new(1)
    }

    async fn record_sale(store: &MemoryLedgerStore, ticker: &str, pl: Decimal) {
        let lot = StockLot::open(owner(), ticker, dec!(100), dec!(100), date("2024-01-02"));
        let mut record = ClosedStock::from_sale(&lot, dec!(100), dec!(100), date("2024-02-01"));
        record.profit_loss = pl;
        store.insert_closed_stock(&record).await.unwrap();
    }

    #[tokio::test]
    async fn empty_ledger_yields_zeroed_stats() {
        let store = Arc::new(MemoryLedgerStore::new());
        let stats = StatsService::new(Arc::clone(&store))
            .summarize(owner())
            .await
            .unwrap();

        assert_eq!(stats, PortfolioStats::default());
        assert_eq!(stats.win_rate(), Decimal::ZERO);
        assert_eq!(stats.profit_factor(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn wins_losses_and_ratios() {
        let store = Arc::new(MemoryLedgerStore::new());
        record_sale(&store, "AAPL", dec!(400)).await;
        record_sale(&store, "MSFT", dec!(200)).await;
        record_sale(&store, "TSLA", dec!(-500)).await;
        // break-even close counts neither way
        record_sale(&store, "F", dec!(0)).await;

        let stats = StatsService::new(Arc::clone(&store))
            .summarize(owner())
            .await
            .unwrap();

        assert_eq!(stats.closed_count, 4);
        assert_eq!(stats.total_pl, dec!(100));
        assert_eq!(stats.total_gains, dec!(600));
        assert_eq!(stats.total_losses, dec!(-500));
        assert_eq!(stats.win_count, 2);
        assert_eq!(stats.loss_count, 1);
        assert_eq!(stats.profit_factor(), dec!(1.2));
    }

    #[tokio::test]
    async fn counts_open_positions() {
        let store = Arc::new(MemoryLedgerStore::new());
        let lot = StockLot::open(owner(), "AAPL", dec!(100), dec!(150), date("2024-01-02"));
        store.upsert_stock_lot(&lot).await.unwrap();

        let stats = StatsService::new(Arc::clone(&store))
            .summarize(owner())
            .await
            .unwrap();
        assert_eq!(stats.stock_count, 1);
        assert_eq!(stats.total_positions(), 1);
    }
}
