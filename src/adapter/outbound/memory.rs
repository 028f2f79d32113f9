//! In-memory ledger store for testing and ephemeral runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::NaiveDate;
use parking_lot::RwLock;
use rust_decimal::Decimal;

use crate::domain::{
    ClosedOption, ClosedStock, OptionKind, OptionPosition, PositionId, RecordId, StockLot, UserId,
};
use crate::error::{Error, Result};
use crate::port::outbound::LedgerStore;

/// In-memory ledger keyed the same way the SQLite tables are.
#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    lots: RwLock<HashMap<(UserId, String), StockLot>>,
    positions: RwLock<HashMap<(UserId, PositionId), OptionPosition>>,
    closed_stocks: RwLock<HashMap<(UserId, RecordId), ClosedStock>>,
    closed_options: RwLock<HashMap<(UserId, RecordId), ClosedOption>>,
    next_id: AtomicI64,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            ..Self::default()
        }
    }

    fn allocate_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }
}

impl LedgerStore for MemoryLedgerStore {
    async fn stock_lot(&self, owner: UserId, ticker: &str) -> Result<Option<StockLot>> {
        Ok(self.lots.read().get(&(owner, ticker.to_string())).cloned())
    }

    async fn upsert_stock_lot(&self, lot: &StockLot) -> Result<()> {
        self.lots
            .write()
            .insert((lot.owner, lot.ticker.clone()), lot.clone());
        Ok(())
    }

    async fn delete_stock_lot(&self, owner: UserId, ticker: &str) -> Result<bool> {
        Ok(self
            .lots
            .write()
            .remove(&(owner, ticker.to_string()))
            .is_some())
    }

    async fn list_stock_lots(&self, owner: UserId) -> Result<Vec<StockLot>> {
        let mut lots: Vec<StockLot> = self
            .lots
            .read()
            .values()
            .filter(|lot| lot.owner == owner)
            .cloned()
            .collect();
        lots.sort_by(|a, b| b.open_date.cmp(&a.open_date).then(a.ticker.cmp(&b.ticker)));
        Ok(lots)
    }

    async fn insert_option_position(&self, position: &OptionPosition) -> Result<PositionId> {
        let id = PositionId::new(self.allocate_id());
        let mut stored = position.clone();
        stored.id = Some(id);
        self.positions.write().insert((position.owner, id), stored);
        Ok(id)
    }

    async fn option_position(
        &self,
        owner: UserId,
        id: PositionId,
    ) -> Result<Option<OptionPosition>> {
        Ok(self.positions.read().get(&(owner, id)).cloned())
    }

    async fn first_open_option(
        &self,
        owner: UserId,
        ticker: &str,
        strike: Decimal,
        expiration: NaiveDate,
        kind: OptionKind,
    ) -> Result<Option<OptionPosition>> {
        let positions = self.positions.read();
        let mut matches: Vec<&OptionPosition> = positions
            .values()
            .filter(|p| {
                p.owner == owner
                    && p.ticker == ticker
                    && p.strike == strike
                    && p.expiration == expiration
                    && p.kind == kind
            })
            .collect();
        matches.sort_by(|a, b| a.purchase_date.cmp(&b.purchase_date).then(a.id.cmp(&b.id)));
        Ok(matches.first().map(|p| (*p).clone()))
    }

    async fn update_option_position(&self, position: &OptionPosition) -> Result<()> {
        let id = position
            .id
            .ok_or_else(|| Error::Database("option position update without id".to_string()))?;
        self.positions
            .write()
            .insert((position.owner, id), position.clone());
        Ok(())
    }

    async fn delete_option_position(&self, owner: UserId, id: PositionId) -> Result<bool> {
        Ok(self.positions.write().remove(&(owner, id)).is_some())
    }

    async fn list_option_positions(&self, owner: UserId) -> Result<Vec<OptionPosition>> {
        let mut positions: Vec<OptionPosition> = self
            .positions
            .read()
            .values()
            .filter(|p| p.owner == owner)
            .cloned()
            .collect();
        positions.sort_by(|a, b| b.purchase_date.cmp(&a.purchase_date).then(a.id.cmp(&b.id)));
        Ok(positions)
    }

    async fn closed_stock(&self, owner: UserId, id: RecordId) -> Result<Option<ClosedStock>> {
        Ok(self.closed_stocks.read().get(&(owner, id)).cloned())
    }

    async fn find_closed_stock(
        &self,
        owner: UserId,
        ticker: &str,
        open_date: NaiveDate,
    ) -> Result<Option<ClosedStock>> {
        Ok(self
            .closed_stocks
            .read()
            .values()
            .find(|r| r.owner == owner && r.ticker == ticker && r.open_date == open_date)
            .cloned())
    }

    async fn insert_closed_stock(&self, record: &ClosedStock) -> Result<RecordId> {
        let id = RecordId::new(self.allocate_id());
        let mut stored = record.clone();
        stored.id = Some(id);
        self.closed_stocks.write().insert((record.owner, id), stored);
        Ok(id)
    }

    async fn update_closed_stock(&self, record: &ClosedStock) -> Result<()> {
        let id = record
            .id
            .ok_or_else(|| Error::Database("closed stock update without id".to_string()))?;
        self.closed_stocks
            .write()
            .insert((record.owner, id), record.clone());
        Ok(())
    }

    async fn delete_closed_stock(&self, owner: UserId, id: RecordId) -> Result<bool> {
        Ok(self.closed_stocks.write().remove(&(owner, id)).is_some())
    }

    async fn list_closed_stocks(&self, owner: UserId) -> Result<Vec<ClosedStock>> {
        let mut records: Vec<ClosedStock> = self
            .closed_stocks
            .read()
            .values()
            .filter(|r| r.owner == owner)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.close_date.cmp(&a.close_date).then(b.id.cmp(&a.id)));
        Ok(records)
    }

    async fn closed_option(&self, owner: UserId, id: RecordId) -> Result<Option<ClosedOption>> {
        Ok(self.closed_options.read().get(&(owner, id)).cloned())
    }

    async fn insert_closed_option(&self, record: &ClosedOption) -> Result<RecordId> {
        let id = RecordId::new(self.allocate_id());
        let mut stored = record.clone();
        stored.id = Some(id);
        self.closed_options
            .write()
            .insert((record.owner, id), stored);
        Ok(id)
    }

    async fn update_closed_option(&self, record: &ClosedOption) -> Result<()> {
        let id = record
            .id
            .ok_or_else(|| Error::Database("closed option update without id".to_string()))?;
        self.closed_options
            .write()
            .insert((record.owner, id), record.clone());
        Ok(())
    }

    async fn delete_closed_option(&self, owner: UserId, id: RecordId) -> Result<bool> {
        Ok(self.closed_options.write().remove(&(owner, id)).is_some())
    }

    async fn list_closed_options(&self, owner: UserId) -> Result<Vec<ClosedOption>> {
        let mut records: Vec<ClosedOption> = self
            .closed_options
            .read()
            .values()
            .filter(|r| r.owner == owner)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.close_date.cmp(&a.close_date).then(b.id.cmp(&a.id)));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn owner() -> UserId {
        UserId::new(1)
    }

    fn position(ticker: &str, purchase: &str) -> OptionPosition {
        OptionPosition {
            id: None,
            owner: owner(),
            ticker: ticker.into(),
            price: dec!(1.50),
            premium: dec!(1.50),
            strike: dec!(50),
            expiration: date("2024-06-21"),
            kind: OptionKind::Csp,
            collateral: dec!(5000),
            quantity: dec!(1),
            purchase_date: date(purchase),
        }
    }

    #[tokio::test]
    async fn lot_crud_is_keyed_by_ticker() {
        let store = MemoryLedgerStore::new();
        let lot = StockLot::open(owner(), "AAPL", dec!(100), dec!(150), date("2024-01-02"));
        store.upsert_stock_lot(&lot).await.unwrap();

        let loaded = store.stock_lot(owner(), "AAPL").await.unwrap().unwrap();
        assert_eq!(loaded.quantity, dec!(100));
        assert!(store.stock_lot(owner(), "MSFT").await.unwrap().is_none());

        assert!(store.delete_stock_lot(owner(), "AAPL").await.unwrap());
        assert!(!store.delete_stock_lot(owner(), "AAPL").await.unwrap());
    }

    #[tokio::test]
    async fn lots_are_scoped_per_owner() {
        let store = MemoryLedgerStore::new();
        let lot = StockLot::open(owner(), "AAPL", dec!(100), dec!(150), date("2024-01-02"));
        store.upsert_stock_lot(&lot).await.unwrap();

        assert!(store
            .stock_lot(UserId::new(2), "AAPL")
            .await
            .unwrap()
            .is_none());
        assert!(store.list_stock_lots(UserId::new(2)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn first_open_option_prefers_oldest_purchase_then_lowest_id() {
        let store = MemoryLedgerStore::new();
        let newer = store
            .insert_option_position(&position("AAPL", "2024-05-10"))
            .await
            .unwrap();
        let older = store
            .insert_option_position(&position("AAPL", "2024-05-01"))
            .await
            .unwrap();
        let same_day = store
            .insert_option_position(&position("AAPL", "2024-05-01"))
            .await
            .unwrap();
        assert!(newer < older && older < same_day);

        let found = store
            .first_open_option(owner(), "AAPL", dec!(50), date("2024-06-21"), OptionKind::Csp)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, Some(older));
    }

    #[tokio::test]
    async fn first_open_option_requires_full_contract_match() {
        let store = MemoryLedgerStore::new();
        store
            .insert_option_position(&position("AAPL", "2024-05-01"))
            .await
            .unwrap();

        let other_strike = store
            .first_open_option(owner(), "AAPL", dec!(55), date("2024-06-21"), OptionKind::Csp)
            .await
            .unwrap();
        assert!(other_strike.is_none());

        let other_kind = store
            .first_open_option(owner(), "AAPL", dec!(50), date("2024-06-21"), OptionKind::Put)
            .await
            .unwrap();
        assert!(other_kind.is_none());
    }

    #[tokio::test]
    async fn closed_stock_lists_newest_close_first() {
        let store = MemoryLedgerStore::new();
        let lot = StockLot::open(owner(), "AAPL", dec!(100), dec!(150), date("2024-01-02"));
        let early = ClosedStock::from_sale(&lot, dec!(50), dec!(160), date("2024-02-01"));
        let late = ClosedStock::from_sale(&lot, dec!(50), dec!(170), date("2024-03-01"));
        store.insert_closed_stock(&early).await.unwrap();
        store.insert_closed_stock(&late).await.unwrap();

        let listed = store.list_closed_stocks(owner()).await.unwrap();
        assert_eq!(listed[0].close_date, date("2024-03-01"));
        assert_eq!(listed[1].close_date, date("2024-02-01"));
    }
}
