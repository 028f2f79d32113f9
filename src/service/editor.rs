//! Ledger maintenance: filtered listings, edits and deletes outside the
//! trade lifecycle.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::info;

use crate::domain::{
    ClosedOption, ClosedStock, DomainError, OptionKind, OptionPosition, PositionId, RecordId,
    StockLot, UserId,
};
use crate::error::{Error, Result};
use crate::port::outbound::LedgerStore;
use crate::service::locks::MutationLocks;
use crate::service::opener::OptionOpener;

/// Listing filter. Ticker matches as a case-insensitive substring; dates
/// bound the open/purchase date for open rows and the close date for
/// closed ones, inclusively.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListFilter {
    pub ticker: Option<String>,
    pub kind: Option<OptionKind>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl ListFilter {
    fn matches_ticker(&self, ticker: &str) -> bool {
        self.ticker.as_ref().map_or(true, |needle| {
            ticker
                .to_ascii_lowercase()
                .contains(&needle.to_ascii_lowercase())
        })
    }

    fn matches_kind(&self, kind: OptionKind) -> bool {
        self.kind.map_or(true, |wanted| wanted == kind)
    }

    fn matches_date(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }
}

/// Field edits for an open stock lot. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StockLotEdit {
    pub quantity: Option<Decimal>,
    pub cost_basis: Option<Decimal>,
    pub open_date: Option<NaiveDate>,
}

/// Field edits for an open option position. Changing kind, strike, or
/// quantity re-derives the collateral.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionPositionEdit {
    pub premium: Option<Decimal>,
    pub strike: Option<Decimal>,
    pub expiration: Option<NaiveDate>,
    pub kind: Option<OptionKind>,
    pub quantity: Option<Decimal>,
    pub purchase_date: Option<NaiveDate>,
}

/// Field edits for a closed stock row. P/L is recomputed from the edited
/// fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClosedStockEdit {
    pub quantity: Option<Decimal>,
    pub cost_basis: Option<Decimal>,
    pub sell_price: Option<Decimal>,
    pub open_date: Option<NaiveDate>,
    pub close_date: Option<NaiveDate>,
}

/// Field edits for a closed option row. P/L is recomputed from the edited
/// fields with the stored kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClosedOptionEdit {
    pub premium: Option<Decimal>,
    pub sell_price: Option<Decimal>,
    pub quantity: Option<Decimal>,
    pub close_date: Option<NaiveDate>,
}

/// Maintenance operations over the ledger.
pub struct LedgerEditor<S> {
    store: Arc<S>,
    locks: Arc<MutationLocks>,
    opener: OptionOpener<S>,
}

impl<S: LedgerStore> LedgerEditor<S> {
    pub fn new(store: Arc<S>, locks: Arc<MutationLocks>) -> Self {
        let opener = OptionOpener::new(Arc::clone(&store), Arc::clone(&locks));
        Self {
            store,
            locks,
            opener,
        }
    }

    // listings

    pub async fn list_stock_lots(
        &self,
        owner: UserId,
        filter: &ListFilter,
    ) -> Result<Vec<StockLot>> {
        Ok(self
            .store
            .list_stock_lots(owner)
            .await?
            .into_iter()
            .filter(|lot| filter.matches_ticker(&lot.ticker) && filter.matches_date(lot.open_date))
            .collect())
    }

    pub async fn list_option_positions(
        &self,
        owner: UserId,
        filter: &ListFilter,
    ) -> Result<Vec<OptionPosition>> {
        Ok(self
            .store
            .list_option_positions(owner)
            .await?
            .into_iter()
            .filter(|p| {
                filter.matches_ticker(&p.ticker)
                    && filter.matches_kind(p.kind)
                    && filter.matches_date(p.purchase_date)
            })
            .collect())
    }

    pub async fn list_closed_stocks(
        &self,
        owner: UserId,
        filter: &ListFilter,
    ) -> Result<Vec<ClosedStock>> {
        Ok(self
            .store
            .list_closed_stocks(owner)
            .await?
            .into_iter()
            .filter(|r| filter.matches_ticker(&r.ticker) && filter.matches_date(r.close_date))
            .collect())
    }

    pub async fn list_closed_options(
        &self,
        owner: UserId,
        filter: &ListFilter,
    ) -> Result<Vec<ClosedOption>> {
        Ok(self
            .store
            .list_closed_options(owner)
            .await?
            .into_iter()
            .filter(|r| {
                filter.matches_ticker(&r.ticker)
                    && filter.matches_kind(r.kind)
                    && filter.matches_date(r.close_date)
            })
            .collect())
    }

    // open-position maintenance

    pub async fn edit_stock_lot(
        &self,
        owner: UserId,
        ticker: &str,
        edit: StockLotEdit,
    ) -> Result<StockLot> {
        if let Some(quantity) = edit.quantity {
            if quantity <= Decimal::ZERO {
                return Err(DomainError::NonPositiveQuantity(quantity).into());
            }
        }

        let lock = self.locks.stock(owner, ticker);
        let _guard = lock.lock().await;

        let mut lot = self
            .store
            .stock_lot(owner, ticker)
            .await?
            .ok_or_else(|| Error::not_found(format!("no open lot for {ticker}")))?;
        if let Some(quantity) = edit.quantity {
            lot.quantity = quantity;
        }
        if let Some(cost_basis) = edit.cost_basis {
            lot.cost_basis = cost_basis;
        }
        if let Some(open_date) = edit.open_date {
            lot.open_date = open_date;
        }
        self.store.upsert_stock_lot(&lot).await?;
        info!(%owner, ticker, "edited stock lot");
        Ok(lot)
    }

    pub async fn delete_stock_lot(&self, owner: UserId, ticker: &str) -> Result<()> {
        let lock = self.locks.stock(owner, ticker);
        let _guard = lock.lock().await;
        if !self.store.delete_stock_lot(owner, ticker).await? {
            return Err(Error::not_found(format!("no open lot for {ticker}")));
        }
        info!(%owner, ticker, "deleted stock lot");
        Ok(())
    }

    pub async fn edit_option_position(
        &self,
        owner: UserId,
        id: PositionId,
        edit: OptionPositionEdit,
    ) -> Result<OptionPosition> {
        if let Some(quantity) = edit.quantity {
            if quantity <= Decimal::ZERO {
                return Err(DomainError::NonPositiveQuantity(quantity).into());
            }
        }

        let lock = self.locks.option(owner, id);
        let _guard = lock.lock().await;

        let mut position = self
            .store
            .option_position(owner, id)
            .await?
            .ok_or_else(|| Error::not_found(format!("no open option position {id}")))?;
        if let Some(premium) = edit.premium {
            position.premium = premium;
            position.price = premium;
        }
        if let Some(strike) = edit.strike {
            position.strike = strike;
        }
        if let Some(expiration) = edit.expiration {
            position.expiration = expiration;
        }
        if let Some(kind) = edit.kind {
            position.kind = kind;
        }
        if let Some(quantity) = edit.quantity {
            position.quantity = quantity;
        }
        if let Some(purchase_date) = edit.purchase_date {
            position.purchase_date = purchase_date;
        }
        position.collateral = self
            .opener
            .derive_collateral(
                owner,
                &position.ticker,
                position.kind,
                position.strike,
                position.quantity,
            )
            .await?;
        self.store.update_option_position(&position).await?;
        info!(%owner, %id, "edited option position");
        Ok(position)
    }

    pub async fn delete_option_position(&self, owner: UserId, id: PositionId) -> Result<()> {
        let lock = self.locks.option(owner, id);
        let _guard = lock.lock().await;
        if !self.store.delete_option_position(owner, id).await? {
            return Err(Error::not_found(format!("no open option position {id}")));
        }
        info!(%owner, %id, "deleted option position");
        Ok(())
    }

    // history maintenance

    pub async fn edit_closed_stock(
        &self,
        owner: UserId,
        id: RecordId,
        edit: ClosedStockEdit,
    ) -> Result<ClosedStock> {
        if let Some(quantity) = edit.quantity {
            if quantity <= Decimal::ZERO {
                return Err(DomainError::NonPositiveQuantity(quantity).into());
            }
        }

        let mut record = self
            .store
            .closed_stock(owner, id)
            .await?
            .ok_or_else(|| Error::not_found(format!("no closed stock record {id}")))?;
        if let Some(quantity) = edit.quantity {
            record.quantity = quantity;
        }
        if let Some(cost_basis) = edit.cost_basis {
            record.cost_basis = cost_basis;
        }
        if let Some(sell_price) = edit.sell_price {
            record.sell_price = sell_price;
        }
        if let Some(open_date) = edit.open_date {
            record.open_date = open_date;
        }
        if let Some(close_date) = edit.close_date {
            record.close_date = close_date;
        }
        record.profit_loss = (record.sell_price - record.cost_basis) * record.quantity;
        self.store.update_closed_stock(&record).await?;
        info!(%owner, %id, "edited closed stock record");
        Ok(record)
    }

    pub async fn delete_closed_stock(&self, owner: UserId, id: RecordId) -> Result<()> {
        if !self.store.delete_closed_stock(owner, id).await? {
            return Err(Error::not_found(format!("no closed stock record {id}")));
        }
        info!(%owner, %id, "deleted closed stock record");
        Ok(())
    }

    pub async fn edit_closed_option(
        &self,
        owner: UserId,
        id: RecordId,
        edit: ClosedOptionEdit,
    ) -> Result<ClosedOption> {
        if let Some(quantity) = edit.quantity {
            if quantity <= Decimal::ZERO {
                return Err(DomainError::NonPositiveQuantity(quantity).into());
            }
        }

        let mut record = self
            .store
            .closed_option(owner, id)
            .await?
            .ok_or_else(|| Error::not_found(format!("no closed option record {id}")))?;
        if let Some(premium) = edit.premium {
            record.premium = premium;
            record.price = premium;
        }
        if let Some(sell_price) = edit.sell_price {
            record.sell_price = sell_price;
        }
        if let Some(quantity) = edit.quantity {
            record.quantity = quantity;
        }
        if let Some(close_date) = edit.close_date {
            record.close_date = close_date;
        }
        record.profit_loss =
            record
                .kind
                .profit_loss(record.premium, record.sell_price, record.quantity);
        self.store.update_closed_option(&record).await?;
        info!(%owner, %id, "edited closed option record");
        Ok(record)
    }

    pub async fn delete_closed_option(&self, owner: UserId, id: RecordId) -> Result<()> {
        if !self.store.delete_closed_option(owner, id).await? {
            return Err(Error::not_found(format!("no closed option record {id}")));
        }
        info!(%owner, %id, "deleted closed option record");
        Ok(())
    }
}
