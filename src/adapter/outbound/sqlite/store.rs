//! SQLite ledger store implementation.
//!
//! Persistent storage for open positions and closed-trade history using
//! SQLite and Diesel ORM.

use chrono::NaiveDate;
use diesel::prelude::*;
use rust_decimal::Decimal;

use crate::adapter::outbound::sqlite::database::connection::DbPool;
use crate::adapter::outbound::sqlite::database::model::{
    ClosedOptionRow, ClosedStockRow, NewClosedOptionRow, NewClosedStockRow, NewOptionPositionRow,
    OptionPositionRow, StockLotRow,
};
use crate::adapter::outbound::sqlite::database::schema::{
    closed_options, closed_stocks, option_positions, stock_positions,
};
use crate::domain::{
    ClosedOption, ClosedStock, OptionKind, OptionPosition, PositionId, RecordId, StockLot, UserId,
};
use crate::error::{Error, Result};
use crate::port::outbound::store::LedgerStore;

diesel::define_sql_function! {
    fn last_insert_rowid() -> BigInt;
}

/// SQLite-backed ledger store.
///
/// Implements the [`LedgerStore`] trait on top of the four ledger tables.
pub struct SqliteLedgerStore {
    /// Database connection pool.
    pool: DbPool,
}

/// Decimals are stored normalized so that TEXT equality matches numeric
/// equality, e.g. `50` and `50.0` encode identically.
fn encode_decimal(value: Decimal) -> String {
    value.normalize().to_string()
}

fn parse_decimal(text: &str) -> Result<Decimal> {
    text.parse().map_err(|_| {
        Error::Parse(format!("invalid decimal '{text}' in ledger row"))
    })
}

fn encode_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn parse_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map_err(|_| Error::Parse(format!("invalid date '{text}' in ledger row")))
}

impl SqliteLedgerStore {
    /// Create a new SQLite ledger store with the given connection pool.
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<diesel::r2d2::PooledConnection<diesel::r2d2::ConnectionManager<SqliteConnection>>> {
        self.pool.get().map_err(|e| Error::Connection(e.to_string()))
    }

    fn lot_to_row(lot: &StockLot) -> StockLotRow {
        StockLotRow {
            user_id: lot.owner.value(),
            ticker: lot.ticker.clone(),
            quantity: encode_decimal(lot.quantity),
            cost_basis: encode_decimal(lot.cost_basis),
            open_date: encode_date(lot.open_date),
        }
    }

    fn lot_from_row(row: StockLotRow) -> Result<StockLot> {
        Ok(StockLot {
            owner: UserId::new(row.user_id),
            ticker: row.ticker,
            quantity: parse_decimal(&row.quantity)?,
            cost_basis: parse_decimal(&row.cost_basis)?,
            open_date: parse_date(&row.open_date)?,
        })
    }

    fn position_to_row(position: &OptionPosition) -> NewOptionPositionRow {
        NewOptionPositionRow {
            user_id: position.owner.value(),
            ticker: position.ticker.clone(),
            price: encode_decimal(position.price),
            premium: encode_decimal(position.premium),
            strike: encode_decimal(position.strike),
            expiration: encode_date(position.expiration),
            kind: position.kind.as_str().to_string(),
            collateral: encode_decimal(position.collateral),
            quantity: encode_decimal(position.quantity),
            purchase_date: encode_date(position.purchase_date),
        }
    }

    fn position_from_row(row: OptionPositionRow) -> Result<OptionPosition> {
        Ok(OptionPosition {
            id: Some(PositionId::new(row.id)),
            owner: UserId::new(row.user_id),
            ticker: row.ticker,
            price: parse_decimal(&row.price)?,
            premium: parse_decimal(&row.premium)?,
            strike: parse_decimal(&row.strike)?,
            expiration: parse_date(&row.expiration)?,
            kind: row.kind.parse().map_err(Error::Parse)?,
            collateral: parse_decimal(&row.collateral)?,
            quantity: parse_decimal(&row.quantity)?,
            purchase_date: parse_date(&row.purchase_date)?,
        })
    }

    fn closed_stock_to_row(record: &ClosedStock) -> NewClosedStockRow {
        NewClosedStockRow {
            user_id: record.owner.value(),
            ticker: record.ticker.clone(),
            open_date: encode_date(record.open_date),
            close_date: encode_date(record.close_date),
            quantity: encode_decimal(record.quantity),
            cost_basis: encode_decimal(record.cost_basis),
            sell_price: encode_decimal(record.sell_price),
            profit_loss: encode_decimal(record.profit_loss),
        }
    }

    fn closed_stock_from_row(row: ClosedStockRow) -> Result<ClosedStock> {
        Ok(ClosedStock {
            id: Some(RecordId::new(row.id)),
            owner: UserId::new(row.user_id),
            ticker: row.ticker,
            open_date: parse_date(&row.open_date)?,
            close_date: parse_date(&row.close_date)?,
            quantity: parse_decimal(&row.quantity)?,
            cost_basis: parse_decimal(&row.cost_basis)?,
            sell_price: parse_decimal(&row.sell_price)?,
            profit_loss: parse_decimal(&row.profit_loss)?,
        })
    }

    fn closed_option_to_row(record: &ClosedOption) -> NewClosedOptionRow {
        NewClosedOptionRow {
            user_id: record.owner.value(),
            ticker: record.ticker.clone(),
            price: encode_decimal(record.price),
            premium: encode_decimal(record.premium),
            strike: encode_decimal(record.strike),
            expiration: encode_date(record.expiration),
            kind: record.kind.as_str().to_string(),
            collateral: encode_decimal(record.collateral),
            quantity: encode_decimal(record.quantity),
            purchase_date: encode_date(record.purchase_date),
            close_date: encode_date(record.close_date),
            sell_price: encode_decimal(record.sell_price),
            profit_loss: encode_decimal(record.profit_loss),
        }
    }

    fn closed_option_from_row(row: ClosedOptionRow) -> Result<ClosedOption> {
        Ok(ClosedOption {
            id: Some(RecordId::new(row.id)),
            owner: UserId::new(row.user_id),
            ticker: row.ticker,
            price: parse_decimal(&row.price)?,
            premium: parse_decimal(&row.premium)?,
            strike: parse_decimal(&row.strike)?,
            expiration: parse_date(&row.expiration)?,
            kind: row.kind.parse().map_err(Error::Parse)?,
            collateral: parse_decimal(&row.collateral)?,
            quantity: parse_decimal(&row.quantity)?,
            purchase_date: parse_date(&row.purchase_date)?,
            close_date: parse_date(&row.close_date)?,
            sell_price: parse_decimal(&row.sell_price)?,
            profit_loss: parse_decimal(&row.profit_loss)?,
        })
    }
}

impl LedgerStore for SqliteLedgerStore {
    async fn stock_lot(&self, owner: UserId, ticker: &str) -> Result<Option<StockLot>> {
        let mut conn = self.conn()?;
        let row: Option<StockLotRow> = stock_positions::table
            .find((owner.value(), ticker))
            .first(&mut conn)
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        row.map(Self::lot_from_row).transpose()
    }

    async fn upsert_stock_lot(&self, lot: &StockLot) -> Result<()> {
        let row = Self::lot_to_row(lot);
        let mut conn = self.conn()?;
        diesel::replace_into(stock_positions::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }

    async fn delete_stock_lot(&self, owner: UserId, ticker: &str) -> Result<bool> {
        let mut conn = self.conn()?;
        let deleted = diesel::delete(stock_positions::table.find((owner.value(), ticker)))
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(deleted > 0)
    }

    async fn list_stock_lots(&self, owner: UserId) -> Result<Vec<StockLot>> {
        let mut conn = self.conn()?;
        let rows: Vec<StockLotRow> = stock_positions::table
            .filter(stock_positions::user_id.eq(owner.value()))
            .order((
                stock_positions::open_date.desc(),
                stock_positions::ticker.asc(),
            ))
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        rows.into_iter().map(Self::lot_from_row).collect()
    }

    async fn insert_option_position(&self, position: &OptionPosition) -> Result<PositionId> {
        let row = Self::position_to_row(position);
        let mut conn = self.conn()?;
        diesel::insert_into(option_positions::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        let id: i64 = diesel::select(last_insert_rowid())
            .first(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(PositionId::new(id))
    }

    async fn option_position(
        &self,
        owner: UserId,
        id: PositionId,
    ) -> Result<Option<OptionPosition>> {
        let mut conn = self.conn()?;
        let row: Option<OptionPositionRow> = option_positions::table
            .find(id.value())
            .filter(option_positions::user_id.eq(owner.value()))
            .first(&mut conn)
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        row.map(Self::position_from_row).transpose()
    }

    async fn first_open_option(
        &self,
        owner: UserId,
        ticker: &str,
        strike: Decimal,
        expiration: NaiveDate,
        kind: OptionKind,
    ) -> Result<Option<OptionPosition>> {
        let mut conn = self.conn()?;
        let row: Option<OptionPositionRow> = option_positions::table
            .filter(option_positions::user_id.eq(owner.value()))
            .filter(option_positions::ticker.eq(ticker))
            .filter(option_positions::strike.eq(encode_decimal(strike)))
            .filter(option_positions::expiration.eq(encode_date(expiration)))
            .filter(option_positions::kind.eq(kind.as_str()))
            .order((
                option_positions::purchase_date.asc(),
                option_positions::id.asc(),
            ))
            .first(&mut conn)
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        row.map(Self::position_from_row).transpose()
    }

    async fn update_option_position(&self, position: &OptionPosition) -> Result<()> {
        let id = position
            .id
            .ok_or_else(|| Error::Database("option position update without id".to_string()))?;
        let row = Self::position_to_row(position);
        let mut conn = self.conn()?;
        diesel::update(option_positions::table.find(id.value()))
            .set(&row)
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }

    async fn delete_option_position(&self, owner: UserId, id: PositionId) -> Result<bool> {
        let mut conn = self.conn()?;
        let deleted = diesel::delete(
            option_positions::table
                .find(id.value())
                .filter(option_positions::user_id.eq(owner.value())),
        )
        .execute(&mut conn)
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(deleted > 0)
    }

    async fn list_option_positions(&self, owner: UserId) -> Result<Vec<OptionPosition>> {
        let mut conn = self.conn()?;
        let rows: Vec<OptionPositionRow> = option_positions::table
            .filter(option_positions::user_id.eq(owner.value()))
            .order((
                option_positions::purchase_date.desc(),
                option_positions::id.asc(),
            ))
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        rows.into_iter().map(Self::position_from_row).collect()
    }

    async fn closed_stock(&self, owner: UserId, id: RecordId) -> Result<Option<ClosedStock>> {
        let mut conn = self.conn()?;
        let row: Option<ClosedStockRow> = closed_stocks::table
            .find(id.value())
            .filter(closed_stocks::user_id.eq(owner.value()))
            .first(&mut conn)
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        row.map(Self::closed_stock_from_row).transpose()
    }

    async fn find_closed_stock(
        &self,
        owner: UserId,
        ticker: &str,
        open_date: NaiveDate,
    ) -> Result<Option<ClosedStock>> {
        let mut conn = self.conn()?;
        let row: Option<ClosedStockRow> = closed_stocks::table
            .filter(closed_stocks::user_id.eq(owner.value()))
            .filter(closed_stocks::ticker.eq(ticker))
            .filter(closed_stocks::open_date.eq(encode_date(open_date)))
            .order(closed_stocks::id.asc())
            .first(&mut conn)
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        row.map(Self::closed_stock_from_row).transpose()
    }

    async fn insert_closed_stock(&self, record: &ClosedStock) -> Result<RecordId> {
        let row = Self::closed_stock_to_row(record);
        let mut conn = self.conn()?;
        diesel::insert_into(closed_stocks::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        let id: i64 = diesel::select(last_insert_rowid())
            .first(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(RecordId::new(id))
    }

    async fn update_closed_stock(&self, record: &ClosedStock) -> Result<()> {
        let id = record
            .id
            .ok_or_else(|| Error::Database("closed stock update without id".to_string()))?;
        let row = Self::closed_stock_to_row(record);
        let mut conn = self.conn()?;
        diesel::update(closed_stocks::table.find(id.value()))
            .set(&row)
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }

    async fn delete_closed_stock(&self, owner: UserId, id: RecordId) -> Result<bool> {
        let mut conn = self.conn()?;
        let deleted = diesel::delete(
            closed_stocks::table
                .find(id.value())
                .filter(closed_stocks::user_id.eq(owner.value())),
        )
        .execute(&mut conn)
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(deleted > 0)
    }

    async fn list_closed_stocks(&self, owner: UserId) -> Result<Vec<ClosedStock>> {
        let mut conn = self.conn()?;
        let rows: Vec<ClosedStockRow> = closed_stocks::table
            .filter(closed_stocks::user_id.eq(owner.value()))
            .order((closed_stocks::close_date.desc(), closed_stocks::id.desc()))
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        rows.into_iter().map(Self::closed_stock_from_row).collect()
    }

    async fn closed_option(&self, owner: UserId, id: RecordId) -> Result<Option<ClosedOption>> {
        let mut conn = self.conn()?;
        let row: Option<ClosedOptionRow> = closed_options::table
            .find(id.value())
            .filter(closed_options::user_id.eq(owner.value()))
            .first(&mut conn)
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        row.map(Self::closed_option_from_row).transpose()
    }

    async fn insert_closed_option(&self, record: &ClosedOption) -> Result<RecordId> {
        let row = Self::closed_option_to_row(record);
        let mut conn = self.conn()?;
        diesel::insert_into(closed_options::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        let id: i64 = diesel::select(last_insert_rowid())
            .first(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(RecordId::new(id))
    }

    async fn update_closed_option(&self, record: &ClosedOption) -> Result<()> {
        let id = record
            .id
            .ok_or_else(|| Error::Database("closed option update without id".to_string()))?;
        let row = Self::closed_option_to_row(record);
        let mut conn = self.conn()?;
        diesel::update(closed_options::table.find(id.value()))
            .set(&row)
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }

    async fn delete_closed_option(&self, owner: UserId, id: RecordId) -> Result<bool> {
        let mut conn = self.conn()?;
        let deleted = diesel::delete(
            closed_options::table
                .find(id.value())
                .filter(closed_options::user_id.eq(owner.value())),
        )
        .execute(&mut conn)
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(deleted > 0)
    }

    async fn list_closed_options(&self, owner: UserId) -> Result<Vec<ClosedOption>> {
        let mut conn = self.conn()?;
        let rows: Vec<ClosedOptionRow> = closed_options::table
            .filter(closed_options::user_id.eq(owner.value()))
            .order((closed_options::close_date.desc(), closed_options::id.desc()))
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        rows.into_iter().map(Self::closed_option_from_row).collect()
    }
}
