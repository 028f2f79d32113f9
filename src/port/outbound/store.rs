//! Persistence port for the position ledger.

use std::future::Future;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::domain::{
    ClosedOption, ClosedStock, OptionKind, OptionPosition, PositionId, RecordId, StockLot, UserId,
};
use crate::error::Result;

/// Storage operations for open positions and closed-trade history.
///
/// Every operation is scoped to one owner. Stock lots are keyed by
/// `(owner, ticker)`; option positions and history rows carry store-assigned
/// ids. Implementations only move bytes; lifecycle arithmetic stays in the
/// services.
pub trait LedgerStore: Send + Sync {
    // stock lots

    /// Get the blended lot for a ticker, if one is open.
    fn stock_lot(
        &self,
        owner: UserId,
        ticker: &str,
    ) -> impl Future<Output = Result<Option<StockLot>>> + Send;

    /// Save a lot, replacing any existing lot for its ticker.
    fn upsert_stock_lot(&self, lot: &StockLot) -> impl Future<Output = Result<()>> + Send;

    /// Delete the lot for a ticker. Returns whether a lot existed.
    fn delete_stock_lot(
        &self,
        owner: UserId,
        ticker: &str,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// List all open lots, newest open date first.
    fn list_stock_lots(&self, owner: UserId)
        -> impl Future<Output = Result<Vec<StockLot>>> + Send;

    // option positions

    /// Insert a new position and return its assigned id.
    fn insert_option_position(
        &self,
        position: &OptionPosition,
    ) -> impl Future<Output = Result<PositionId>> + Send;

    /// Get a position by id.
    fn option_position(
        &self,
        owner: UserId,
        id: PositionId,
    ) -> impl Future<Output = Result<Option<OptionPosition>>> + Send;

    /// Find the oldest open position matching a contract, by purchase date
    /// then id.
    fn first_open_option(
        &self,
        owner: UserId,
        ticker: &str,
        strike: Decimal,
        expiration: NaiveDate,
        kind: OptionKind,
    ) -> impl Future<Output = Result<Option<OptionPosition>>> + Send;

    /// Overwrite a position in place. The position must carry its id.
    fn update_option_position(
        &self,
        position: &OptionPosition,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Delete a position by id. Returns whether it existed.
    fn delete_option_position(
        &self,
        owner: UserId,
        id: PositionId,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// List all open positions, newest purchase date first.
    fn list_option_positions(
        &self,
        owner: UserId,
    ) -> impl Future<Output = Result<Vec<OptionPosition>>> + Send;

    // closed stocks

    /// Get a closed-stock row by id.
    fn closed_stock(
        &self,
        owner: UserId,
        id: RecordId,
    ) -> impl Future<Output = Result<Option<ClosedStock>>> + Send;

    /// Find the blend target for a sale: the row sharing the lot's ticker
    /// and open date.
    fn find_closed_stock(
        &self,
        owner: UserId,
        ticker: &str,
        open_date: NaiveDate,
    ) -> impl Future<Output = Result<Option<ClosedStock>>> + Send;

    /// Insert a new closed-stock row and return its assigned id.
    fn insert_closed_stock(
        &self,
        record: &ClosedStock,
    ) -> impl Future<Output = Result<RecordId>> + Send;

    /// Overwrite a closed-stock row in place. The record must carry its id.
    fn update_closed_stock(
        &self,
        record: &ClosedStock,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Delete a closed-stock row by id. Returns whether it existed.
    fn delete_closed_stock(
        &self,
        owner: UserId,
        id: RecordId,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// List closed-stock history, newest close date first.
    fn list_closed_stocks(
        &self,
        owner: UserId,
    ) -> impl Future<Output = Result<Vec<ClosedStock>>> + Send;

    // closed options

    /// Get a closed-option row by id.
    fn closed_option(
        &self,
        owner: UserId,
        id: RecordId,
    ) -> impl Future<Output = Result<Option<ClosedOption>>> + Send;

    /// Insert a new closed-option row and return its assigned id.
    fn insert_closed_option(
        &self,
        record: &ClosedOption,
    ) -> impl Future<Output = Result<RecordId>> + Send;

    /// Overwrite a closed-option row in place. The record must carry its id.
    fn update_closed_option(
        &self,
        record: &ClosedOption,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Delete a closed-option row by id. Returns whether it existed.
    fn delete_closed_option(
        &self,
        owner: UserId,
        id: RecordId,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// List closed-option history, newest close date first.
    fn list_closed_options(
        &self,
        owner: UserId,
    ) -> impl Future<Output = Result<Vec<ClosedOption>>> + Send;
}
