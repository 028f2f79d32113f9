//! Close resolver: takes option positions off the book and applies the
//! outcome's stock side effects.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::{
    ClosedOption, ClosedStock, CloseOutcome, DomainError, OptionKind, OptionPosition, PositionId,
    StockLot, UserId, SHARES_PER_CONTRACT,
};
use crate::error::{Error, Result};
use crate::port::outbound::LedgerStore;
use crate::service::locks::MutationLocks;
use crate::service::merger::LotMerger;

/// A request to close part or all of an option position.
#[derive(Debug, Clone, PartialEq)]
pub struct CloseRequest {
    pub quantity: Decimal,
    pub outcome: CloseOutcome,
    /// Closing price per contract. Required for a plain close, ignored
    /// otherwise.
    pub sell_price: Option<Decimal>,
    /// Per-share delivery price. Required for a called-away close.
    pub share_price: Option<Decimal>,
    pub close_date: NaiveDate,
}

/// Stock-side consequence of an option close.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum StockEffect {
    /// Assignment delivered shares at the strike into the ticker's lot.
    SharesAssigned { shares: Decimal, lot: StockLot },
    /// Call-away sold shares out of the ticker's lot.
    SharesCalledAway { shares: Decimal, closed: ClosedStock },
    /// Call-away found too few shares; the option close still went
    /// through.
    CalledAwaySkipped { shares_needed: Decimal },
}

/// Result of an option close.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionCloseResult {
    pub closed: ClosedOption,
    pub remaining: Decimal,
    pub stock_effect: Option<StockEffect>,
}

/// Resolves option closes, outcome by outcome.
pub struct CloseResolver<S> {
    store: Arc<S>,
    locks: Arc<MutationLocks>,
    merger: LotMerger<S>,
}

impl<S> Clone for CloseResolver<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            locks: Arc::clone(&self.locks),
            merger: self.merger.clone(),
        }
    }
}

impl<S: LedgerStore> CloseResolver<S> {
    pub fn new(store: Arc<S>, locks: Arc<MutationLocks>) -> Self {
        let merger = LotMerger::new(Arc::clone(&store), Arc::clone(&locks));
        Self {
            store,
            locks,
            merger,
        }
    }

    /// Close `request.quantity` contracts of the position.
    ///
    /// The quantity must fit the open position exactly; closes never
    /// clamp. Expired closes settle at zero on the expiration date;
    /// assignment and call-away settle at zero and move shares.
    pub async fn close_option(
        &self,
        owner: UserId,
        id: PositionId,
        request: CloseRequest,
    ) -> Result<OptionCloseResult> {
        let lock = self.locks.option(owner, id);
        let _guard = lock.lock().await;

        let position = self
            .store
            .option_position(owner, id)
            .await?
            .ok_or_else(|| Error::not_found(format!("no open option position {id}")))?;

        if request.quantity <= Decimal::ZERO || request.quantity > position.quantity {
            return Err(DomainError::InvalidQuantity {
                requested: request.quantity,
                available: position.quantity,
            }
            .into());
        }
        match (request.outcome, position.kind) {
            (CloseOutcome::Assigned, OptionKind::Csp) => {}
            (CloseOutcome::CalledAway, OptionKind::Cc) => {}
            (CloseOutcome::Assigned | CloseOutcome::CalledAway, kind) => {
                return Err(DomainError::OutcomeNotAllowed {
                    kind,
                    outcome: request.outcome,
                }
                .into());
            }
            _ => {}
        }

        let (sell_price, close_date) = match request.outcome {
            CloseOutcome::Closed => (
                request.sell_price.ok_or(DomainError::MissingSellPrice)?,
                request.close_date,
            ),
            CloseOutcome::Expired => (Decimal::ZERO, position.expiration),
            CloseOutcome::Assigned | CloseOutcome::CalledAway => {
                (Decimal::ZERO, request.close_date)
            }
        };
        if request.outcome == CloseOutcome::CalledAway && request.share_price.is_none() {
            return Err(DomainError::MissingSharePrice.into());
        }

        let (closed, remaining) = self
            .settle(&position, request.quantity, sell_price, close_date)
            .await?;

        let stock_effect = match request.outcome {
            CloseOutcome::Assigned => Some(self.assign_shares(&position, &closed).await?),
            CloseOutcome::CalledAway => {
                // validated above
                let share_price = request.share_price.ok_or(DomainError::MissingSharePrice)?;
                Some(self.call_away_shares(&position, &closed, share_price).await?)
            }
            _ => None,
        };

        info!(
            %owner,
            ticker = %closed.ticker,
            outcome = %request.outcome,
            quantity = %closed.quantity,
            pl = %closed.profit_loss,
            %remaining,
            "closed option position"
        );
        Ok(OptionCloseResult {
            closed,
            remaining,
            stock_effect,
        })
    }

    /// Close the oldest open position matching a contract, clamping to
    /// what is open. Used when replaying imported STC/BTC trades; returns
    /// `None` when nothing matches.
    pub async fn close_matched(
        &self,
        owner: UserId,
        ticker: &str,
        strike: Decimal,
        expiration: NaiveDate,
        kind: OptionKind,
        quantity: Decimal,
        sell_price: Decimal,
        close_date: NaiveDate,
    ) -> Result<Option<OptionCloseResult>> {
        let Some(found) = self
            .store
            .first_open_option(owner, ticker, strike, expiration, kind)
            .await?
        else {
            return Ok(None);
        };
        let Some(id) = found.id else {
            return Ok(None);
        };

        let lock = self.locks.option(owner, id);
        let _guard = lock.lock().await;

        // re-read under the lock; the position may have shrunk
        let Some(position) = self.store.option_position(owner, id).await? else {
            return Ok(None);
        };

        let to_close = quantity.min(position.quantity);
        let (closed, remaining) = self
            .settle(&position, to_close, sell_price, close_date)
            .await?;
        Ok(Some(OptionCloseResult {
            closed,
            remaining,
            stock_effect: None,
        }))
    }

    /// Records the closed slice and shrinks or deletes the position.
    /// Collateral leaves the position in proportion to the closed
    /// quantity.
    async fn settle(
        &self,
        position: &OptionPosition,
        quantity: Decimal,
        sell_price: Decimal,
        close_date: NaiveDate,
    ) -> Result<(ClosedOption, Decimal)> {
        let collateral_closed = position.collateral_slice(quantity);
        let mut closed = ClosedOption {
            id: None,
            owner: position.owner,
            ticker: position.ticker.clone(),
            price: position.price,
            premium: position.premium,
            strike: position.strike,
            expiration: position.expiration,
            kind: position.kind,
            collateral: collateral_closed,
            quantity,
            purchase_date: position.purchase_date,
            close_date,
            sell_price,
            profit_loss: position.kind.profit_loss(position.premium, sell_price, quantity),
        };
        let record_id = self.store.insert_closed_option(&closed).await?;
        closed.id = Some(record_id);

        let remaining = position.quantity - quantity;
        if remaining > Decimal::ZERO {
            let mut shrunk = position.clone();
            shrunk.quantity = remaining;
            shrunk.collateral = position.collateral - collateral_closed;
            self.store.update_option_position(&shrunk).await?;
        } else if let Some(id) = position.id {
            self.store.delete_option_position(position.owner, id).await?;
        }

        Ok((closed, remaining.max(Decimal::ZERO)))
    }

    /// Assignment: the strike buys shares into the ticker's lot, dated by
    /// the close.
    async fn assign_shares(
        &self,
        position: &OptionPosition,
        closed: &ClosedOption,
    ) -> Result<StockEffect> {
        let shares = SHARES_PER_CONTRACT * closed.quantity;
        let lot = self
            .merger
            .merge_buy(
                position.owner,
                &position.ticker,
                shares,
                position.strike,
                closed.close_date,
            )
            .await?;
        Ok(StockEffect::SharesAssigned { shares, lot })
    }

    /// Call-away: shares leave the lot at the delivery price. When the lot
    /// holds too few shares the stock side is skipped.
    async fn call_away_shares(
        &self,
        position: &OptionPosition,
        closed: &ClosedOption,
        share_price: Decimal,
    ) -> Result<StockEffect> {
        let shares = SHARES_PER_CONTRACT * closed.quantity;

        let lock = self.locks.stock(position.owner, &position.ticker);
        let _guard = lock.lock().await;

        let lot = self.store.stock_lot(position.owner, &position.ticker).await?;
        match lot {
            Some(lot) if lot.quantity >= shares => {
                let outcome = self
                    .merger
                    .record_sale(&lot, shares, share_price, closed.close_date, false)
                    .await?;
                Ok(StockEffect::SharesCalledAway {
                    shares,
                    closed: outcome.closed,
                })
            }
            _ => {
                warn!(
                    owner = %position.owner,
                    ticker = %position.ticker,
                    %shares,
                    "call-away without enough shares, stock side skipped"
                );
                Ok(StockEffect::CalledAwaySkipped {
                    shares_needed: shares,
                })
            }
        }
    }
}
