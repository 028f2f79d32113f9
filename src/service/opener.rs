//! Option opener: creates positions with kind-derived collateral.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::info;

use crate::domain::{
    DomainError, OptionKind, OptionPosition, UserId, SHARES_PER_CONTRACT,
};
use crate::error::Result;
use crate::port::outbound::LedgerStore;
use crate::service::locks::MutationLocks;

/// A request to open an option position.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenRequest {
    pub ticker: String,
    pub kind: OptionKind,
    pub strike: Decimal,
    pub premium: Decimal,
    pub expiration: NaiveDate,
    pub quantity: Decimal,
    pub purchase_date: NaiveDate,
}

/// Opens option positions. Every open inserts a new position; equal
/// contracts are never merged.
pub struct OptionOpener<S> {
    store: Arc<S>,
    locks: Arc<MutationLocks>,
}

impl<S> Clone for OptionOpener<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            locks: Arc::clone(&self.locks),
        }
    }
}

impl<S: LedgerStore> OptionOpener<S> {
    pub fn new(store: Arc<S>, locks: Arc<MutationLocks>) -> Self {
        Self { store, locks }
    }

    /// Open a position. Collateral is derived from the kind: cash backing
    /// the strike for CSPs, the owned lot's basis for covered calls when
    /// enough shares are held, zero otherwise.
    pub async fn open(&self, owner: UserId, request: OpenRequest) -> Result<OptionPosition> {
        if request.quantity <= Decimal::ZERO {
            return Err(DomainError::NonPositiveQuantity(request.quantity).into());
        }

        let collateral = self
            .derive_collateral(owner, &request.ticker, request.kind, request.strike, request.quantity)
            .await?;

        let mut position = OptionPosition {
            id: None,
            owner,
            ticker: request.ticker,
            price: request.premium,
            premium: request.premium,
            strike: request.strike,
            expiration: request.expiration,
            kind: request.kind,
            collateral,
            quantity: request.quantity,
            purchase_date: request.purchase_date,
        };
        let id = self.store.insert_option_position(&position).await?;
        position.id = Some(id);

        info!(
            %owner,
            ticker = %position.ticker,
            kind = %position.kind,
            strike = %position.strike,
            quantity = %position.quantity,
            %collateral,
            "opened option position"
        );
        Ok(position)
    }

    /// Collateral for a would-be position. Also used when edits change a
    /// position's kind, strike, or quantity.
    pub(crate) async fn derive_collateral(
        &self,
        owner: UserId,
        ticker: &str,
        kind: OptionKind,
        strike: Decimal,
        quantity: Decimal,
    ) -> Result<Decimal> {
        match kind {
            OptionKind::Call | OptionKind::Put => Ok(Decimal::ZERO),
            OptionKind::Csp => Ok(strike * SHARES_PER_CONTRACT * quantity),
            OptionKind::Cc => {
                let shares_needed = SHARES_PER_CONTRACT * quantity;
                let lock = self.locks.stock(owner, ticker);
                let _guard = lock.lock().await;
                match self.store.stock_lot(owner, ticker).await? {
                    Some(lot) if lot.quantity >= shares_needed => {
                        Ok(lot.cost_basis * shares_needed)
                    }
                    // uncovered: still opens, with nothing backing it
                    _ => Ok(Decimal::ZERO),
                }
            }
        }
    }
}
