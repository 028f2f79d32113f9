//! Handlers for the trade lifecycle commands: buy, sell, open, close.

use crate::adapter::inbound::cli::command::{BuyArgs, CloseArgs, OpenArgs, SellArgs};
use crate::adapter::inbound::cli::output;
use crate::adapter::inbound::cli::run::{today, Services};
use crate::domain::{PositionId, UserId};
use crate::error::{Error, Result};
use crate::port::outbound::LedgerStore;
use crate::service::{CloseRequest, OpenRequest, StockEffect};

/// Execute `buy`.
pub async fn execute_buy(services: &Services, owner: UserId, args: BuyArgs) -> Result<()> {
    let date = args.date.unwrap_or_else(today);
    let lot = services
        .merger
        .merge_buy(owner, &args.ticker, args.quantity, args.price, date)
        .await?;

    output::payload("lot", &lot, |lot| {
        output::success(&format!(
            "bought {} {} at {}",
            args.quantity, lot.ticker, args.price
        ));
        output::field("Shares held", lot.quantity);
        output::field("Cost basis", lot.cost_basis);
        output::field("Open date", lot.open_date);
    });
    Ok(())
}

/// Execute `sell`.
pub async fn execute_sell(services: &Services, owner: UserId, args: SellArgs) -> Result<()> {
    let date = args.date.unwrap_or_else(today);
    let outcome = services
        .merger
        .merge_sell(owner, &args.ticker, args.quantity, args.price, date)
        .await?;

    if outcome.clamped {
        output::warning("sell clamped to the shares held");
    }
    output::payload("sale", &outcome, |outcome| {
        output::success(&format!(
            "sold {} {} at {}",
            outcome.closed.quantity, outcome.closed.ticker, args.price
        ));
        output::field("P/L", outcome.closed.profit_loss);
        output::field("Remaining", outcome.remaining);
    });
    Ok(())
}

/// Execute `open`.
pub async fn execute_open(services: &Services, owner: UserId, args: OpenArgs) -> Result<()> {
    let purchase_date = args.date.unwrap_or_else(today);
    let position = services
        .opener
        .open(
            owner,
            OpenRequest {
                ticker: args.ticker,
                kind: args.kind,
                strike: args.strike,
                premium: args.premium,
                expiration: args.expiration,
                quantity: args.quantity,
                purchase_date,
            },
        )
        .await?;

    output::payload("position", &position, |position| {
        output::success(&format!(
            "opened {} {} {} x{}",
            position.ticker, position.kind, position.strike, position.quantity
        ));
        if let Some(id) = position.id {
            output::field("Id", id);
        }
        output::field("Premium", position.premium);
        output::field("Collateral", position.collateral);
        output::field("Expiration", position.expiration);
    });
    Ok(())
}

/// Execute `close`.
pub async fn execute_close(services: &Services, owner: UserId, args: CloseArgs) -> Result<()> {
    let id = PositionId::new(args.id);
    let position = services
        .store
        .option_position(owner, id)
        .await?
        .ok_or_else(|| Error::not_found(format!("no open option position {id}")))?;
    let quantity = args.quantity.unwrap_or(position.quantity);
    let close_date = args.date.unwrap_or_else(today);

    let result = services
        .resolver
        .close_option(
            owner,
            id,
            CloseRequest {
                quantity,
                outcome: args.outcome,
                sell_price: args.price,
                share_price: args.share_price,
                close_date,
            },
        )
        .await?;

    output::payload("close", &result, |result| {
        output::success(&format!(
            "{} {} {} x{}",
            args.outcome, result.closed.ticker, result.closed.strike, result.closed.quantity
        ));
        output::field("P/L", result.closed.profit_loss);
        output::field("Remaining", result.remaining);
        match &result.stock_effect {
            Some(StockEffect::SharesAssigned { shares, lot }) => {
                output::note(&format!(
                    "{} shares assigned into the {} lot (cost basis {})",
                    shares, lot.ticker, lot.cost_basis
                ));
            }
            Some(StockEffect::SharesCalledAway { shares, closed }) => {
                output::note(&format!(
                    "{} shares called away (P/L {})",
                    shares, closed.profit_loss
                ));
            }
            Some(StockEffect::CalledAwaySkipped { shares_needed }) => {
                output::warning(&format!(
                    "lot holds fewer than {shares_needed} shares, no shares moved"
                ));
            }
            None => {}
        }
    });
    Ok(())
}
