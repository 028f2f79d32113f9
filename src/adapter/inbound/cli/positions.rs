//! Handlers for the `positions` command group.

use tabled::{Table, Tabled};

use crate::adapter::inbound::cli::command::{
    EditOptionPositionArgs, EditStockLotArgs, PositionsCommand,
};
use crate::adapter::inbound::cli::output;
use crate::adapter::inbound::cli::run::Services;
use crate::domain::{OptionPosition, PositionId, StockLot, UserId};
use crate::error::Result;
use crate::service::{ListFilter, OptionPositionEdit, StockLotEdit};

#[derive(Tabled)]
struct LotRow {
    #[tabled(rename = "Ticker")]
    ticker: String,
    #[tabled(rename = "Shares")]
    quantity: String,
    #[tabled(rename = "Cost basis")]
    cost_basis: String,
    #[tabled(rename = "Book value")]
    book_value: String,
    #[tabled(rename = "Opened")]
    open_date: String,
}

impl From<&StockLot> for LotRow {
    fn from(lot: &StockLot) -> Self {
        Self {
            ticker: lot.ticker.clone(),
            quantity: lot.quantity.to_string(),
            cost_basis: lot.cost_basis.to_string(),
            book_value: lot.book_value().to_string(),
            open_date: lot.open_date.to_string(),
        }
    }
}

#[derive(Tabled)]
struct PositionRow {
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Ticker")]
    ticker: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Strike")]
    strike: String,
    #[tabled(rename = "Premium")]
    premium: String,
    #[tabled(rename = "Qty")]
    quantity: String,
    #[tabled(rename = "Collateral")]
    collateral: String,
    #[tabled(rename = "Expires")]
    expiration: String,
    #[tabled(rename = "Opened")]
    purchase_date: String,
}

impl From<&OptionPosition> for PositionRow {
    fn from(position: &OptionPosition) -> Self {
        Self {
            id: position.id.map(|id| id.to_string()).unwrap_or_default(),
            ticker: position.ticker.clone(),
            kind: position.kind.to_string(),
            strike: position.strike.to_string(),
            premium: position.premium.to_string(),
            quantity: position.quantity.to_string(),
            collateral: position.collateral.to_string(),
            expiration: position.expiration.to_string(),
            purchase_date: position.purchase_date.to_string(),
        }
    }
}

/// Execute a `positions` subcommand.
pub async fn execute(services: &Services, owner: UserId, command: PositionsCommand) -> Result<()> {
    match command {
        PositionsCommand::List(args) => list(services, owner, args.into()).await,
        PositionsCommand::EditStock(args) => edit_stock(services, owner, args).await,
        PositionsCommand::EditOption(args) => edit_option(services, owner, args).await,
        PositionsCommand::DeleteStock { ticker } => {
            services.editor.delete_stock_lot(owner, &ticker).await?;
            output::success(&format!("deleted {ticker} lot"));
            Ok(())
        }
        PositionsCommand::DeleteOption { id } => {
            services
                .editor
                .delete_option_position(owner, PositionId::new(id))
                .await?;
            output::success(&format!("deleted option position {id}"));
            Ok(())
        }
    }
}

async fn list(services: &Services, owner: UserId, filter: ListFilter) -> Result<()> {
    let lots = services.editor.list_stock_lots(owner, &filter).await?;
    let positions = services
        .editor
        .list_option_positions(owner, &filter)
        .await?;

    output::payload("stock_lots", &lots, |lots| {
        output::section("Stock lots");
        if lots.is_empty() {
            output::note("(none)");
        } else {
            output::table(Table::new(lots.iter().map(LotRow::from)));
        }
    });
    output::payload("option_positions", &positions, |positions| {
        output::section("Option positions");
        if positions.is_empty() {
            output::note("(none)");
        } else {
            output::table(Table::new(positions.iter().map(PositionRow::from)));
        }
    });
    Ok(())
}

async fn edit_stock(services: &Services, owner: UserId, args: EditStockLotArgs) -> Result<()> {
    let lot = services
        .editor
        .edit_stock_lot(
            owner,
            &args.ticker,
            StockLotEdit {
                quantity: args.quantity,
                cost_basis: args.cost_basis,
                open_date: args.open_date,
            },
        )
        .await?;

    output::payload("lot", &lot, |lot| {
        output::success(&format!("updated {} lot", lot.ticker));
        output::field("Shares held", lot.quantity);
        output::field("Cost basis", lot.cost_basis);
        output::field("Open date", lot.open_date);
    });
    Ok(())
}

async fn edit_option(
    services: &Services,
    owner: UserId,
    args: EditOptionPositionArgs,
) -> Result<()> {
    let position = services
        .editor
        .edit_option_position(
            owner,
            PositionId::new(args.id),
            OptionPositionEdit {
                premium: args.premium,
                strike: args.strike,
                expiration: args.expiration,
                kind: args.kind,
                quantity: args.quantity,
                purchase_date: args.purchase_date,
            },
        )
        .await?;

    output::payload("position", &position, |position| {
        output::success(&format!("updated option position {}", args.id));
        output::field("Kind", position.kind);
        output::field("Strike", position.strike);
        output::field("Premium", position.premium);
        output::field("Qty", position.quantity);
        output::field("Collateral", position.collateral);
    });
    Ok(())
}
