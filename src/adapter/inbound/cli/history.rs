//! Handlers for the `history` command group.

use tabled::{Table, Tabled};

use crate::adapter::inbound::cli::command::{
    EditClosedOptionArgs, EditClosedStockArgs, HistoryCommand,
};
use crate::adapter::inbound::cli::output;
use crate::adapter::inbound::cli::run::Services;
use crate::domain::{ClosedOption, ClosedStock, RecordId, UserId};
use crate::error::Result;
use crate::service::{ClosedOptionEdit, ClosedStockEdit, ListFilter};

#[derive(Tabled)]
struct ClosedStockRow {
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Ticker")]
    ticker: String,
    #[tabled(rename = "Shares")]
    quantity: String,
    #[tabled(rename = "Cost basis")]
    cost_basis: String,
    #[tabled(rename = "Sell")]
    sell_price: String,
    #[tabled(rename = "P/L")]
    profit_loss: String,
    #[tabled(rename = "P/L %")]
    pl_percent: String,
    #[tabled(rename = "Opened")]
    open_date: String,
    #[tabled(rename = "Closed")]
    close_date: String,
}

impl From<&ClosedStock> for ClosedStockRow {
    fn from(record: &ClosedStock) -> Self {
        Self {
            id: record.id.map(|id| id.to_string()).unwrap_or_default(),
            ticker: record.ticker.clone(),
            quantity: record.quantity.to_string(),
            cost_basis: record.cost_basis.to_string(),
            sell_price: record.sell_price.to_string(),
            profit_loss: record.profit_loss.to_string(),
            pl_percent: format!("{:.2}", record.pl_percent()),
            open_date: record.open_date.to_string(),
            close_date: record.close_date.to_string(),
        }
    }
}

#[derive(Tabled)]
struct ClosedOptionRow {
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
    #[tabled(rename = "Sell")]
    sell_price: String,
    #[tabled(rename = "Qty")]
    quantity: String,
    #[tabled(rename = "P/L")]
    profit_loss: String,
    #[tabled(rename = "RoR %")]
    ror_percent: String,
    #[tabled(rename = "Closed")]
    close_date: String,
}

impl From<&ClosedOption> for ClosedOptionRow {
    fn from(record: &ClosedOption) -> Self {
        Self {
            id: record.id.map(|id| id.to_string()).unwrap_or_default(),
            ticker: record.ticker.clone(),
            kind: record.kind.to_string(),
            strike: record.strike.to_string(),
            premium: record.premium.to_string(),
            sell_price: record.sell_price.to_string(),
            quantity: record.quantity.to_string(),
            profit_loss: record.profit_loss.to_string(),
            ror_percent: format!("{:.2}", record.ror_percent()),
            close_date: record.close_date.to_string(),
        }
    }
}

/// Execute a `history` subcommand.
pub async fn execute(services: &Services, owner: UserId, command: HistoryCommand) -> Result<()> {
    match command {
        HistoryCommand::List(args) => list(services, owner, args.into()).await,
        HistoryCommand::EditStock(args) => edit_stock(services, owner, args).await,
        HistoryCommand::EditOption(args) => edit_option(services, owner, args).await,
        HistoryCommand::DeleteStock { id } => {
            services
                .editor
                .delete_closed_stock(owner, RecordId::new(id))
                .await?;
            output::success(&format!("deleted closed stock record {id}"));
            Ok(())
        }
        HistoryCommand::DeleteOption { id } => {
            services
                .editor
                .delete_closed_option(owner, RecordId::new(id))
                .await?;
            output::success(&format!("deleted closed option record {id}"));
            Ok(())
        }
    }
}

async fn list(services: &Services, owner: UserId, filter: ListFilter) -> Result<()> {
    let stocks = services.editor.list_closed_stocks(owner, &filter).await?;
    let options = services.editor.list_closed_options(owner, &filter).await?;

    output::payload("closed_stocks", &stocks, |stocks| {
        output::section("Closed stock");
        if stocks.is_empty() {
            output::note("(none)");
        } else {
            output::table(Table::new(stocks.iter().map(ClosedStockRow::from)));
        }
    });
    output::payload("closed_options", &options, |options| {
        output::section("Closed options");
        if options.is_empty() {
            output::note("(none)");
        } else {
            output::table(Table::new(options.iter().map(ClosedOptionRow::from)));
        }
    });
    Ok(())
}

async fn edit_stock(services: &Services, owner: UserId, args: EditClosedStockArgs) -> Result<()> {
    let record = services
        .editor
        .edit_closed_stock(
            owner,
            RecordId::new(args.id),
            ClosedStockEdit {
                quantity: args.quantity,
                cost_basis: args.cost_basis,
                sell_price: args.sell_price,
                open_date: args.open_date,
                close_date: args.close_date,
            },
        )
        .await?;

    output::payload("record", &record, |record| {
        output::success(&format!("updated closed stock record {}", args.id));
        output::field("Shares", record.quantity);
        output::field("Sell price", record.sell_price);
        output::field("P/L", record.profit_loss);
    });
    Ok(())
}

async fn edit_option(services: &Services, owner: UserId, args: EditClosedOptionArgs) -> Result<()> {
    let record = services
        .editor
        .edit_closed_option(
            owner,
            RecordId::new(args.id),
            ClosedOptionEdit {
                premium: args.premium,
                sell_price: args.sell_price,
                quantity: args.quantity,
                close_date: args.close_date,
            },
        )
        .await?;

    output::payload("record", &record, |record| {
        output::success(&format!("updated closed option record {}", args.id));
        output::field("Premium", record.premium);
        output::field("Sell price", record.sell_price);
        output::field("P/L", record.profit_loss);
    });
    Ok(())
}
