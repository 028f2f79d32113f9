//! Command-line interface definitions.
//!
//! Defines the CLI structure for the wheelhouse application using `clap`.
//! Subcommands cover the trade lifecycle (buy, sell, open, close), ledger
//! maintenance, brokerage imports, statistics, and configuration.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;

use super::paths;
use crate::domain::{CloseOutcome, OptionKind};

/// Stock and option position lifecycle ledger
#[derive(Parser, Debug)]
#[command(name = "wheelhouse")]
#[command(version)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true, default_value_os_t = paths::default_config())]
    pub config: PathBuf,

    /// Override the SQLite database path
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Account id to operate on
    #[arg(short, long, global = true, default_value = "1")]
    pub user: i64,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase output verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the wheelhouse CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Buy shares, merging into the per-ticker lot
    Buy(BuyArgs),

    /// Sell shares from the per-ticker lot
    Sell(SellArgs),

    /// Open an option position
    Open(OpenArgs),

    /// Close an option position by id
    Close(CloseArgs),

    /// List and maintain open positions
    #[command(subcommand)]
    Positions(PositionsCommand),

    /// List and maintain closed-position history
    #[command(subcommand)]
    History(HistoryCommand),

    /// Import a brokerage activity CSV
    Import(ImportArgs),

    /// Show portfolio statistics
    Stats,

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Subcommands for `wheelhouse positions`.
#[derive(Subcommand, Debug)]
pub enum PositionsCommand {
    /// List open stock lots and option positions.
    List(FilterArgs),
    /// Edit an open stock lot.
    EditStock(EditStockLotArgs),
    /// Edit an open option position.
    EditOption(EditOptionPositionArgs),
    /// Delete an open stock lot.
    DeleteStock {
        /// Ticker symbol of the lot to delete.
        ticker: String,
    },
    /// Delete an open option position.
    DeleteOption {
        /// Id of the position to delete.
        id: i64,
    },
}

/// Subcommands for `wheelhouse history`.
#[derive(Subcommand, Debug)]
pub enum HistoryCommand {
    /// List closed stock and option records.
    List(FilterArgs),
    /// Edit a closed stock record.
    EditStock(EditClosedStockArgs),
    /// Edit a closed option record.
    EditOption(EditClosedOptionArgs),
    /// Delete a closed stock record.
    DeleteStock {
        /// Id of the record to delete.
        id: i64,
    },
    /// Delete a closed option record.
    DeleteOption {
        /// Id of the record to delete.
        id: i64,
    },
}

/// Subcommands for `wheelhouse config`.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Generate a new configuration file from template.
    Init(ConfigInitArgs),
    /// Display the effective configuration with defaults applied.
    Show,
    /// Validate the configuration file for correctness.
    Validate,
}

/// Arguments for the `buy` subcommand.
#[derive(Parser, Debug)]
pub struct BuyArgs {
    /// Ticker symbol.
    pub ticker: String,

    /// Number of shares to buy.
    pub quantity: Decimal,

    /// Price per share.
    pub price: Decimal,

    /// Trade date (YYYY-MM-DD, defaults to today).
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

/// Arguments for the `sell` subcommand.
#[derive(Parser, Debug)]
pub struct SellArgs {
    /// Ticker symbol.
    pub ticker: String,

    /// Sell price per share.
    pub price: Decimal,

    /// Number of shares to sell (defaults to the whole lot).
    #[arg(long)]
    pub quantity: Option<Decimal>,

    /// Trade date (YYYY-MM-DD, defaults to today).
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

/// Arguments for the `open` subcommand.
#[derive(Parser, Debug)]
pub struct OpenArgs {
    /// Ticker symbol.
    pub ticker: String,

    /// Contract kind (call, put, csp, cc).
    pub kind: OptionKind,

    /// Strike price.
    pub strike: Decimal,

    /// Per-contract premium.
    pub premium: Decimal,

    /// Expiration date (YYYY-MM-DD).
    pub expiration: NaiveDate,

    /// Number of contracts.
    #[arg(long, default_value = "1")]
    pub quantity: Decimal,

    /// Open date (YYYY-MM-DD, defaults to today).
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

/// Arguments for the `close` subcommand.
#[derive(Parser, Debug)]
pub struct CloseArgs {
    /// Id of the position to close.
    pub id: i64,

    /// How the position left the book (closed, expired, assigned,
    /// called-away).
    #[arg(short, long, default_value = "closed")]
    pub outcome: CloseOutcome,

    /// Number of contracts to close (defaults to all).
    #[arg(long)]
    pub quantity: Option<Decimal>,

    /// Closing price per contract (required for outcome "closed").
    #[arg(short, long)]
    pub price: Option<Decimal>,

    /// Share price at exercise (required for outcome "called-away").
    #[arg(long)]
    pub share_price: Option<Decimal>,

    /// Close date (YYYY-MM-DD, defaults to today).
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

impl From<FilterArgs> for crate::service::ListFilter {
    fn from(args: FilterArgs) -> Self {
        Self {
            ticker: args.ticker,
            kind: args.kind,
            from: args.from,
            to: args.to,
        }
    }
}

/// Listing filter shared by `positions list` and `history list`.
#[derive(Parser, Debug)]
pub struct FilterArgs {
    /// Only rows whose ticker contains this text (case-insensitive).
    #[arg(short, long)]
    pub ticker: Option<String>,

    /// Only option rows of this kind (call, put, csp, cc).
    #[arg(short, long)]
    pub kind: Option<OptionKind>,

    /// Earliest date to include (YYYY-MM-DD, inclusive).
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Latest date to include (YYYY-MM-DD, inclusive).
    #[arg(long)]
    pub to: Option<NaiveDate>,
}

/// Arguments for `positions edit-stock`.
#[derive(Parser, Debug)]
pub struct EditStockLotArgs {
    /// Ticker symbol of the lot to edit.
    pub ticker: String,

    /// New share count.
    #[arg(long)]
    pub quantity: Option<Decimal>,

    /// New average cost basis per share.
    #[arg(long)]
    pub cost_basis: Option<Decimal>,

    /// New open date (YYYY-MM-DD).
    #[arg(long)]
    pub open_date: Option<NaiveDate>,
}

/// Arguments for `positions edit-option`.
#[derive(Parser, Debug)]
pub struct EditOptionPositionArgs {
    /// Id of the position to edit.
    pub id: i64,

    /// New per-contract premium.
    #[arg(long)]
    pub premium: Option<Decimal>,

    /// New strike price.
    #[arg(long)]
    pub strike: Option<Decimal>,

    /// New expiration date (YYYY-MM-DD).
    #[arg(long)]
    pub expiration: Option<NaiveDate>,

    /// New contract kind (call, put, csp, cc).
    #[arg(long)]
    pub kind: Option<OptionKind>,

    /// New contract count.
    #[arg(long)]
    pub quantity: Option<Decimal>,

    /// New purchase date (YYYY-MM-DD).
    #[arg(long)]
    pub purchase_date: Option<NaiveDate>,
}

/// Arguments for `history edit-stock`.
#[derive(Parser, Debug)]
pub struct EditClosedStockArgs {
    /// Id of the record to edit.
    pub id: i64,

    /// New share count.
    #[arg(long)]
    pub quantity: Option<Decimal>,

    /// New cost basis per share.
    #[arg(long)]
    pub cost_basis: Option<Decimal>,

    /// New sell price per share.
    #[arg(long)]
    pub sell_price: Option<Decimal>,

    /// New open date (YYYY-MM-DD).
    #[arg(long)]
    pub open_date: Option<NaiveDate>,

    /// New close date (YYYY-MM-DD).
    #[arg(long)]
    pub close_date: Option<NaiveDate>,
}

/// Arguments for `history edit-option`.
#[derive(Parser, Debug)]
pub struct EditClosedOptionArgs {
    /// Id of the record to edit.
    pub id: i64,

    /// New per-contract premium.
    #[arg(long)]
    pub premium: Option<Decimal>,

    /// New closing price per contract.
    #[arg(long)]
    pub sell_price: Option<Decimal>,

    /// New contract count.
    #[arg(long)]
    pub quantity: Option<Decimal>,

    /// New close date (YYYY-MM-DD).
    #[arg(long)]
    pub close_date: Option<NaiveDate>,
}

/// Arguments for the `import` subcommand.
#[derive(Parser, Debug)]
pub struct ImportArgs {
    /// Path to the brokerage activity CSV file.
    pub file: PathBuf,
}

/// Arguments for the `config init` subcommand.
#[derive(Parser, Debug)]
pub struct ConfigInitArgs {
    /// Output path for the generated configuration file.
    #[arg(default_value_os_t = paths::default_config())]
    pub path: PathBuf,

    /// Overwrite the file if it already exists.
    #[arg(long)]
    pub force: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn buy_parses_positionals() {
        let cli = parse(&["wheelhouse", "buy", "AAPL", "100", "150.25"]);
        match cli.command {
            Commands::Buy(args) => {
                assert_eq!(args.ticker, "AAPL");
                assert_eq!(args.quantity, dec!(100));
                assert_eq!(args.price, dec!(150.25));
                assert!(args.date.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn sell_quantity_is_optional() {
        let cli = parse(&["wheelhouse", "sell", "AAPL", "180", "--date", "2024-02-01"]);
        match cli.command {
            Commands::Sell(args) => {
                assert!(args.quantity.is_none());
                assert_eq!(args.date, Some("2024-02-01".parse().unwrap()));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn open_parses_kind_and_defaults_quantity() {
        let cli = parse(&[
            "wheelhouse",
            "open",
            "AAPL",
            "csp",
            "50",
            "1.50",
            "2024-06-21",
        ]);
        match cli.command {
            Commands::Open(args) => {
                assert_eq!(args.kind, OptionKind::Csp);
                assert_eq!(args.quantity, dec!(1));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn close_outcome_defaults_to_closed() {
        let cli = parse(&["wheelhouse", "close", "7", "--price", "0.50"]);
        match cli.command {
            Commands::Close(args) => {
                assert_eq!(args.id, 7);
                assert_eq!(args.outcome, CloseOutcome::Closed);
                assert_eq!(args.price, Some(dec!(0.50)));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn close_accepts_called_away_outcome() {
        let cli = parse(&[
            "wheelhouse",
            "close",
            "7",
            "--outcome",
            "called-away",
            "--share-price",
            "165",
        ]);
        match cli.command {
            Commands::Close(args) => {
                assert_eq!(args.outcome, CloseOutcome::CalledAway);
                assert_eq!(args.share_price, Some(dec!(165)));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_flags_apply_after_subcommand() {
        let cli = parse(&["wheelhouse", "stats", "--user", "7", "--json"]);
        assert_eq!(cli.user, 7);
        assert!(cli.json);
    }

    #[test]
    fn positions_list_takes_filters() {
        let cli = parse(&[
            "wheelhouse",
            "positions",
            "list",
            "--ticker",
            "aap",
            "--kind",
            "csp",
            "--from",
            "2024-01-01",
        ]);
        match cli.command {
            Commands::Positions(PositionsCommand::List(filter)) => {
                assert_eq!(filter.ticker.as_deref(), Some("aap"));
                assert_eq!(filter.kind, Some(OptionKind::Csp));
                assert!(filter.to.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_kind() {
        let result = Cli::try_parse_from([
            "wheelhouse",
            "open",
            "AAPL",
            "straddle",
            "50",
            "1.50",
            "2024-06-21",
        ]);
        assert!(result.is_err());
    }
}
