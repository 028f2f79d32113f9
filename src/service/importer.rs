//! Import reconciler: decodes brokerage activity CSV and replays it
//! through the lifecycle services.

use std::path::Path;
use std::sync::{Arc, OnceLock};

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::domain::{
    ImportedTrades, OptionTrade, StockTrade, TradeCode, UserId,
};
use crate::error::{Error, Result};
use crate::port::outbound::LedgerStore;
use crate::service::locks::MutationLocks;
use crate::service::merger::LotMerger;
use crate::service::opener::{OpenRequest, OptionOpener};
use crate::service::resolver::CloseResolver;

/// Counts reported after an import. `stock_trades` counts share trades
/// replayed, `option_trades` counts contract trades that changed the book,
/// `skipped` counts rows dropped during decode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct ImportSummary {
    pub stock_trades: usize,
    pub option_trades: usize,
    pub skipped: usize,
}

/// Columns of the brokerage activity export.
const COL_DATE: usize = 0;
const COL_TICKER: usize = 3;
const COL_DESCRIPTION: usize = 4;
const COL_TRANS_CODE: usize = 5;
const COL_QUANTITY: usize = 6;
const COL_PRICE: usize = 7;
const COL_AMOUNT: usize = 8;
const MIN_COLUMNS: usize = 9;

/// "TICKER M/D/YYYY Call|Put $STRIKE" as the brokerage writes option
/// descriptions.
fn option_description_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([A-Z]+)\s+(\d{1,2}/\d{1,2}/\d{4})\s+(Call|Put)\s+\$?([\d,.]+)")
            .expect("option description regex is valid")
    })
}

fn parse_trade_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%m/%d/%Y")
        .or_else(|_| NaiveDate::parse_from_str(text, "%Y-%m-%d"))
        .ok()
}

/// Decimal from a brokerage currency cell: strips `$`, thousands commas
/// and quotes; parentheses negate.
fn parse_currency(text: &str) -> Option<Decimal> {
    let mut cleaned = text.trim().trim_matches('"').replace(['$', ','], "");
    if cleaned.starts_with('(') && cleaned.ends_with(')') {
        cleaned = format!("-{}", cleaned.trim_matches(['(', ')']));
    }
    cleaned.parse().ok()
}

/// Decode an activity CSV export into trades.
///
/// The first row is the header. Rows missing columns, a ticker, a
/// parsable date, or sensible numbers are dropped and counted in
/// [`ImportedTrades::skipped`]; an empty or header-only file is rejected
/// outright.
pub fn decode_activity_csv(content: &str) -> Result<ImportedTrades> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| Error::ImportParse(e.to_string()))?;
        if record.iter().any(|field| !field.trim().is_empty()) {
            rows.push(record);
        }
    }

    if rows.is_empty() {
        return Err(Error::ImportParse("CSV file is empty".to_string()));
    }
    if rows.len() < 2 {
        return Err(Error::ImportParse(
            "CSV only contains a header row".to_string(),
        ));
    }

    let mut trades = ImportedTrades::default();
    for row in &rows[1..] {
        if decode_row(row, &mut trades).is_none() {
            trades.skipped += 1;
        }
    }
    Ok(trades)
}

/// One row into a trade; `None` means the row is dropped.
fn decode_row(row: &csv::StringRecord, trades: &mut ImportedTrades) -> Option<()> {
    if row.len() < MIN_COLUMNS {
        return None;
    }

    let ticker = row[COL_TICKER].trim_matches(['"', ' ']).to_string();
    if ticker.is_empty() {
        return None;
    }
    let code: TradeCode = row[COL_TRANS_CODE].trim_matches(['"', ' ']).parse().ok()?;
    let date = parse_trade_date(&row[COL_DATE])?;
    let price_cell = row[COL_PRICE].trim();
    let price = if price_cell.is_empty() {
        Decimal::ZERO
    } else {
        parse_currency(price_cell)?
    };
    let amount = parse_currency(&row[COL_AMOUNT]).unwrap_or(Decimal::ZERO);
    let quantity_cell = row[COL_QUANTITY].trim();

    if code.is_stock() {
        let quantity: Decimal = quantity_cell.parse().ok()?;
        if quantity <= Decimal::ZERO {
            return None;
        }
        trades.stock_trades.push(StockTrade {
            date,
            ticker,
            code,
            quantity,
            price,
            amount,
        });
        return Some(());
    }

    // contract rows default to one contract when the column is blank
    let quantity: Decimal = if quantity_cell.is_empty() {
        Decimal::ONE
    } else {
        quantity_cell.parse().ok()?
    };
    if quantity <= Decimal::ZERO {
        return None;
    }

    let description = row[COL_DESCRIPTION].trim();
    let captures = option_description_re().captures(description)?;
    let contract_ticker = captures[1].to_string();
    let expiration = parse_trade_date(&captures[2])?;
    let kind = captures[3].parse().ok()?;
    let strike: Decimal = captures[4].replace(',', "").parse().ok()?;

    trades.option_trades.push(OptionTrade {
        date,
        ticker: contract_ticker,
        code,
        quantity,
        premium: price,
        strike,
        expiration,
        kind,
        amount,
    });
    Some(())
}

/// Replays decoded trades against the ledger in file order, share trades
/// first.
pub struct ImportReconciler<S> {
    merger: LotMerger<S>,
    opener: OptionOpener<S>,
    resolver: CloseResolver<S>,
}

impl<S: LedgerStore> ImportReconciler<S> {
    pub fn new(store: Arc<S>, locks: Arc<MutationLocks>) -> Self {
        Self {
            merger: LotMerger::new(Arc::clone(&store), Arc::clone(&locks)),
            opener: OptionOpener::new(Arc::clone(&store), Arc::clone(&locks)),
            resolver: CloseResolver::new(store, locks),
        }
    }

    /// Decode and replay a CSV file from disk.
    pub async fn import_file(&self, owner: UserId, path: &Path) -> Result<ImportSummary> {
        let content = tokio::fs::read_to_string(path).await?;
        self.import_str(owner, &content).await
    }

    /// Decode and replay CSV content. A decode failure aborts before any
    /// ledger mutation.
    pub async fn import_str(&self, owner: UserId, content: &str) -> Result<ImportSummary> {
        let trades = decode_activity_csv(content)?;
        self.reconcile(owner, &trades).await
    }

    /// Replay decoded trades. Buys and sells run through the lot merger,
    /// opens through the option opener, closes against the oldest matching
    /// open contract.
    pub async fn reconcile(
        &self,
        owner: UserId,
        trades: &ImportedTrades,
    ) -> Result<ImportSummary> {
        let mut summary = ImportSummary {
            skipped: trades.skipped,
            ..ImportSummary::default()
        };

        for trade in &trades.stock_trades {
            match trade.code {
                TradeCode::Buy => {
                    self.merger
                        .merge_buy(owner, &trade.ticker, trade.quantity, trade.price, trade.date)
                        .await?;
                }
                TradeCode::Sell => {
                    match self
                        .merger
                        .merge_sell(
                            owner,
                            &trade.ticker,
                            Some(trade.quantity),
                            trade.price,
                            trade.date,
                        )
                        .await
                    {
                        Ok(_) | Err(Error::NotFound(_)) => {
                            // a sell with nothing held is replayed as a no-op
                        }
                        Err(e) => return Err(e),
                    }
                }
                _ => continue,
            }
            summary.stock_trades += 1;
        }

        for trade in &trades.option_trades {
            if trade.code.opens_option() {
                self.opener
                    .open(
                        owner,
                        OpenRequest {
                            ticker: trade.ticker.clone(),
                            kind: trade.kind,
                            strike: trade.strike,
                            premium: trade.premium,
                            expiration: trade.expiration,
                            quantity: trade.quantity,
                            purchase_date: trade.date,
                        },
                    )
                    .await?;
                summary.option_trades += 1;
            } else {
                let closed = self
                    .resolver
                    .close_matched(
                        owner,
                        &trade.ticker,
                        trade.strike,
                        trade.expiration,
                        trade.kind,
                        trade.quantity,
                        trade.premium,
                        trade.date,
                    )
                    .await?;
                match closed {
                    Some(_) => summary.option_trades += 1,
                    None => {
                        debug!(
                            ticker = %trade.ticker,
                            code = %trade.code,
                            "no open position matches imported close"
                        );
                    }
                }
            }
        }

        info!(
            %owner,
            stock_trades = summary.stock_trades,
            option_trades = summary.option_trades,
            skipped = summary.skipped,
            "import reconciled"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::memory::MemoryLedgerStore;
    use crate::domain::OptionKind;
    use rust_decimal_macros::dec;

    const HEADER: &str = "\"Activity Date\",\"Process Date\",\"Settle Date\",\"Instrument\",\"Description\",\"Trans Code\",\"Quantity\",\"Price\",\"Amount\"";

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn owner() -> UserId {
        UserId::new(1)
    }

    fn fixture() -> (Arc<MemoryLedgerStore>, ImportReconciler<MemoryLedgerStore>) {
        let store = Arc::new(MemoryLedgerStore::new());
        let reconciler =
            ImportReconciler::new(Arc::clone(&store), Arc::new(MutationLocks::new()));
        (store, reconciler)
    }

    fn csv(rows: &[&str]) -> String {
        let mut out = String::from(HEADER);
        for row in rows {
            out.push('\n');
            out.push_str(row);
        }
        out
    }

    // ---------------------------------------------------------------------
    // decoding
    // ---------------------------------------------------------------------

    #[test]
    fn decodes_stock_buy_with_currency_noise() {
        let content = csv(&[
            r#""1/5/2024","1/5/2024","1/8/2024","AAPL","Apple","Buy","10","$1,150.00","($11,500.00)""#,
        ]);
        let trades = decode_activity_csv(&content).unwrap();

        assert_eq!(trades.stock_trades.len(), 1);
        let trade = &trades.stock_trades[0];
        assert_eq!(trade.ticker, "AAPL");
        assert_eq!(trade.code, TradeCode::Buy);
        assert_eq!(trade.price, dec!(1150.00));
        assert_eq!(trade.amount, dec!(-11500.00));
        assert_eq!(trade.date, date("2024-01-05"));
    }

    #[test]
    fn decodes_option_contract_from_description() {
        let content = csv(&[
            r#""5/1/2024","5/1/2024","5/2/2024","AAPL","AAPL 6/21/2024 Call $180.00","STO","2","$1.50","$300.00""#,
        ]);
        let trades = decode_activity_csv(&content).unwrap();

        assert_eq!(trades.option_trades.len(), 1);
        let trade = &trades.option_trades[0];
        assert_eq!(trade.kind, OptionKind::Call);
        assert_eq!(trade.strike, dec!(180.00));
        assert_eq!(trade.expiration, date("2024-06-21"));
        assert_eq!(trade.premium, dec!(1.50));
        assert_eq!(trade.quantity, dec!(2));
    }

    #[test]
    fn blank_option_quantity_defaults_to_one_contract() {
        let content = csv(&[
            r#""5/1/2024","5/1/2024","5/2/2024","AAPL","AAPL 6/21/2024 Put $50.00","BTO","","$1.50","($150.00)""#,
        ]);
        let trades = decode_activity_csv(&content).unwrap();
        assert_eq!(trades.option_trades[0].quantity, dec!(1));
    }

    #[test]
    fn skips_malformed_rows_but_keeps_good_ones() {
        let content = csv(&[
            // short row
            r#""1/5/2024","1/5/2024","AAPL""#,
            // blank ticker
            r#""1/5/2024","1/5/2024","1/8/2024","","Interest","Buy","10","$1.00","$10.00""#,
            // non-trade code
            r#""1/5/2024","1/5/2024","1/8/2024","AAPL","Dividend","CDIV","","","$2.08""#,
            // zero quantity
            r#""1/5/2024","1/5/2024","1/8/2024","AAPL","Apple","Sell","0","$150.00","$0.00""#,
            // option row without a parsable description
            r#""1/5/2024","1/5/2024","1/8/2024","AAPL","option expiration","STC","1","$1.00","$100.00""#,
            // good one
            r#""1/5/2024","1/5/2024","1/8/2024","AAPL","Apple","Buy","10","$150.00","($1,500.00)""#,
        ]);
        let trades = decode_activity_csv(&content).unwrap();

        assert_eq!(trades.skipped, 5);
        assert_eq!(trades.stock_trades.len(), 1);
        assert!(trades.option_trades.is_empty());
    }

    #[test]
    fn empty_file_is_rejected() {
        let err = decode_activity_csv("").unwrap_err();
        assert!(matches!(err, Error::ImportParse(_)));
    }

    #[test]
    fn header_only_file_is_rejected() {
        let err = decode_activity_csv(HEADER).unwrap_err();
        assert!(matches!(err, Error::ImportParse(_)));
    }

    // ---------------------------------------------------------------------
    // reconciliation
    // ---------------------------------------------------------------------

    #[tokio::test]
    async fn replays_buys_and_clamped_sells() {
        let (store, reconciler) = fixture();
        let content = csv(&[
            r#""1/5/2024","1/5/2024","1/8/2024","AAPL","Apple","Buy","100","$150.00","($15,000.00)""#,
            r#""3/1/2024","3/1/2024","3/4/2024","AAPL","Apple","Sell","150","$180.00","$27,000.00""#,
        ]);

        let summary = reconciler.import_str(owner(), &content).await.unwrap();
        assert_eq!(summary.stock_trades, 2);

        // sell clamps to the 100 shares held and empties the lot
        assert!(store.stock_lot(owner(), "AAPL").await.unwrap().is_none());
        let history = store.list_closed_stocks(owner()).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].quantity, dec!(100));
        assert_eq!(history[0].profit_loss, dec!(3000));
    }

    #[tokio::test]
    async fn sell_with_nothing_held_is_counted_noop() {
        let (store, reconciler) = fixture();
        let content = csv(&[
            r#""3/1/2024","3/1/2024","3/4/2024","AAPL","Apple","Sell","50","$180.00","$9,000.00""#,
        ]);

        let summary = reconciler.import_str(owner(), &content).await.unwrap();
        assert_eq!(summary.stock_trades, 1);
        assert!(store.list_closed_stocks(owner()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn opens_then_closes_against_oldest_match() {
        let (store, reconciler) = fixture();
        let content = csv(&[
            r#""5/10/2024","5/10/2024","5/13/2024","AAPL","AAPL 6/21/2024 Call $180.00","BTO","1","$2.00","($200.00)""#,
            r#""5/1/2024","5/1/2024","5/2/2024","AAPL","AAPL 6/21/2024 Call $180.00","BTO","1","$1.50","($150.00)""#,
            r#""6/1/2024","6/1/2024","6/3/2024","AAPL","AAPL 6/21/2024 Call $180.00","STC","1","$3.00","$300.00""#,
        ]);

        let summary = reconciler.import_str(owner(), &content).await.unwrap();
        assert_eq!(summary.option_trades, 3);

        let closed = store.list_closed_options(owner()).await.unwrap();
        assert_eq!(closed.len(), 1);
        // the 5/1 position goes first
        assert_eq!(closed[0].purchase_date, date("2024-05-01"));
        assert_eq!(closed[0].profit_loss, dec!(1.50));

        let open = store.list_option_positions(owner()).await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].purchase_date, date("2024-05-10"));
    }

    #[tokio::test]
    async fn sto_keeps_parsed_kind_and_btc_closes_it() {
        let (store, reconciler) = fixture();
        let content = csv(&[
            r#""5/1/2024","5/1/2024","5/2/2024","AAPL","AAPL 6/21/2024 Put $50.00","STO","1","$1.50","$150.00""#,
            r#""6/1/2024","6/1/2024","6/3/2024","AAPL","AAPL 6/21/2024 Put $50.00","BTC","1","$0.50","($50.00)""#,
        ]);

        let summary = reconciler.import_str(owner(), &content).await.unwrap();
        assert_eq!(summary.option_trades, 2);

        let closed = store.list_closed_options(owner()).await.unwrap();
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].kind, OptionKind::Put);
        // imported opens carry no collateral
        assert_eq!(closed[0].collateral, dec!(0));
        assert!(store.list_option_positions(owner()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn close_without_match_changes_nothing() {
        let (store, reconciler) = fixture();
        let content = csv(&[
            r#""6/1/2024","6/1/2024","6/3/2024","AAPL","AAPL 6/21/2024 Call $180.00","STC","1","$3.00","$300.00""#,
        ]);

        let summary = reconciler.import_str(owner(), &content).await.unwrap();
        assert_eq!(summary.option_trades, 0);
        assert!(store.list_closed_options(owner()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn decode_failure_leaves_ledger_untouched() {
        let (store, reconciler) = fixture();
        let err = reconciler.import_str(owner(), "").await.unwrap_err();
        assert!(matches!(err, Error::ImportParse(_)));
        assert!(store.list_stock_lots(owner()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn partial_option_close_splits_position() {
        let (store, reconciler) = fixture();
        let content = csv(&[
            r#""5/1/2024","5/1/2024","5/2/2024","AAPL","AAPL 6/21/2024 Call $180.00","BTO","3","$1.50","($450.00)""#,
            r#""6/1/2024","6/1/2024","6/3/2024","AAPL","AAPL 6/21/2024 Call $180.00","STC","2","$2.50","$500.00""#,
        ]);

        reconciler.import_str(owner(), &content).await.unwrap();

        let open = store.list_option_positions(owner()).await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].quantity, dec!(1));

        let closed = store.list_closed_options(owner()).await.unwrap();
        assert_eq!(closed[0].quantity, dec!(2));
        assert_eq!(closed[0].profit_loss, dec!(2));
    }
}
