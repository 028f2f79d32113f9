//! Decoded brokerage trades, the input to the import reconciler.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::money::{Price, Quantity};
use super::option::OptionKind;

/// Brokerage transaction codes. Buy/Sell move shares, the rest move
/// contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeCode {
    Buy,
    Sell,
    /// Buy to open.
    Bto,
    /// Buy to close.
    Btc,
    /// Sell to open.
    Sto,
    /// Sell to close.
    Stc,
}

impl TradeCode {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "Buy",
            Self::Sell => "Sell",
            Self::Bto => "BTO",
            Self::Btc => "BTC",
            Self::Sto => "STO",
            Self::Stc => "STC",
        }
    }

    #[must_use]
    pub fn is_stock(&self) -> bool {
        matches!(self, Self::Buy | Self::Sell)
    }

    /// BTO and STO open new option positions.
    #[must_use]
    pub fn opens_option(&self) -> bool {
        matches!(self, Self::Bto | Self::Sto)
    }
}

impl fmt::Display for TradeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Buy" => Ok(Self::Buy),
            "Sell" => Ok(Self::Sell),
            "BTO" => Ok(Self::Bto),
            "BTC" => Ok(Self::Btc),
            "STO" => Ok(Self::Sto),
            "STC" => Ok(Self::Stc),
            other => Err(format!("unknown trade code '{other}'")),
        }
    }
}

/// One share trade from the activity file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockTrade {
    pub date: NaiveDate,
    pub ticker: String,
    pub code: TradeCode,
    pub quantity: Quantity,
    pub price: Price,
    pub amount: Decimal,
}

/// One option trade from the activity file. Strike, expiration and kind are
/// recovered from the description column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionTrade {
    pub date: NaiveDate,
    pub ticker: String,
    pub code: TradeCode,
    pub quantity: Quantity,
    pub premium: Price,
    pub strike: Price,
    pub expiration: NaiveDate,
    pub kind: OptionKind,
    pub amount: Decimal,
}

/// The decoded file: share trades and contract trades, each in file order.
/// `skipped` counts rows dropped for missing fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportedTrades {
    pub stock_trades: Vec<StockTrade>,
    pub option_trades: Vec<OptionTrade>,
    pub skipped: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trade_codes_parse_exact_brokerage_spelling() {
        assert_eq!("Buy".parse::<TradeCode>(), Ok(TradeCode::Buy));
        assert_eq!("STO".parse::<TradeCode>(), Ok(TradeCode::Sto));
        assert!("buy".parse::<TradeCode>().is_err());
        assert!("OEXP".parse::<TradeCode>().is_err());
    }

    #[test]
    fn code_classification() {
        assert!(TradeCode::Buy.is_stock());
        assert!(TradeCode::Sell.is_stock());
        assert!(!TradeCode::Btc.is_stock());
        assert!(TradeCode::Bto.opens_option());
        assert!(TradeCode::Sto.opens_option());
        assert!(!TradeCode::Stc.opens_option());
    }
}
