//! Option positions and closed-option history records.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ids::{PositionId, RecordId, UserId};
use super::money::{Price, Quantity};

/// Contract kind. Long legs (Call/Put) pay premium; short legs (CSP/CC)
/// collect it and carry collateral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionKind {
    Call,
    Put,
    /// Cash-secured put.
    Csp,
    /// Covered call.
    Cc,
}

impl OptionKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Call => "Call",
            Self::Put => "Put",
            Self::Csp => "CSP",
            Self::Cc => "CC",
        }
    }

    /// Short legs collect premium up front, so their P/L sign flips.
    #[must_use]
    pub fn is_short(&self) -> bool {
        matches!(self, Self::Csp | Self::Cc)
    }

    /// P/L for closing `quantity` contracts at `sell_price` against
    /// `premium`.
    #[must_use]
    pub fn profit_loss(&self, premium: Price, sell_price: Price, quantity: Quantity) -> Decimal {
        if self.is_short() {
            (premium - sell_price) * quantity
        } else {
            (sell_price - premium) * quantity
        }
    }
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "call" => Ok(Self::Call),
            "put" => Ok(Self::Put),
            "csp" => Ok(Self::Csp),
            "cc" => Ok(Self::Cc),
            other => Err(format!("unknown option kind '{other}'")),
        }
    }
}

/// An open option position. `price` is the per-contract premium paid or
/// collected at open; `collateral` backs short legs and is zero for long
/// ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionPosition {
    pub id: Option<PositionId>,
    pub owner: UserId,
    pub ticker: String,
    pub price: Price,
    pub premium: Price,
    pub strike: Price,
    pub expiration: NaiveDate,
    pub kind: OptionKind,
    pub collateral: Decimal,
    pub quantity: Quantity,
    pub purchase_date: NaiveDate,
}

impl OptionPosition {
    /// Collateral carried by `quantity` of this position's contracts,
    /// proportional to the open quantity.
    #[must_use]
    pub fn collateral_slice(&self, quantity: Quantity) -> Decimal {
        if self.quantity.is_zero() {
            return Decimal::ZERO;
        }
        self.collateral / self.quantity * quantity
    }
}

/// A realized option close. One row is appended per close; partial closes
/// of the same position produce multiple rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedOption {
    pub id: Option<RecordId>,
    pub owner: UserId,
    pub ticker: String,
    pub price: Price,
    pub premium: Price,
    pub strike: Price,
    pub expiration: NaiveDate,
    pub kind: OptionKind,
    pub collateral: Decimal,
    pub quantity: Quantity,
    pub purchase_date: NaiveDate,
    pub close_date: NaiveDate,
    pub sell_price: Price,
    pub profit_loss: Decimal,
}

impl ClosedOption {
    /// Return on risk: P/L over premium for long legs, over collateral for
    /// short legs. Zero denominators yield zero.
    #[must_use]
    pub fn ror(&self) -> Decimal {
        let denominator = if self.kind.is_short() {
            self.collateral
        } else {
            self.premium
        };
        if denominator.is_zero() {
            return Decimal::ZERO;
        }
        self.profit_loss / denominator
    }

    #[must_use]
    pub fn ror_percent(&self) -> Decimal {
        self.ror() * Decimal::ONE_HUNDRED
    }

    /// P/L as a percentage of premium plus collateral.
    #[must_use]
    pub fn pl_percent(&self) -> Decimal {
        let deployed = self.premium + self.collateral;
        if deployed.is_zero() {
            return Decimal::ZERO;
        }
        self.profit_loss / deployed * Decimal::ONE_HUNDRED
    }
}
