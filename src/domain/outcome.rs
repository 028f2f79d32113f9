//! How an option position left the book.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CloseOutcome {
    /// Bought or sold back on the market at a closing price.
    Closed,
    /// Expired worthless on its expiration date.
    Expired,
    /// Short put assigned, shares delivered at the strike.
    Assigned,
    /// Covered call exercised, shares called away.
    CalledAway,
}

impl CloseOutcome {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Expired => "expired",
            Self::Assigned => "assigned",
            Self::CalledAway => "called-away",
        }
    }
}

impl fmt::Display for CloseOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CloseOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "closed" => Ok(Self::Closed),
            "expired" => Ok(Self::Expired),
            "assigned" => Ok(Self::Assigned),
            "called-away" | "called_away" | "calledaway" => Ok(Self::CalledAway),
            other => Err(format!("unknown close outcome '{other}'")),
        }
    }
}
