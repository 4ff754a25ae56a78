//! Stock decrement policy used by checkout.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// How checkout treats stock when an order asks for more than is on hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockPolicy {
    /// Decrement unconditionally. Stock may go negative; oversold orders are
    /// sorted out by staff.
    #[default]
    Unchecked,
    /// Reject the whole order if any line would take stock below zero.
    Guarded,
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown stock policy '{0}' (expected 'unchecked' or 'guarded')")]
pub struct ParseStockPolicyError(String);

impl FromStr for StockPolicy {
    type Err = ParseStockPolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unchecked" => Ok(Self::Unchecked),
            "guarded" => Ok(Self::Guarded),
            other => Err(ParseStockPolicyError(other.to_owned())),
        }
    }
}

impl fmt::Display for StockPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unchecked => "unchecked",
            Self::Guarded => "guarded",
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!("guarded".parse::<StockPolicy>().unwrap(), StockPolicy::Guarded);
        assert_eq!(" Unchecked ".parse::<StockPolicy>().unwrap(), StockPolicy::Unchecked);
        assert!("strict".parse::<StockPolicy>().is_err());
    }

    #[test]
    fn test_default_is_unchecked() {
        assert_eq!(StockPolicy::default(), StockPolicy::Unchecked);
        assert_eq!(StockPolicy::default().to_string(), "unchecked");
    }
}
