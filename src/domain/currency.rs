use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Source units consumed per target unit on a conversion.
pub const CONVERSION_RATE: u32 = 10;

/// Cost of creating a wish, in units of the wish's own currency.
pub const WISH_COST: u32 = 1;

/// The three currency tiers, ordered from most to least common.
///
/// Conversion only moves up the fixed chain green -> blue -> red; there is no
/// inverse operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    Green,
    Blue,
    Red,
}

impl Currency {
    /// The tier this currency converts into, if any.
    pub fn converts_to(self) -> Option<Currency> {
        match self {
            Currency::Green => Some(Currency::Blue),
            Currency::Blue => Some(Currency::Red),
            Currency::Red => None,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Currency::Green => "green",
            Currency::Blue => "blue",
            Currency::Red => "red",
        };
        f.write_str(s)
    }
}

/// A positive number of currency units.
///
/// Ensures transaction amounts are always strictly positive; zero and
/// negative quantities are unrepresentable in engine requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Amount(u32);

impl Amount {
    pub fn new(value: u32) -> Result<Self> {
        if value > 0 {
            Ok(Self(value))
        } else {
            Err(EngineError::InvalidAmount(
                "amount must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for Amount {
    type Error = EngineError;

    fn try_from(value: u32) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Amount> for u32 {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_validation() {
        assert!(Amount::new(1).is_ok());
        assert!(matches!(
            Amount::new(0),
            Err(EngineError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_conversion_chain() {
        assert_eq!(Currency::Green.converts_to(), Some(Currency::Blue));
        assert_eq!(Currency::Blue.converts_to(), Some(Currency::Red));
        assert_eq!(Currency::Red.converts_to(), None);
    }
}
