use crate::domain::currency::{Amount, Currency};
use crate::domain::ids::UserId;
use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};

/// Units of green granted to every freshly created wallet.
///
/// The grant is applied through the ledger at registration so the stipend
/// shows up in the transaction log like any other earn.
pub const STIPEND_GREEN: u32 = 5;

/// Read-only view of one wallet's three balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    pub green: u32,
    pub blue: u32,
    pub red: u32,
}

/// Per-user balances for the three currency tiers.
///
/// Balances are unsigned, so the "never negative" invariant holds by type;
/// [`Wallet::debit`] additionally refuses to underflow. These two primitives
/// are the only code paths that mutate balances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub user_id: UserId,
    pub green: u32,
    pub blue: u32,
    pub red: u32,
}

impl Wallet {
    /// Creates an empty wallet; the stipend is credited by the engine.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            green: 0,
            blue: 0,
            red: 0,
        }
    }

    pub fn balance(&self, currency: Currency) -> u32 {
        match currency {
            Currency::Green => self.green,
            Currency::Blue => self.blue,
            Currency::Red => self.red,
        }
    }

    pub fn snapshot(&self) -> BalanceSnapshot {
        BalanceSnapshot {
            green: self.green,
            blue: self.blue,
            red: self.red,
        }
    }

    /// Increases one balance; a balance can never silently wrap.
    pub fn credit(&mut self, currency: Currency, amount: Amount) -> Result<()> {
        let balance = self.balance_mut(currency);
        *balance = balance
            .checked_add(amount.value())
            .ok_or_else(|| EngineError::InvalidAmount("balance overflow".to_string()))?;
        Ok(())
    }

    /// Decreases one balance if it covers the amount.
    pub fn debit(&mut self, currency: Currency, amount: Amount) -> Result<()> {
        let balance = self.balance_mut(currency);
        if *balance >= amount.value() {
            *balance -= amount.value();
            Ok(())
        } else {
            Err(EngineError::InsufficientFunds)
        }
    }

    fn balance_mut(&mut self, currency: Currency) -> &mut u32 {
        match currency {
            Currency::Green => &mut self.green,
            Currency::Blue => &mut self.blue,
            Currency::Red => &mut self.red,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amount(n: u32) -> Amount {
        Amount::new(n).unwrap()
    }

    #[test]
    fn test_new_wallet_is_empty() {
        let wallet = Wallet::new(UserId::new());
        assert_eq!(wallet.snapshot().green, 0);
        assert_eq!(wallet.snapshot().blue, 0);
        assert_eq!(wallet.snapshot().red, 0);
    }

    #[test]
    fn test_credit_and_debit() {
        let mut wallet = Wallet::new(UserId::new());
        wallet.credit(Currency::Blue, amount(3)).unwrap();
        assert_eq!(wallet.balance(Currency::Blue), 3);

        wallet.debit(Currency::Blue, amount(2)).unwrap();
        assert_eq!(wallet.balance(Currency::Blue), 1);
    }

    #[test]
    fn test_credit_overflow_rejected() {
        let mut wallet = Wallet::new(UserId::new());
        wallet.credit(Currency::Green, amount(u32::MAX)).unwrap();

        let result = wallet.credit(Currency::Green, amount(1));
        assert!(matches!(result, Err(EngineError::InvalidAmount(_))));
        // Balance untouched on failure
        assert_eq!(wallet.balance(Currency::Green), u32::MAX);
    }

    #[test]
    fn test_debit_insufficient() {
        let mut wallet = Wallet::new(UserId::new());
        wallet.credit(Currency::Green, amount(STIPEND_GREEN)).unwrap();
        let result = wallet.debit(Currency::Green, amount(STIPEND_GREEN + 1));
        assert!(matches!(result, Err(EngineError::InsufficientFunds)));
        // Balance untouched on failure
        assert_eq!(wallet.balance(Currency::Green), STIPEND_GREEN);
    }
}
