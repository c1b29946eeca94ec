use crate::application::engine::Engine;
use crate::application::retry_once;
use crate::domain::currency::{Amount, Currency};
use crate::domain::ids::{UserId, WishId};
use crate::domain::transaction::{LedgerEntry, Transaction, TransactionFilter, TxKind};
use crate::domain::wallet::BalanceSnapshot;
use crate::error::{EngineError, Result};

/// Direct ledger operations: credit, debit, and the read-only surface.
impl Engine {
    /// Increases a balance and appends one `earn` row.
    pub async fn credit(
        &self,
        user_id: UserId,
        currency: Currency,
        amount: u32,
        description: impl Into<String>,
        related_wish_id: Option<WishId>,
    ) -> Result<Transaction> {
        let mut entry = LedgerEntry::credit(
            user_id,
            currency,
            Amount::new(amount)?,
            TxKind::Earn,
            description,
        );
        entry.related_wish_id = related_wish_id;
        let mut rows = self.ledger.commit(&[entry], &[]).await?;
        Ok(rows.remove(0))
    }

    /// Decreases a balance and appends one `spend` row.
    ///
    /// The funds check and the mutation share the store's atomic unit, so
    /// concurrent debits cannot both pass against a stale balance.
    pub async fn debit(
        &self,
        user_id: UserId,
        currency: Currency,
        amount: u32,
        description: impl Into<String>,
        related_wish_id: Option<WishId>,
    ) -> Result<Transaction> {
        let mut entry = LedgerEntry::debit(
            user_id,
            currency,
            Amount::new(amount)?,
            TxKind::Spend,
            description,
        );
        entry.related_wish_id = related_wish_id;
        let mut rows = self.ledger.commit(&[entry], &[]).await?;
        Ok(rows.remove(0))
    }

    /// Snapshot of all three balances.
    pub async fn balance(&self, user_id: UserId) -> Result<BalanceSnapshot> {
        let wallet = retry_once!(self.ledger.wallet(user_id).await)?
            .ok_or(EngineError::NotFound("wallet"))?;
        Ok(wallet.snapshot())
    }

    /// One page of the user's transaction history, newest first.
    pub async fn transactions(
        &self,
        user_id: UserId,
        filter: &TransactionFilter,
        page: usize,
    ) -> Result<Vec<Transaction>> {
        retry_once!(self.ledger.transactions(user_id, filter, page).await)
    }
}
