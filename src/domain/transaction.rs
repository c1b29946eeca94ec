use crate::domain::currency::{Amount, Currency};
use crate::domain::ids::{TxId, UserId, WishId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of rows returned per page of transaction history.
pub const PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxKind {
    Earn,
    Spend,
    Convert,
}

/// One immutable row of the append-only transaction log.
///
/// A row records exactly one balance mutation; the `amount` is negative for
/// spends. Rows are never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TxId,
    pub user_id: UserId,
    pub kind: TxKind,
    pub currency: Currency,
    pub amount: i64,
    pub description: String,
    pub related_wish_id: Option<WishId>,
    pub created_at: DateTime<Utc>,
}

/// A requested balance mutation, applied by the ledger store.
///
/// Batches of entries commit all-or-nothing: every debit in the batch is
/// checked against the wallet inside the store's atomic unit, and either the
/// whole batch lands (one log row per entry, in order) or nothing does.
#[derive(Debug, Clone)]
pub struct LedgerEntry {
    pub user_id: UserId,
    pub kind: TxKind,
    pub currency: Currency,
    pub amount: Amount,
    pub direction: EntryDirection,
    pub description: String,
    pub related_wish_id: Option<WishId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryDirection {
    Credit,
    Debit,
}

impl LedgerEntry {
    pub fn credit(
        user_id: UserId,
        currency: Currency,
        amount: Amount,
        kind: TxKind,
        description: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            kind,
            currency,
            amount,
            direction: EntryDirection::Credit,
            description: description.into(),
            related_wish_id: None,
        }
    }

    pub fn debit(
        user_id: UserId,
        currency: Currency,
        amount: Amount,
        kind: TxKind,
        description: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            kind,
            currency,
            amount,
            direction: EntryDirection::Debit,
            description: description.into(),
            related_wish_id: None,
        }
    }

    pub fn for_wish(mut self, wish_id: WishId) -> Self {
        self.related_wish_id = Some(wish_id);
        self
    }

    /// The signed amount this entry writes to the log.
    pub fn signed_amount(&self) -> i64 {
        match self.direction {
            EntryDirection::Credit => i64::from(self.amount.value()),
            EntryDirection::Debit => -i64::from(self.amount.value()),
        }
    }
}

/// Optional narrowing criteria for transaction history queries.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub currency: Option<Currency>,
    pub kind: Option<TxKind>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    /// Case-insensitive substring match over the description.
    pub search: Option<String>,
}

impl TransactionFilter {
    pub fn matches(&self, tx: &Transaction) -> bool {
        if let Some(currency) = self.currency
            && tx.currency != currency
        {
            return false;
        }
        if let Some(kind) = self.kind
            && tx.kind != kind
        {
            return false;
        }
        if let Some(from) = self.from
            && tx.created_at < from
        {
            return false;
        }
        if let Some(to) = self.to
            && tx.created_at > to
        {
            return false;
        }
        if let Some(search) = &self.search
            && !tx
                .description
                .to_lowercase()
                .contains(&search.to_lowercase())
        {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tx(description: &str) -> Transaction {
        Transaction {
            id: TxId::new(),
            user_id: UserId::new(),
            kind: TxKind::Earn,
            currency: Currency::Green,
            amount: 5,
            description: description.to_string(),
            related_wish_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_signed_amount() {
        let amount = Amount::new(3).unwrap();
        let credit = LedgerEntry::credit(
            UserId::new(),
            Currency::Green,
            amount,
            TxKind::Earn,
            "earned",
        );
        let debit = LedgerEntry::debit(
            UserId::new(),
            Currency::Green,
            amount,
            TxKind::Spend,
            "spent",
        );
        assert_eq!(credit.signed_amount(), 3);
        assert_eq!(debit.signed_amount(), -3);
    }

    #[test]
    fn test_filter_matches_search_case_insensitive() {
        let tx = sample_tx("Initial Stipend");
        let filter = TransactionFilter {
            search: Some("stipend".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&tx));

        let miss = TransactionFilter {
            search: Some("gift".to_string()),
            ..Default::default()
        };
        assert!(!miss.matches(&tx));
    }

    #[test]
    fn test_filter_kind_and_currency() {
        let tx = sample_tx("x");
        let filter = TransactionFilter {
            kind: Some(TxKind::Spend),
            ..Default::default()
        };
        assert!(!filter.matches(&tx));

        let filter = TransactionFilter {
            currency: Some(Currency::Green),
            kind: Some(TxKind::Earn),
            ..Default::default()
        };
        assert!(filter.matches(&tx));
    }
}
