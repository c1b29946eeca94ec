use crate::domain::dispute::Dispute;
use crate::domain::friendship::Friendship;
use crate::domain::ids::{DisputeId, FriendshipId, UserId, WishId};
use crate::domain::transaction::{LedgerEntry, Transaction, TransactionFilter};
use crate::domain::user::User;
use crate::domain::wallet::Wallet;
use crate::domain::wish::Wish;
use crate::error::Result;
use async_trait::async_trait;

/// An entity row committed in the same atomic unit as a ledger batch.
///
/// Operations that pair a balance mutation with a status change (wish
/// creation and completion, dispute open and resolve, registration) hand
/// their entity rows to [`LedgerStore::commit`] instead of writing them
/// through their own store, so a storage failure can never leave the money
/// moved but the status stale.
#[derive(Debug, Clone)]
pub enum EntityWrite {
    User(User),
    Wallet(Wallet),
    Wish(Wish),
    Dispute(Dispute),
}

/// Owns wallets, the append-only transaction log, and the atomic commit
/// point for multi-row mutations.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn wallet(&self, user_id: UserId) -> Result<Option<Wallet>>;

    /// Commits a batch of balance mutations and companion entity rows
    /// all-or-nothing.
    ///
    /// Every debit in the batch is checked against the wallet inside the
    /// store's own atomic unit, so two concurrent debits can never both pass
    /// the check against a stale balance. Entity rows land in the same unit:
    /// either the whole batch persists or none of it does. Log rows are
    /// written in entry order (debits are listed before credits by
    /// convention). `entries` may be empty when only entity rows need the
    /// atomic unit.
    async fn commit(
        &self,
        entries: &[LedgerEntry],
        writes: &[EntityWrite],
    ) -> Result<Vec<Transaction>>;

    /// One page of a user's history, newest first.
    async fn transactions(
        &self,
        user_id: UserId,
        filter: &TransactionFilter,
        page: usize,
    ) -> Result<Vec<Transaction>>;
}

/// Wish rows are created and status-changed through [`LedgerStore::commit`]
/// whenever money moves with them; `update` covers the money-free accept.
#[async_trait]
pub trait WishStore: Send + Sync {
    async fn get(&self, wish_id: WishId) -> Result<Option<Wish>>;
    async fn update(&self, wish: Wish) -> Result<()>;
    async fn by_creator(&self, creator_id: UserId) -> Result<Vec<Wish>>;
    async fn all(&self) -> Result<Vec<Wish>>;
}

/// Dispute rows are written through [`LedgerStore::commit`] together with
/// the wish status change; this port is the read side.
#[async_trait]
pub trait DisputeStore: Send + Sync {
    async fn get(&self, dispute_id: DisputeId) -> Result<Option<Dispute>>;
    async fn for_wish(&self, wish_id: WishId) -> Result<Vec<Dispute>>;
    async fn by_disputer(&self, user_id: UserId) -> Result<Vec<Dispute>>;
    async fn all(&self) -> Result<Vec<Dispute>>;
}

#[async_trait]
pub trait FriendshipStore: Send + Sync {
    async fn insert(&self, friendship: Friendship) -> Result<()>;
    async fn get(&self, id: FriendshipId) -> Result<Option<Friendship>>;
    async fn update(&self, friendship: Friendship) -> Result<()>;
    async fn delete(&self, id: FriendshipId) -> Result<()>;
    /// The edge between two users in either direction, if any.
    async fn between(&self, a: UserId, b: UserId) -> Result<Option<Friendship>>;
    async fn edges_of(&self, user_id: UserId) -> Result<Vec<Friendship>>;
}

/// User rows are written at registration through [`LedgerStore::commit`];
/// this port is the read side.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get(&self, user_id: UserId) -> Result<Option<User>>;
    async fn search(&self, query: &str) -> Result<Vec<User>>;
}

pub type LedgerStoreBox = Box<dyn LedgerStore>;
pub type WishStoreBox = Box<dyn WishStore>;
pub type DisputeStoreBox = Box<dyn DisputeStore>;
pub type FriendshipStoreBox = Box<dyn FriendshipStore>;
pub type UserStoreBox = Box<dyn UserStore>;
