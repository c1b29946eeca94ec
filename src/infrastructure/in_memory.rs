use crate::domain::dispute::Dispute;
use crate::domain::friendship::Friendship;
use crate::domain::ids::{DisputeId, FriendshipId, TxId, UserId, WishId};
use crate::domain::ports::{
    DisputeStore, EntityWrite, FriendshipStore, LedgerStore, UserStore, WishStore,
};
use crate::domain::transaction::{
    EntryDirection, LedgerEntry, PAGE_SIZE, Transaction, TransactionFilter,
};
use crate::domain::user::User;
use crate::domain::wallet::Wallet;
use crate::domain::wish::Wish;
use crate::error::{EngineError, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct State {
    users: HashMap<UserId, User>,
    wallets: HashMap<UserId, Wallet>,
    log: Vec<Transaction>,
    wishes: HashMap<WishId, Wish>,
    disputes: HashMap<DisputeId, Dispute>,
    friendships: HashMap<FriendshipId, Friendship>,
}

/// A thread-safe in-memory backend implementing every storage port.
///
/// All entities live behind a single `RwLock`, so a ledger `commit` stages
/// its wallet mutations and lands them together with the log rows and any
/// companion entity rows inside one write guard. That guard is the atomic
/// unit that makes a concurrent double-spend impossible. `Clone` shares the
/// underlying state.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for InMemoryStore {
    async fn wallet(&self, user_id: UserId) -> Result<Option<Wallet>> {
        let state = self.state.read().await;
        Ok(state.wallets.get(&user_id).cloned())
    }

    async fn commit(
        &self,
        entries: &[LedgerEntry],
        writes: &[EntityWrite],
    ) -> Result<Vec<Transaction>> {
        let mut state = self.state.write().await;

        // Stage every wallet mutation before landing anything, so a failed
        // debit anywhere in the batch leaves no trace. Freshly written
        // wallets are staged first so the batch's own entries find them.
        let mut staged: HashMap<UserId, Wallet> = HashMap::new();
        for write in writes {
            if let EntityWrite::Wallet(wallet) = write {
                staged.insert(wallet.user_id, wallet.clone());
            }
        }
        for entry in entries {
            let wallet = match staged.entry(entry.user_id) {
                Entry::Occupied(slot) => slot.into_mut(),
                Entry::Vacant(slot) => {
                    let wallet = state
                        .wallets
                        .get(&entry.user_id)
                        .cloned()
                        .ok_or(EngineError::NotFound("wallet"))?;
                    slot.insert(wallet)
                }
            };
            match entry.direction {
                EntryDirection::Credit => wallet.credit(entry.currency, entry.amount)?,
                EntryDirection::Debit => wallet.debit(entry.currency, entry.amount)?,
            }
        }

        let rows: Vec<Transaction> = entries
            .iter()
            .map(|entry| Transaction {
                id: TxId::new(),
                user_id: entry.user_id,
                kind: entry.kind,
                currency: entry.currency,
                amount: entry.signed_amount(),
                description: entry.description.clone(),
                related_wish_id: entry.related_wish_id,
                created_at: Utc::now(),
            })
            .collect();

        for write in writes {
            match write {
                EntityWrite::User(user) => {
                    state.users.insert(user.id, user.clone());
                }
                EntityWrite::Wish(wish) => {
                    state.wishes.insert(wish.id, wish.clone());
                }
                EntityWrite::Dispute(dispute) => {
                    state.disputes.insert(dispute.id, dispute.clone());
                }
                // Staged with the entries above
                EntityWrite::Wallet(_) => {}
            }
        }
        for wallet in staged.into_values() {
            state.wallets.insert(wallet.user_id, wallet);
        }
        state.log.extend(rows.iter().cloned());
        Ok(rows)
    }

    async fn transactions(
        &self,
        user_id: UserId,
        filter: &TransactionFilter,
        page: usize,
    ) -> Result<Vec<Transaction>> {
        let state = self.state.read().await;
        // The log is append-only, so reverse order is newest first.
        Ok(state
            .log
            .iter()
            .rev()
            .filter(|tx| tx.user_id == user_id && filter.matches(tx))
            .skip(page * PAGE_SIZE)
            .take(PAGE_SIZE)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl WishStore for InMemoryStore {
    async fn get(&self, wish_id: WishId) -> Result<Option<Wish>> {
        let state = self.state.read().await;
        Ok(state.wishes.get(&wish_id).cloned())
    }

    async fn update(&self, wish: Wish) -> Result<()> {
        let mut state = self.state.write().await;
        state.wishes.insert(wish.id, wish);
        Ok(())
    }

    async fn by_creator(&self, creator_id: UserId) -> Result<Vec<Wish>> {
        let state = self.state.read().await;
        Ok(state
            .wishes
            .values()
            .filter(|wish| wish.creator_id == creator_id)
            .cloned()
            .collect())
    }

    async fn all(&self) -> Result<Vec<Wish>> {
        let state = self.state.read().await;
        Ok(state.wishes.values().cloned().collect())
    }
}

#[async_trait]
impl DisputeStore for InMemoryStore {
    async fn get(&self, dispute_id: DisputeId) -> Result<Option<Dispute>> {
        let state = self.state.read().await;
        Ok(state.disputes.get(&dispute_id).cloned())
    }

    async fn for_wish(&self, wish_id: WishId) -> Result<Vec<Dispute>> {
        let state = self.state.read().await;
        Ok(state
            .disputes
            .values()
            .filter(|dispute| dispute.wish_id == wish_id)
            .cloned()
            .collect())
    }

    async fn by_disputer(&self, user_id: UserId) -> Result<Vec<Dispute>> {
        let state = self.state.read().await;
        Ok(state
            .disputes
            .values()
            .filter(|dispute| dispute.disputer_id == user_id)
            .cloned()
            .collect())
    }

    async fn all(&self) -> Result<Vec<Dispute>> {
        let state = self.state.read().await;
        Ok(state.disputes.values().cloned().collect())
    }
}

#[async_trait]
impl FriendshipStore for InMemoryStore {
    async fn insert(&self, friendship: Friendship) -> Result<()> {
        let mut state = self.state.write().await;
        state.friendships.insert(friendship.id, friendship);
        Ok(())
    }

    async fn get(&self, id: FriendshipId) -> Result<Option<Friendship>> {
        let state = self.state.read().await;
        Ok(state.friendships.get(&id).cloned())
    }

    async fn update(&self, friendship: Friendship) -> Result<()> {
        let mut state = self.state.write().await;
        state.friendships.insert(friendship.id, friendship);
        Ok(())
    }

    async fn delete(&self, id: FriendshipId) -> Result<()> {
        let mut state = self.state.write().await;
        state.friendships.remove(&id);
        Ok(())
    }

    async fn between(&self, a: UserId, b: UserId) -> Result<Option<Friendship>> {
        let state = self.state.read().await;
        Ok(state
            .friendships
            .values()
            .find(|edge| edge.connects(a, b))
            .cloned())
    }

    async fn edges_of(&self, user_id: UserId) -> Result<Vec<Friendship>> {
        let state = self.state.read().await;
        Ok(state
            .friendships
            .values()
            .filter(|edge| edge.user_id == user_id || edge.friend_id == user_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn get(&self, user_id: UserId) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.get(&user_id).cloned())
    }

    async fn search(&self, query: &str) -> Result<Vec<User>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .filter(|user| user.matches(query))
            .cloned()
            .collect())
    }
}
