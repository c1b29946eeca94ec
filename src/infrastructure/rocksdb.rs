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
use rocksdb::{ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

pub const CF_USERS: &str = "users";
pub const CF_WALLETS: &str = "wallets";
pub const CF_TRANSACTIONS: &str = "transactions";
pub const CF_WISHES: &str = "wishes";
pub const CF_DISPUTES: &str = "disputes";
pub const CF_FRIENDSHIPS: &str = "friendships";

const ALL_CFS: [&str; 6] = [
    CF_USERS,
    CF_WALLETS,
    CF_TRANSACTIONS,
    CF_WISHES,
    CF_DISPUTES,
    CF_FRIENDSHIPS,
];

/// A persistent backend using RocksDB, one column family per entity.
///
/// Values are JSON. Transaction-log keys are a big-endian timestamp prefix
/// followed by the row id, so a reverse iteration walks newest first.
/// `commit` serializes wallet check-then-write through an internal mutex and
/// lands every row of the batch, entity rows included, in one `WriteBatch`.
///
/// `Clone` shares the underlying `Arc<DB>`.
#[derive(Clone)]
pub struct RocksDbStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksDbStore {
    /// Opens or creates a RocksDB instance at the given path, ensuring all
    /// column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors: Vec<ColumnFamilyDescriptor> = ALL_CFS
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()))
            .collect();

        let db = DB::open_cf_descriptors(&opts, path, descriptors)
            .map_err(|e| EngineError::Storage(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| EngineError::Storage(format!("column family {name} not found")))
    }

    fn put<T: Serialize>(&self, cf: &str, key: &[u8], value: &T) -> Result<()> {
        let cf = self.cf(cf)?;
        let bytes =
            serde_json::to_vec(value).map_err(|e| EngineError::Storage(e.to_string()))?;
        self.db
            .put_cf(cf, key, bytes)
            .map_err(|e| EngineError::Storage(e.to_string()))
    }

    fn batch_put<T: Serialize>(
        &self,
        batch: &mut WriteBatch,
        cf: &str,
        key: &[u8],
        value: &T,
    ) -> Result<()> {
        let cf = self.cf(cf)?;
        let bytes =
            serde_json::to_vec(value).map_err(|e| EngineError::Storage(e.to_string()))?;
        batch.put_cf(cf, key, bytes);
        Ok(())
    }

    fn fetch<T: DeserializeOwned>(&self, cf: &str, key: &[u8]) -> Result<Option<T>> {
        let cf = self.cf(cf)?;
        let bytes = self
            .db
            .get_cf(cf, key)
            .map_err(|e| EngineError::Storage(e.to_string()))?;
        match bytes {
            Some(bytes) => Ok(Some(
                serde_json::from_slice(&bytes).map_err(|e| EngineError::Storage(e.to_string()))?,
            )),
            None => Ok(None),
        }
    }

    fn scan<T: DeserializeOwned>(&self, cf: &str) -> Result<Vec<T>> {
        let cf = self.cf(cf)?;
        let mut items = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item.map_err(|e| EngineError::Storage(e.to_string()))?;
            items.push(
                serde_json::from_slice(&value).map_err(|e| EngineError::Storage(e.to_string()))?,
            );
        }
        Ok(items)
    }

    fn tx_key(tx: &Transaction) -> Vec<u8> {
        let mut key = Vec::with_capacity(24);
        key.extend_from_slice(&tx.created_at.timestamp_micros().to_be_bytes());
        key.extend_from_slice(tx.id.0.as_bytes());
        key
    }
}

#[async_trait]
impl LedgerStore for RocksDbStore {
    async fn wallet(&self, user_id: UserId) -> Result<Option<Wallet>> {
        self.fetch(CF_WALLETS, user_id.0.as_bytes())
    }

    async fn commit(
        &self,
        entries: &[LedgerEntry],
        writes: &[EntityWrite],
    ) -> Result<Vec<Transaction>> {
        let _guard = self.write_lock.lock().await;

        // Freshly written wallets are staged first so the batch's own
        // entries find them.
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
                    let wallet: Wallet = self
                        .fetch(CF_WALLETS, entry.user_id.0.as_bytes())?
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

        let mut batch = WriteBatch::default();
        for write in writes {
            match write {
                EntityWrite::User(user) => {
                    self.batch_put(&mut batch, CF_USERS, user.id.0.as_bytes(), user)?;
                }
                EntityWrite::Wish(wish) => {
                    self.batch_put(&mut batch, CF_WISHES, wish.id.0.as_bytes(), wish)?;
                }
                EntityWrite::Dispute(dispute) => {
                    self.batch_put(&mut batch, CF_DISPUTES, dispute.id.0.as_bytes(), dispute)?;
                }
                // Staged with the entries above
                EntityWrite::Wallet(_) => {}
            }
        }
        for wallet in staged.values() {
            self.batch_put(&mut batch, CF_WALLETS, wallet.user_id.0.as_bytes(), wallet)?;
        }
        for row in &rows {
            self.batch_put(&mut batch, CF_TRANSACTIONS, &Self::tx_key(row), row)?;
        }
        self.db
            .write(batch)
            .map_err(|e| EngineError::Storage(e.to_string()))?;

        Ok(rows)
    }

    async fn transactions(
        &self,
        user_id: UserId,
        filter: &TransactionFilter,
        page: usize,
    ) -> Result<Vec<Transaction>> {
        let cf = self.cf(CF_TRANSACTIONS)?;
        let mut matched = Vec::new();
        let mut skipped = 0usize;
        // Keys are timestamp-prefixed, so End-to-Start is newest first.
        for item in self.db.iterator_cf(cf, IteratorMode::End) {
            let (_key, value) = item.map_err(|e| EngineError::Storage(e.to_string()))?;
            let tx: Transaction =
                serde_json::from_slice(&value).map_err(|e| EngineError::Storage(e.to_string()))?;
            if tx.user_id != user_id || !filter.matches(&tx) {
                continue;
            }
            if skipped < page * PAGE_SIZE {
                skipped += 1;
                continue;
            }
            matched.push(tx);
            if matched.len() == PAGE_SIZE {
                break;
            }
        }
        Ok(matched)
    }
}

#[async_trait]
impl WishStore for RocksDbStore {
    async fn get(&self, wish_id: WishId) -> Result<Option<Wish>> {
        self.fetch(CF_WISHES, wish_id.0.as_bytes())
    }

    async fn update(&self, wish: Wish) -> Result<()> {
        self.put(CF_WISHES, wish.id.0.as_bytes(), &wish)
    }

    async fn by_creator(&self, creator_id: UserId) -> Result<Vec<Wish>> {
        let wishes: Vec<Wish> = self.scan(CF_WISHES)?;
        Ok(wishes
            .into_iter()
            .filter(|wish| wish.creator_id == creator_id)
            .collect())
    }

    async fn all(&self) -> Result<Vec<Wish>> {
        self.scan(CF_WISHES)
    }
}

#[async_trait]
impl DisputeStore for RocksDbStore {
    async fn get(&self, dispute_id: DisputeId) -> Result<Option<Dispute>> {
        self.fetch(CF_DISPUTES, dispute_id.0.as_bytes())
    }

    async fn for_wish(&self, wish_id: WishId) -> Result<Vec<Dispute>> {
        let disputes: Vec<Dispute> = self.scan(CF_DISPUTES)?;
        Ok(disputes
            .into_iter()
            .filter(|dispute| dispute.wish_id == wish_id)
            .collect())
    }

    async fn by_disputer(&self, user_id: UserId) -> Result<Vec<Dispute>> {
        let disputes: Vec<Dispute> = self.scan(CF_DISPUTES)?;
        Ok(disputes
            .into_iter()
            .filter(|dispute| dispute.disputer_id == user_id)
            .collect())
    }

    async fn all(&self) -> Result<Vec<Dispute>> {
        self.scan(CF_DISPUTES)
    }
}

#[async_trait]
impl FriendshipStore for RocksDbStore {
    async fn insert(&self, friendship: Friendship) -> Result<()> {
        self.put(CF_FRIENDSHIPS, friendship.id.0.as_bytes(), &friendship)
    }

    async fn get(&self, id: FriendshipId) -> Result<Option<Friendship>> {
        self.fetch(CF_FRIENDSHIPS, id.0.as_bytes())
    }

    async fn update(&self, friendship: Friendship) -> Result<()> {
        self.put(CF_FRIENDSHIPS, friendship.id.0.as_bytes(), &friendship)
    }

    async fn delete(&self, id: FriendshipId) -> Result<()> {
        let cf = self.cf(CF_FRIENDSHIPS)?;
        self.db
            .delete_cf(cf, id.0.as_bytes())
            .map_err(|e| EngineError::Storage(e.to_string()))
    }

    async fn between(&self, a: UserId, b: UserId) -> Result<Option<Friendship>> {
        let edges: Vec<Friendship> = self.scan(CF_FRIENDSHIPS)?;
        Ok(edges.into_iter().find(|edge| edge.connects(a, b)))
    }

    async fn edges_of(&self, user_id: UserId) -> Result<Vec<Friendship>> {
        let edges: Vec<Friendship> = self.scan(CF_FRIENDSHIPS)?;
        Ok(edges
            .into_iter()
            .filter(|edge| edge.user_id == user_id || edge.friend_id == user_id)
            .collect())
    }
}

#[async_trait]
impl UserStore for RocksDbStore {
    async fn get(&self, user_id: UserId) -> Result<Option<User>> {
        self.fetch(CF_USERS, user_id.0.as_bytes())
    }

    async fn search(&self, query: &str) -> Result<Vec<User>> {
        let users: Vec<User> = self.scan(CF_USERS)?;
        Ok(users.into_iter().filter(|user| user.matches(query)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::currency::{Amount, Currency};
    use crate::domain::transaction::TxKind;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_open_creates_column_families() {
        let dir = tempdir().unwrap();
        let store = RocksDbStore::open(dir.path()).unwrap();
        for name in ALL_CFS {
            assert!(store.db.cf_handle(name).is_some());
        }
    }

    async fn seed_wallet(store: &RocksDbStore, user: UserId) {
        store
            .commit(&[], &[EntityWrite::Wallet(Wallet::new(user))])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_wallet_round_trip() {
        let dir = tempdir().unwrap();
        let store = RocksDbStore::open(dir.path()).unwrap();
        let user = UserId::new();
        seed_wallet(&store, user).await;

        let loaded = LedgerStore::wallet(&store, user).await.unwrap().unwrap();
        assert_eq!(loaded, Wallet::new(user));

        assert!(
            LedgerStore::wallet(&store, UserId::new())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_commit_batches_and_lists_newest_first() {
        let dir = tempdir().unwrap();
        let store = RocksDbStore::open(dir.path()).unwrap();
        let user = UserId::new();
        seed_wallet(&store, user).await;

        for i in 0..3 {
            let entries = [LedgerEntry::credit(
                user,
                Currency::Green,
                Amount::new(1).unwrap(),
                TxKind::Earn,
                format!("row {i}"),
            )];
            store.commit(&entries, &[]).await.unwrap();
        }

        let page = store
            .transactions(user, &TransactionFilter::default(), 0)
            .await
            .unwrap();
        assert_eq!(page.len(), 3);
        assert_eq!(page[0].description, "row 2");
        assert_eq!(page[2].description, "row 0");

        let wallet = LedgerStore::wallet(&store, user).await.unwrap().unwrap();
        assert_eq!(wallet.green, 3);
    }

    #[tokio::test]
    async fn test_commit_rolls_back_on_insufficient_funds() {
        let dir = tempdir().unwrap();
        let store = RocksDbStore::open(dir.path()).unwrap();
        let user = UserId::new();
        seed_wallet(&store, user).await;

        let entries = [
            LedgerEntry::credit(user, Currency::Blue, Amount::new(2).unwrap(), TxKind::Earn, "a"),
            LedgerEntry::debit(user, Currency::Blue, Amount::new(5).unwrap(), TxKind::Spend, "b"),
        ];
        let wish = Wish::new(user, "stillborn", "", Currency::Blue, None).unwrap();
        let result = store.commit(&entries, &[EntityWrite::Wish(wish.clone())]).await;
        assert!(matches!(result, Err(EngineError::InsufficientFunds)));

        let wallet = LedgerStore::wallet(&store, user).await.unwrap().unwrap();
        assert_eq!(wallet.blue, 0);
        assert!(WishStore::get(&store, wish.id).await.unwrap().is_none());
    }
}
