use crate::application::events::EventBus;
use crate::application::retry_once;
use crate::domain::currency::{Amount, Currency};
use crate::domain::ids::UserId;
use crate::domain::ports::{
    DisputeStoreBox, EntityWrite, FriendshipStoreBox, LedgerStoreBox, UserStoreBox, WishStoreBox,
};
use crate::domain::transaction::{LedgerEntry, TxKind};
use crate::domain::user::User;
use crate::domain::wallet::{STIPEND_GREEN, Wallet};
use crate::error::Result;
use crate::infrastructure::in_memory::InMemoryStore;
use crate::infrastructure::locks::LockManager;

/// The entry point for all engine operations.
///
/// Owns the storage ports, the per-entity lock manager, and the event bus.
/// Request handlers may call any operation concurrently; atomicity is
/// guaranteed by the ledger's batch commit and the keyed locks, never by a
/// single-threaded assumption.
pub struct Engine {
    pub(crate) ledger: LedgerStoreBox,
    pub(crate) wishes: WishStoreBox,
    pub(crate) disputes: DisputeStoreBox,
    pub(crate) friendships: FriendshipStoreBox,
    pub(crate) users: UserStoreBox,
    pub(crate) locks: LockManager,
    pub(crate) events: EventBus,
}

/// Typed request for [`Engine::register_user`].
#[derive(Debug, Clone)]
pub struct RegisterUser {
    pub name: String,
    pub handle: String,
}

impl Engine {
    pub fn new(
        ledger: LedgerStoreBox,
        wishes: WishStoreBox,
        disputes: DisputeStoreBox,
        friendships: FriendshipStoreBox,
        users: UserStoreBox,
    ) -> Self {
        Self {
            ledger,
            wishes,
            disputes,
            friendships,
            users,
            locks: LockManager::new(),
            events: EventBus::new(),
        }
    }

    /// An engine over a single shared in-memory backend.
    pub fn in_memory() -> Self {
        let store = InMemoryStore::new();
        Self::new(
            Box::new(store.clone()),
            Box::new(store.clone()),
            Box::new(store.clone()),
            Box::new(store.clone()),
            Box::new(store),
        )
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Creates a user with a stipend-funded wallet.
    ///
    /// User row, wallet, and stipend credit land in one atomic commit; the
    /// grant appears in the transaction log like any other earn.
    pub async fn register_user(&self, req: RegisterUser) -> Result<User> {
        let user = User::new(req.name, req.handle)?;
        let stipend = [LedgerEntry::credit(
            user.id,
            Currency::Green,
            Amount::new(STIPEND_GREEN)?,
            TxKind::Earn,
            "initial stipend",
        )];
        let writes = [
            EntityWrite::User(user.clone()),
            EntityWrite::Wallet(Wallet::new(user.id)),
        ];
        self.ledger.commit(&stipend, &writes).await?;

        tracing::info!(user_id = %user.id, handle = %user.handle, "user registered");
        Ok(user)
    }

    pub async fn get_user(&self, user_id: UserId) -> Result<Option<User>> {
        retry_once!(self.users.get(user_id).await)
    }

    /// Case-insensitive name/handle search for the presentation layer.
    pub async fn search_users(&self, query: &str) -> Result<Vec<User>> {
        retry_once!(self.users.search(query).await)
    }

    pub(crate) fn wish_key(wish_id: crate::domain::ids::WishId) -> String {
        format!("wish:{wish_id}")
    }

    pub(crate) fn pair_key(a: UserId, b: UserId) -> String {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        format!("pair:{lo}:{hi}")
    }
}
