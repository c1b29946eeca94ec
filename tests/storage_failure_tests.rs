mod common;

use async_trait::async_trait;
use common::{create_wish, register};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use wishledger::application::disputes::OpenDispute;
use wishledger::application::engine::Engine;
use wishledger::application::wishes::CreateWish;
use wishledger::domain::currency::Currency;
use wishledger::domain::ids::UserId;
use wishledger::domain::ports::{EntityWrite, LedgerStore};
use wishledger::domain::transaction::{LedgerEntry, Transaction, TransactionFilter};
use wishledger::domain::wallet::{STIPEND_GREEN, Wallet};
use wishledger::domain::wish::{Wish, WishStatus};
use wishledger::error::{EngineError, Result};
use wishledger::infrastructure::in_memory::InMemoryStore;

/// Ledger wrapper failing a set number of commits before recovering,
/// simulating a storage outage in the middle of an operation.
struct FlakyLedger {
    inner: InMemoryStore,
    failures: Arc<AtomicU32>,
}

#[async_trait]
impl LedgerStore for FlakyLedger {
    async fn wallet(&self, user_id: UserId) -> Result<Option<Wallet>> {
        self.inner.wallet(user_id).await
    }

    async fn commit(
        &self,
        entries: &[LedgerEntry],
        writes: &[EntityWrite],
    ) -> Result<Vec<Transaction>> {
        if self.failures.load(Ordering::SeqCst) > 0 {
            self.failures.fetch_sub(1, Ordering::SeqCst);
            return Err(EngineError::Storage("disk unavailable".to_string()));
        }
        self.inner.commit(entries, writes).await
    }

    async fn transactions(
        &self,
        user_id: UserId,
        filter: &TransactionFilter,
        page: usize,
    ) -> Result<Vec<Transaction>> {
        self.inner.transactions(user_id, filter, page).await
    }
}

fn flaky_engine() -> (Engine, Arc<AtomicU32>) {
    let store = InMemoryStore::new();
    let failures = Arc::new(AtomicU32::new(0));
    let ledger = FlakyLedger {
        inner: store.clone(),
        failures: failures.clone(),
    };
    let engine = Engine::new(
        Box::new(ledger),
        Box::new(store.clone()),
        Box::new(store.clone()),
        Box::new(store.clone()),
        Box::new(store),
    );
    (engine, failures)
}

async fn try_create_wish(engine: &Engine, creator_id: UserId) -> Result<Wish> {
    engine
        .create_wish(CreateWish {
            creator_id,
            title: "walk my dog".to_string(),
            description: String::new(),
            currency: Currency::Green,
            deadline: None,
        })
        .await
}

#[tokio::test]
async fn test_complete_commit_failure_pays_nothing_and_retry_pays_once() {
    let (engine, failures) = flaky_engine();
    let alice = register(&engine, "alice").await;
    let bob = register(&engine, "bob").await;
    let wish_id = create_wish(&engine, alice, "walk my dog", Currency::Green).await;
    engine.accept_wish(wish_id, bob).await.unwrap();

    failures.store(1, Ordering::SeqCst);
    let result = engine.complete_wish(wish_id, bob).await;
    assert!(matches!(result, Err(EngineError::Storage(_))));

    // The failed commit left neither the credit nor the status change
    let wish = engine.get_wish(wish_id).await.unwrap().unwrap();
    assert_eq!(wish.status, WishStatus::InProgress);
    assert_eq!(engine.balance(bob).await.unwrap().green, STIPEND_GREEN);

    // Retrying after the outage pays exactly once
    engine.complete_wish(wish_id, bob).await.unwrap();
    assert_eq!(engine.balance(bob).await.unwrap().green, STIPEND_GREEN + 1);

    // A further retry is rejected and mints nothing
    let result = engine.complete_wish(wish_id, bob).await;
    assert!(matches!(result, Err(EngineError::IllegalTransition(_))));
    assert_eq!(engine.balance(bob).await.unwrap().green, STIPEND_GREEN + 1);
}

#[tokio::test]
async fn test_create_commit_failure_destroys_nothing() {
    let (engine, failures) = flaky_engine();
    let alice = register(&engine, "alice").await;

    failures.store(1, Ordering::SeqCst);
    let result = try_create_wish(&engine, alice).await;
    assert!(matches!(result, Err(EngineError::Storage(_))));

    // No escrow burned, no wish row
    assert_eq!(engine.balance(alice).await.unwrap().green, STIPEND_GREEN);
    assert_eq!(engine.wishes_created_count(alice).await.unwrap(), 0);

    // The retry escrows one unit, not two
    try_create_wish(&engine, alice).await.unwrap();
    assert_eq!(engine.balance(alice).await.unwrap().green, STIPEND_GREEN - 1);
    assert_eq!(engine.wishes_created_count(alice).await.unwrap(), 1);
}

#[tokio::test]
async fn test_open_dispute_commit_failure_leaves_wish_untouched() {
    let (engine, failures) = flaky_engine();
    let alice = register(&engine, "alice").await;
    let bob = register(&engine, "bob").await;
    let wish_id = create_wish(&engine, alice, "paint my fence", Currency::Green).await;

    failures.store(1, Ordering::SeqCst);
    let result = engine
        .open_dispute(OpenDispute {
            wish_id,
            disputer_id: bob,
            comment: "not your fence".to_string(),
            alternative_description: None,
        })
        .await;
    assert!(matches!(result, Err(EngineError::Storage(_))));

    let wish = engine.get_wish(wish_id).await.unwrap().unwrap();
    assert_eq!(wish.status, WishStatus::Active);
    assert!(engine.disputes_for_wish(wish_id).await.unwrap().is_empty());

    engine
        .open_dispute(OpenDispute {
            wish_id,
            disputer_id: bob,
            comment: "not your fence".to_string(),
            alternative_description: None,
        })
        .await
        .unwrap();
    let wish = engine.get_wish(wish_id).await.unwrap().unwrap();
    assert_eq!(wish.status, WishStatus::Disputed);
    assert_eq!(engine.disputes_for_wish(wish_id).await.unwrap().len(), 1);
}
