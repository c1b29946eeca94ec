use crate::application::engine::Engine;
use crate::domain::currency::{Amount, CONVERSION_RATE, Currency};
use crate::domain::event::DomainEvent;
use crate::domain::friendship::FriendshipStatus;
use crate::domain::ids::UserId;
use crate::domain::transaction::{LedgerEntry, TxKind};
use crate::error::{EngineError, Result};

/// Fixed-rate conversion and friends-only gifting.
impl Engine {
    /// Converts `amount` source units into `amount / 10` target units.
    ///
    /// Only green->blue and blue->red are legal, the amount must be a
    /// positive multiple of the rate, and the operation is irreversible.
    /// Debit and credit commit as one atomic unit, debit row first.
    pub async fn convert(
        &self,
        user_id: UserId,
        from: Currency,
        to: Currency,
        amount: u32,
    ) -> Result<()> {
        if from.converts_to() != Some(to) {
            return Err(EngineError::InvalidConversionPair);
        }
        if amount == 0 || amount % CONVERSION_RATE != 0 {
            return Err(EngineError::InvalidAmount(format!(
                "conversion amount must be a positive multiple of {CONVERSION_RATE}"
            )));
        }

        let entries = [
            LedgerEntry::debit(
                user_id,
                from,
                Amount::new(amount)?,
                TxKind::Convert,
                format!("converted to {to}"),
            ),
            LedgerEntry::credit(
                user_id,
                to,
                Amount::new(amount / CONVERSION_RATE)?,
                TxKind::Convert,
                format!("converted from {from}"),
            ),
        ];
        self.ledger.commit(&entries, &[]).await?;

        self.events.emit(DomainEvent::CurrencyConverted {
            user_id,
            from,
            to,
            amount,
        });
        Ok(())
    }

    /// Transfers currency between friends.
    ///
    /// Friendship is a hard server-side rule: without an accepted edge the
    /// transfer fails before any balance is touched. The pair lock is held
    /// across the check and the transfer so a concurrent block or rejection
    /// cannot slip in between. Both log rows name the counterparty and land
    /// as one atomic unit, sender's debit first.
    pub async fn gift(
        &self,
        sender_id: UserId,
        receiver_id: UserId,
        currency: Currency,
        amount: u32,
    ) -> Result<()> {
        if sender_id == receiver_id {
            return Err(EngineError::InvalidSelfTransfer);
        }
        let amount = Amount::new(amount)?;

        let _guard = self
            .locks
            .lock(Self::pair_key(sender_id, receiver_id))
            .await;

        let edge = self.friendships.between(sender_id, receiver_id).await?;
        if !matches!(edge, Some(edge) if edge.status == FriendshipStatus::Accepted) {
            return Err(EngineError::NotFriends);
        }

        let sender = self
            .users
            .get(sender_id)
            .await?
            .ok_or(EngineError::NotFound("user"))?;
        let receiver = self
            .users
            .get(receiver_id)
            .await?
            .ok_or(EngineError::NotFound("user"))?;

        let entries = [
            LedgerEntry::debit(
                sender_id,
                currency,
                amount,
                TxKind::Spend,
                format!("gift to {}", receiver.handle),
            ),
            LedgerEntry::credit(
                receiver_id,
                currency,
                amount,
                TxKind::Earn,
                format!("gift from {}", sender.handle),
            ),
        ];
        self.ledger.commit(&entries, &[]).await?;

        self.events.emit(DomainEvent::CurrencyGifted {
            sender_id,
            receiver_id,
            currency,
            amount: amount.value(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::engine::RegisterUser;
    use crate::domain::transaction::TransactionFilter;
    use crate::domain::wallet::STIPEND_GREEN;

    async fn user(engine: &Engine, handle: &str) -> UserId {
        engine
            .register_user(RegisterUser {
                name: handle.to_string(),
                handle: handle.to_string(),
            })
            .await
            .unwrap()
            .id
    }

    async fn befriend(engine: &Engine, a: UserId, b: UserId) {
        let request = engine.request_friend(a, b).await.unwrap();
        engine.accept_friend(request.id, b).await.unwrap();
    }

    #[tokio::test]
    async fn test_convert_green_to_blue() {
        let engine = Engine::in_memory();
        let alice = user(&engine, "alice").await;
        engine
            .credit(alice, Currency::Green, 15, "top up", None)
            .await
            .unwrap();

        engine
            .convert(alice, Currency::Green, Currency::Blue, 10)
            .await
            .unwrap();

        let balance = engine.balance(alice).await.unwrap();
        assert_eq!(balance.green, STIPEND_GREEN + 5);
        assert_eq!(balance.blue, 1);

        // Two convert rows, debit first
        let filter = TransactionFilter {
            kind: Some(TxKind::Convert),
            ..Default::default()
        };
        let rows = engine.transactions(alice, &filter, 0).await.unwrap();
        assert_eq!(rows.len(), 2);
        // Newest first: the credit was written after the debit
        assert_eq!(rows[0].amount, 1);
        assert_eq!(rows[1].amount, -10);
    }

    #[tokio::test]
    async fn test_convert_rejects_bad_pair_and_amount() {
        let engine = Engine::in_memory();
        let alice = user(&engine, "alice").await;

        assert!(matches!(
            engine
                .convert(alice, Currency::Green, Currency::Red, 10)
                .await,
            Err(EngineError::InvalidConversionPair)
        ));
        assert!(matches!(
            engine
                .convert(alice, Currency::Blue, Currency::Green, 10)
                .await,
            Err(EngineError::InvalidConversionPair)
        ));
        // 25 is not a multiple of the rate
        assert!(matches!(
            engine
                .convert(alice, Currency::Green, Currency::Blue, 25)
                .await,
            Err(EngineError::InvalidAmount(_))
        ));
        assert!(matches!(
            engine
                .convert(alice, Currency::Green, Currency::Blue, 0)
                .await,
            Err(EngineError::InvalidAmount(_))
        ));
    }

    #[tokio::test]
    async fn test_convert_insufficient_funds() {
        let engine = Engine::in_memory();
        let alice = user(&engine, "alice").await;
        // Stipend is 5 green, below the rate
        let result = engine
            .convert(alice, Currency::Green, Currency::Blue, 10)
            .await;
        assert!(matches!(result, Err(EngineError::InsufficientFunds)));
        assert_eq!(engine.balance(alice).await.unwrap().green, STIPEND_GREEN);
    }

    #[tokio::test]
    async fn test_gift_between_friends() {
        let engine = Engine::in_memory();
        let alice = user(&engine, "alice").await;
        let bob = user(&engine, "bob").await;
        befriend(&engine, alice, bob).await;

        engine.gift(alice, bob, Currency::Green, 2).await.unwrap();

        assert_eq!(engine.balance(alice).await.unwrap().green, STIPEND_GREEN - 2);
        assert_eq!(engine.balance(bob).await.unwrap().green, STIPEND_GREEN + 2);

        let rows = engine
            .transactions(bob, &TransactionFilter::default(), 0)
            .await
            .unwrap();
        assert_eq!(rows[0].description, "gift from alice");
    }

    #[tokio::test]
    async fn test_gift_requires_friendship() {
        let engine = Engine::in_memory();
        let alice = user(&engine, "alice").await;
        let bob = user(&engine, "bob").await;

        let result = engine.gift(alice, bob, Currency::Green, 2).await;
        assert!(matches!(result, Err(EngineError::NotFriends)));
        // No balance change on either side
        assert_eq!(engine.balance(alice).await.unwrap().green, STIPEND_GREEN);
        assert_eq!(engine.balance(bob).await.unwrap().green, STIPEND_GREEN);
    }

    #[tokio::test]
    async fn test_gift_after_block_rejected() {
        let engine = Engine::in_memory();
        let alice = user(&engine, "alice").await;
        let bob = user(&engine, "bob").await;
        befriend(&engine, alice, bob).await;

        // Blocking tears down the accepted edge; the gift must see that
        engine.block(bob, alice).await.unwrap();
        let result = engine.gift(alice, bob, Currency::Green, 1).await;
        assert!(matches!(result, Err(EngineError::NotFriends)));
        assert_eq!(engine.balance(alice).await.unwrap().green, STIPEND_GREEN);
    }

    #[tokio::test]
    async fn test_gift_to_self_rejected() {
        let engine = Engine::in_memory();
        let alice = user(&engine, "alice").await;
        assert!(matches!(
            engine.gift(alice, alice, Currency::Green, 1).await,
            Err(EngineError::InvalidSelfTransfer)
        ));
    }

    #[tokio::test]
    async fn test_gift_insufficient_funds() {
        let engine = Engine::in_memory();
        let alice = user(&engine, "alice").await;
        let bob = user(&engine, "bob").await;
        befriend(&engine, alice, bob).await;

        let result = engine
            .gift(alice, bob, Currency::Green, STIPEND_GREEN + 1)
            .await;
        assert!(matches!(result, Err(EngineError::InsufficientFunds)));
        assert_eq!(engine.balance(bob).await.unwrap().green, STIPEND_GREEN);
    }
}
