use crate::application::engine::Engine;
use crate::application::retry_once;
use crate::domain::currency::{Amount, Currency, WISH_COST};
use crate::domain::event::DomainEvent;
use crate::domain::ids::{UserId, WishId};
use crate::domain::ports::EntityWrite;
use crate::domain::transaction::{LedgerEntry, TransactionFilter, TxKind};
use crate::domain::wish::{Wish, WishStatus};
use crate::error::{EngineError, Result};
use chrono::{DateTime, Utc};

/// Typed request for [`Engine::create_wish`].
#[derive(Debug, Clone)]
pub struct CreateWish {
    pub creator_id: UserId,
    pub title: String,
    pub description: String,
    pub currency: Currency,
    pub deadline: Option<DateTime<Utc>>,
}

/// How a wish listing scopes visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WishVisibility {
    /// Own wishes plus wishes created by accepted friends.
    FriendsOnly,
    /// Like `FriendsOnly`, but shows every wish while the user has no
    /// accepted friends yet. An onboarding affordance the caller opts into
    /// explicitly; it is not a hidden default.
    FallbackToAll,
}

/// Wish lifecycle: create, accept, complete, and the read-only projections.
impl Engine {
    /// Creates a wish, debiting the escrowed cost from the creator.
    ///
    /// Debit and wish row land in one atomic commit; a creator who cannot
    /// afford the cost gets `InsufficientFunds` and no wish row is written.
    pub async fn create_wish(&self, req: CreateWish) -> Result<Wish> {
        let wish = Wish::new(
            req.creator_id,
            req.title,
            req.description,
            req.currency,
            req.deadline,
        )?;

        let escrow = [LedgerEntry::debit(
            req.creator_id,
            req.currency,
            Amount::new(WISH_COST)?,
            TxKind::Spend,
            "wish creation",
        )
        .for_wish(wish.id)];
        self.ledger
            .commit(&escrow, &[EntityWrite::Wish(wish.clone())])
            .await?;

        tracing::info!(wish_id = %wish.id, creator = %wish.creator_id, "wish created");
        self.events.emit(DomainEvent::WishCreated {
            wish_id: wish.id,
            creator_id: wish.creator_id,
            currency: wish.currency,
        });
        Ok(wish)
    }

    /// active -> in_progress, assigning the actor.
    pub async fn accept_wish(&self, wish_id: WishId, actor_id: UserId) -> Result<Wish> {
        let _guard = self.locks.lock(Self::wish_key(wish_id)).await;

        let mut wish = self
            .wishes
            .get(wish_id)
            .await?
            .ok_or(EngineError::NotFound("wish"))?;
        wish.accept(actor_id)?;
        self.wishes.update(wish.clone()).await?;

        self.events.emit(DomainEvent::WishAccepted {
            wish_id,
            assignee_id: actor_id,
        });
        Ok(wish)
    }

    /// in_progress -> completed, releasing the escrowed unit to the assignee.
    ///
    /// Status change and credit land in one atomic commit, so a storage
    /// failure can never pay the assignee while the wish stays in progress;
    /// the wish lock keeps concurrent transitions out while both land.
    pub async fn complete_wish(&self, wish_id: WishId, actor_id: UserId) -> Result<Wish> {
        let _guard = self.locks.lock(Self::wish_key(wish_id)).await;

        let mut wish = self
            .wishes
            .get(wish_id)
            .await?
            .ok_or(EngineError::NotFound("wish"))?;
        wish.complete(actor_id)?;

        let reward = [LedgerEntry::credit(
            actor_id,
            wish.currency,
            Amount::new(WISH_COST)?,
            TxKind::Earn,
            "wish fulfilled",
        )
        .for_wish(wish.id)];
        self.ledger
            .commit(&reward, &[EntityWrite::Wish(wish.clone())])
            .await?;

        tracing::info!(wish_id = %wish.id, assignee = %actor_id, "wish completed");
        self.events.emit(DomainEvent::WishCompleted {
            wish_id: wish.id,
            creator_id: wish.creator_id,
            assignee_id: actor_id,
            currency: wish.currency,
        });
        Ok(wish)
    }

    pub async fn get_wish(&self, wish_id: WishId) -> Result<Option<Wish>> {
        retry_once!(self.wishes.get(wish_id).await)
    }

    /// Wishes visible to `user_id` under the given scoping rule.
    pub async fn list_wishes(
        &self,
        user_id: UserId,
        visibility: WishVisibility,
    ) -> Result<Vec<Wish>> {
        let friends: Vec<UserId> = self
            .friends_of(user_id)
            .await?
            .into_iter()
            .map(|user| user.id)
            .collect();

        let all = retry_once!(self.wishes.all().await)?;
        if friends.is_empty() && visibility == WishVisibility::FallbackToAll {
            return Ok(all);
        }
        Ok(all
            .into_iter()
            .filter(|wish| wish.creator_id == user_id || friends.contains(&wish.creator_id))
            .collect())
    }

    // Read-only projections the achievement collaborator polls.

    pub async fn wishes_created_count(&self, user_id: UserId) -> Result<usize> {
        Ok(retry_once!(self.wishes.by_creator(user_id).await)?.len())
    }

    /// Wishes this user completed for other people.
    pub async fn wishes_fulfilled_count(&self, user_id: UserId) -> Result<usize> {
        let all = retry_once!(self.wishes.all().await)?;
        Ok(all
            .iter()
            .filter(|wish| {
                wish.status == WishStatus::Completed && wish.assignee_id == Some(user_id)
            })
            .count())
    }

    pub async fn has_converted(&self, user_id: UserId) -> Result<bool> {
        let filter = TransactionFilter {
            kind: Some(TxKind::Convert),
            ..Default::default()
        };
        let rows = retry_once!(self.ledger.transactions(user_id, &filter, 0).await)?;
        Ok(!rows.is_empty())
    }

    pub async fn has_completed_red_wish(&self, user_id: UserId) -> Result<bool> {
        let all = retry_once!(self.wishes.all().await)?;
        Ok(all.iter().any(|wish| {
            wish.status == WishStatus::Completed
                && wish.currency == Currency::Red
                && wish.assignee_id == Some(user_id)
        }))
    }
}
