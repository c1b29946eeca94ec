use crate::application::engine::Engine;
use crate::application::retry_once;
use crate::domain::dispute::{Dispute, Resolution};
use crate::domain::event::DomainEvent;
use crate::domain::ids::{DisputeId, UserId, WishId};
use crate::domain::ports::EntityWrite;
use crate::error::{EngineError, Result};

/// Typed request for [`Engine::open_dispute`].
#[derive(Debug, Clone)]
pub struct OpenDispute {
    pub wish_id: WishId,
    pub disputer_id: UserId,
    pub comment: String,
    pub alternative_description: Option<String>,
}

/// Typed request for [`Engine::resolve_dispute`].
#[derive(Debug, Clone)]
pub struct ResolveDispute {
    pub dispute_id: DisputeId,
    pub resolver_id: UserId,
    pub action: Resolution,
    pub resolution_comment: Option<String>,
}

/// Dispute workflow: open against a live wish, resolved only by its creator.
impl Engine {
    /// Opens a dispute and moves the wish to `disputed`.
    ///
    /// Legal only against an active or in-progress wish, by a non-creator.
    /// A wish already in dispute accepts no further disputes.
    pub async fn open_dispute(&self, req: OpenDispute) -> Result<Dispute> {
        let dispute = Dispute::new(
            req.wish_id,
            req.disputer_id,
            req.comment,
            req.alternative_description,
        )?;

        let _guard = self.locks.lock(Self::wish_key(req.wish_id)).await;

        let mut wish = self
            .wishes
            .get(req.wish_id)
            .await?
            .ok_or(EngineError::NotFound("wish"))?;
        if wish.creator_id == req.disputer_id {
            return Err(EngineError::NotAuthorized);
        }
        wish.mark_disputed()?;

        // Dispute row and wish status land together or not at all
        self.ledger
            .commit(
                &[],
                &[
                    EntityWrite::Dispute(dispute.clone()),
                    EntityWrite::Wish(wish),
                ],
            )
            .await?;

        tracing::info!(wish_id = %req.wish_id, dispute_id = %dispute.id, "dispute opened");
        self.events.emit(DomainEvent::WishDisputed {
            wish_id: req.wish_id,
            dispute_id: dispute.id,
            disputer_id: req.disputer_id,
        });
        Ok(dispute)
    }

    /// Resolves a pending dispute.
    ///
    /// The wish reverts to its pre-dispute status on both branches; on
    /// accept the wish description is replaced by the dispute's alternative
    /// when one was supplied.
    pub async fn resolve_dispute(&self, req: ResolveDispute) -> Result<Dispute> {
        let dispute = self
            .disputes
            .get(req.dispute_id)
            .await?
            .ok_or(EngineError::NotFound("dispute"))?;

        let _guard = self.locks.lock(Self::wish_key(dispute.wish_id)).await;

        // Re-read under the wish lock; a concurrent resolve may have won.
        let mut dispute = self
            .disputes
            .get(req.dispute_id)
            .await?
            .ok_or(EngineError::NotFound("dispute"))?;
        let mut wish = self
            .wishes
            .get(dispute.wish_id)
            .await?
            .ok_or(EngineError::NotFound("wish"))?;
        if wish.creator_id != req.resolver_id {
            return Err(EngineError::NotAuthorized);
        }

        dispute.resolve(req.resolver_id, req.action, req.resolution_comment)?;
        wish.revert_from_dispute()?;
        if req.action == Resolution::Accept
            && let Some(alternative) = &dispute.alternative_description
        {
            wish.description = alternative.clone();
        }

        self.ledger
            .commit(
                &[],
                &[
                    EntityWrite::Dispute(dispute.clone()),
                    EntityWrite::Wish(wish),
                ],
            )
            .await?;

        tracing::info!(dispute_id = %dispute.id, outcome = ?dispute.status, "dispute resolved");
        self.events.emit(DomainEvent::DisputeResolved {
            dispute_id: dispute.id,
            wish_id: dispute.wish_id,
            resolver_id: req.resolver_id,
            outcome: dispute.status,
        });
        Ok(dispute)
    }

    pub async fn disputes_for_wish(&self, wish_id: WishId) -> Result<Vec<Dispute>> {
        retry_once!(self.disputes.for_wish(wish_id).await)
    }

    pub async fn disputes_by_user(&self, user_id: UserId) -> Result<Vec<Dispute>> {
        retry_once!(self.disputes.by_disputer(user_id).await)
    }

    /// Disputes raised against wishes this user created.
    pub async fn disputes_against_user(&self, user_id: UserId) -> Result<Vec<Dispute>> {
        let wishes = retry_once!(self.wishes.by_creator(user_id).await)?;
        let owned: Vec<WishId> = wishes.into_iter().map(|wish| wish.id).collect();
        let all = retry_once!(self.disputes.all().await)?;
        Ok(all
            .into_iter()
            .filter(|dispute| owned.contains(&dispute.wish_id))
            .collect())
    }
}
