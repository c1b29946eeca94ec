use crate::domain::currency::Currency;
use crate::domain::dispute::DisputeStatus;
use crate::domain::ids::{DisputeId, FriendshipId, UserId, WishId};
use serde::{Deserialize, Serialize};

/// Domain events emitted after a mutation commits.
///
/// Fire-and-forget fan-out for the notification and achievement
/// collaborators; at-least-once delivery is the consumer's concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    WishCreated {
        wish_id: WishId,
        creator_id: UserId,
        currency: Currency,
    },
    WishAccepted {
        wish_id: WishId,
        assignee_id: UserId,
    },
    WishCompleted {
        wish_id: WishId,
        creator_id: UserId,
        assignee_id: UserId,
        currency: Currency,
    },
    WishDisputed {
        wish_id: WishId,
        dispute_id: DisputeId,
        disputer_id: UserId,
    },
    DisputeResolved {
        dispute_id: DisputeId,
        wish_id: WishId,
        resolver_id: UserId,
        outcome: DisputeStatus,
    },
    CurrencyConverted {
        user_id: UserId,
        from: Currency,
        to: Currency,
        amount: u32,
    },
    CurrencyGifted {
        sender_id: UserId,
        receiver_id: UserId,
        currency: Currency,
        amount: u32,
    },
    FriendRequested {
        request_id: FriendshipId,
        from: UserId,
        to: UserId,
    },
    FriendAccepted {
        request_id: FriendshipId,
        from: UserId,
        to: UserId,
    },
}
