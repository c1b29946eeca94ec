use crate::domain::ids::{FriendshipId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FriendshipStatus {
    Pending,
    Accepted,
    Blocked,
}

/// A directed relationship edge.
///
/// Stored directionally (`user_id` initiated towards `friend_id`) but
/// logically symmetric once accepted. A blocked edge is unilateral: it
/// suppresses future requests from the blocked party only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Friendship {
    pub id: FriendshipId,
    pub user_id: UserId,
    pub friend_id: UserId,
    pub status: FriendshipStatus,
    pub created_at: DateTime<Utc>,
}

impl Friendship {
    pub fn request(user_id: UserId, friend_id: UserId) -> Self {
        Self::with_status(user_id, friend_id, FriendshipStatus::Pending)
    }

    pub fn block(user_id: UserId, friend_id: UserId) -> Self {
        Self::with_status(user_id, friend_id, FriendshipStatus::Blocked)
    }

    fn with_status(user_id: UserId, friend_id: UserId, status: FriendshipStatus) -> Self {
        Self {
            id: FriendshipId::new(),
            user_id,
            friend_id,
            status,
            created_at: Utc::now(),
        }
    }

    /// Whether this edge connects `a` and `b` in either direction.
    pub fn connects(&self, a: UserId, b: UserId) -> bool {
        (self.user_id == a && self.friend_id == b) || (self.user_id == b && self.friend_id == a)
    }

    /// The end of the edge that is not `user`.
    pub fn other_end(&self, user: UserId) -> UserId {
        if self.user_id == user {
            self.friend_id
        } else {
            self.user_id
        }
    }
}
