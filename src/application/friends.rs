use crate::application::engine::Engine;
use crate::application::retry_once;
use crate::domain::event::DomainEvent;
use crate::domain::friendship::{Friendship, FriendshipStatus};
use crate::domain::ids::{FriendshipId, UserId};
use crate::domain::user::User;
use crate::error::{EngineError, Result};

/// Friendship machine: request, accept, reject, block, unblock.
impl Engine {
    /// Sends a friend request towards `target_id`.
    ///
    /// Refused while any edge already connects the pair: accepted means
    /// already friends, pending means a request is in flight, and blocked
    /// means the request is suppressed. A blocked requester learns nothing
    /// beyond `NotAuthorized`.
    pub async fn request_friend(&self, user_id: UserId, target_id: UserId) -> Result<Friendship> {
        if user_id == target_id {
            return Err(EngineError::SelfFriendRequest);
        }
        let _guard = self.locks.lock(Self::pair_key(user_id, target_id)).await;

        if let Some(edge) = self.friendships.between(user_id, target_id).await? {
            return Err(match edge.status {
                FriendshipStatus::Accepted => EngineError::AlreadyFriends,
                FriendshipStatus::Pending => EngineError::RequestAlreadyPending,
                FriendshipStatus::Blocked => EngineError::NotAuthorized,
            });
        }

        let request = Friendship::request(user_id, target_id);
        self.friendships.insert(request.clone()).await?;

        self.events.emit(DomainEvent::FriendRequested {
            request_id: request.id,
            from: user_id,
            to: target_id,
        });
        Ok(request)
    }

    /// Accepts a pending request; only its target may do so.
    pub async fn accept_friend(&self, request_id: FriendshipId, actor_id: UserId) -> Result<Friendship> {
        let edge = self
            .friendships
            .get(request_id)
            .await?
            .ok_or(EngineError::NotFound("friend request"))?;
        let _guard = self
            .locks
            .lock(Self::pair_key(edge.user_id, edge.friend_id))
            .await;

        let mut edge = self
            .friendships
            .get(request_id)
            .await?
            .ok_or(EngineError::NotFound("friend request"))?;
        if edge.friend_id != actor_id {
            return Err(EngineError::NotAuthorized);
        }
        if edge.status != FriendshipStatus::Pending {
            return Err(EngineError::IllegalTransition("request is not pending"));
        }
        edge.status = FriendshipStatus::Accepted;
        self.friendships.update(edge.clone()).await?;

        self.events.emit(DomainEvent::FriendAccepted {
            request_id: edge.id,
            from: edge.user_id,
            to: edge.friend_id,
        });
        Ok(edge)
    }

    /// Rejects a pending request, removing the edge; only its target may do so.
    pub async fn reject_friend(&self, request_id: FriendshipId, actor_id: UserId) -> Result<()> {
        let edge = self
            .friendships
            .get(request_id)
            .await?
            .ok_or(EngineError::NotFound("friend request"))?;
        let _guard = self
            .locks
            .lock(Self::pair_key(edge.user_id, edge.friend_id))
            .await;

        let edge = self
            .friendships
            .get(request_id)
            .await?
            .ok_or(EngineError::NotFound("friend request"))?;
        if edge.friend_id != actor_id {
            return Err(EngineError::NotAuthorized);
        }
        if edge.status != FriendshipStatus::Pending {
            return Err(EngineError::IllegalTransition("request is not pending"));
        }
        self.friendships.delete(edge.id).await
    }

    /// Blocks `target_id`, overwriting any existing edge between the pair.
    /// Idempotent.
    pub async fn block(&self, user_id: UserId, target_id: UserId) -> Result<()> {
        if user_id == target_id {
            return Err(EngineError::Validation("cannot block yourself".to_string()));
        }
        let _guard = self.locks.lock(Self::pair_key(user_id, target_id)).await;

        if let Some(edge) = self.friendships.between(user_id, target_id).await? {
            if edge.status == FriendshipStatus::Blocked && edge.user_id == user_id {
                return Ok(());
            }
            self.friendships.delete(edge.id).await?;
        }
        self.friendships
            .insert(Friendship::block(user_id, target_id))
            .await
    }

    /// Removes this user's block on `target_id`; a no-op if none exists.
    pub async fn unblock(&self, user_id: UserId, target_id: UserId) -> Result<()> {
        let _guard = self.locks.lock(Self::pair_key(user_id, target_id)).await;

        if let Some(edge) = self.friendships.between(user_id, target_id).await?
            && edge.status == FriendshipStatus::Blocked
            && edge.user_id == user_id
        {
            self.friendships.delete(edge.id).await?;
        }
        Ok(())
    }

    /// Accepted friends, viewed from either side of the edge.
    pub async fn friends_of(&self, user_id: UserId) -> Result<Vec<User>> {
        let edges = retry_once!(self.friendships.edges_of(user_id).await)?;
        let mut friends = Vec::new();
        for edge in edges {
            if edge.status != FriendshipStatus::Accepted {
                continue;
            }
            if let Some(user) = self.users.get(edge.other_end(user_id)).await? {
                friends.push(user);
            }
        }
        Ok(friends)
    }

    /// Pending requests addressed to this user.
    pub async fn pending_requests_for(&self, user_id: UserId) -> Result<Vec<Friendship>> {
        let edges = retry_once!(self.friendships.edges_of(user_id).await)?;
        Ok(edges
            .into_iter()
            .filter(|edge| edge.status == FriendshipStatus::Pending && edge.friend_id == user_id)
            .collect())
    }
}
