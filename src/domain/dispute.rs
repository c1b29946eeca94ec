use crate::domain::ids::{DisputeId, UserId, WishId};
use crate::error::{EngineError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MAX_COMMENT_LEN: usize = 1000;
pub const MAX_ALTERNATIVE_LEN: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisputeStatus {
    Pending,
    Accepted,
    Rejected,
}

/// What the wish creator decides about a pending dispute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    Accept,
    Reject,
}

/// A contest raised against a wish by a non-creator.
///
/// Over-length text is rejected at construction, never truncated; truncation
/// is a presentation-layer courtesy, not an engine guarantee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dispute {
    pub id: DisputeId,
    pub wish_id: WishId,
    pub disputer_id: UserId,
    pub comment: String,
    pub alternative_description: Option<String>,
    pub status: DisputeStatus,
    pub resolution_comment: Option<String>,
    pub resolved_by: Option<UserId>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Dispute {
    pub fn new(
        wish_id: WishId,
        disputer_id: UserId,
        comment: impl Into<String>,
        alternative_description: Option<String>,
    ) -> Result<Self> {
        let comment = comment.into();
        if comment.is_empty() || comment.chars().count() > MAX_COMMENT_LEN {
            return Err(EngineError::Validation(format!(
                "comment must be 1..={MAX_COMMENT_LEN} characters"
            )));
        }
        if let Some(alternative) = &alternative_description
            && alternative.chars().count() > MAX_ALTERNATIVE_LEN
        {
            return Err(EngineError::Validation(format!(
                "alternative description must be at most {MAX_ALTERNATIVE_LEN} characters"
            )));
        }
        Ok(Self {
            id: DisputeId::new(),
            wish_id,
            disputer_id,
            comment,
            alternative_description,
            status: DisputeStatus::Pending,
            resolution_comment: None,
            resolved_by: None,
            resolved_at: None,
            created_at: Utc::now(),
        })
    }

    /// pending -> accepted | rejected, recording who resolved it and when.
    pub fn resolve(
        &mut self,
        resolver: UserId,
        action: Resolution,
        resolution_comment: Option<String>,
    ) -> Result<()> {
        if self.status != DisputeStatus::Pending {
            return Err(EngineError::IllegalTransition("dispute is not pending"));
        }
        self.status = match action {
            Resolution::Accept => DisputeStatus::Accepted,
            Resolution::Reject => DisputeStatus::Rejected,
        };
        self.resolved_by = Some(resolver);
        self.resolved_at = Some(Utc::now());
        self.resolution_comment = resolution_comment;
        Ok(())
    }
}
