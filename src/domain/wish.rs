use crate::domain::currency::Currency;
use crate::domain::ids::{UserId, WishId};
use crate::error::{EngineError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MAX_TITLE_LEN: usize = 100;
pub const MAX_DESCRIPTION_LEN: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WishStatus {
    Active,
    InProgress,
    Completed,
    Rejected,
    Disputed,
}

/// A request with an escrowed cost, moving through a fixed lifecycle.
///
/// The creator's wallet is debited when the wish is created; the escrowed
/// unit is released to the assignee on completion. Status and assignee are
/// mutated only through the transition methods below, which enforce the
/// legal transition graph:
///
/// ```text
/// (create)    -> active
/// active      -> in_progress | disputed
/// in_progress -> completed | disputed
/// disputed    -> active | in_progress | rejected
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wish {
    pub id: WishId,
    pub title: String,
    pub description: String,
    pub currency: Currency,
    pub status: WishStatus,
    pub creator_id: UserId,
    pub assignee_id: Option<UserId>,
    pub deadline: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Wish {
    pub fn new(
        creator_id: UserId,
        title: impl Into<String>,
        description: impl Into<String>,
        currency: Currency,
        deadline: Option<DateTime<Utc>>,
    ) -> Result<Self> {
        let title = title.into();
        let description = description.into();
        if title.is_empty() || title.chars().count() > MAX_TITLE_LEN {
            return Err(EngineError::Validation(format!(
                "title must be 1..={MAX_TITLE_LEN} characters"
            )));
        }
        if description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(EngineError::Validation(format!(
                "description must be at most {MAX_DESCRIPTION_LEN} characters"
            )));
        }
        let now = Utc::now();
        Ok(Self {
            id: WishId::new(),
            title,
            description,
            currency,
            status: WishStatus::Active,
            creator_id,
            assignee_id: None,
            deadline,
            created_at: now,
            updated_at: now,
        })
    }

    /// active -> in_progress, by anyone but the creator.
    pub fn accept(&mut self, actor: UserId) -> Result<()> {
        if self.status != WishStatus::Active {
            return Err(EngineError::IllegalTransition("wish is not active"));
        }
        if actor == self.creator_id {
            return Err(EngineError::IllegalTransition(
                "creator cannot accept their own wish",
            ));
        }
        self.status = WishStatus::InProgress;
        self.assignee_id = Some(actor);
        self.touch();
        Ok(())
    }

    /// in_progress -> completed, by the assignee only.
    pub fn complete(&mut self, actor: UserId) -> Result<()> {
        if self.status != WishStatus::InProgress {
            return Err(EngineError::IllegalTransition("wish is not in progress"));
        }
        if self.assignee_id != Some(actor) {
            return Err(EngineError::IllegalTransition(
                "only the assignee can complete a wish",
            ));
        }
        self.status = WishStatus::Completed;
        self.touch();
        Ok(())
    }

    /// active | in_progress -> disputed.
    pub fn mark_disputed(&mut self) -> Result<()> {
        match self.status {
            WishStatus::Active | WishStatus::InProgress => {
                self.status = WishStatus::Disputed;
                self.touch();
                Ok(())
            }
            _ => Err(EngineError::IllegalTransition(
                "only active or in-progress wishes can be disputed",
            )),
        }
    }

    /// disputed -> the pre-dispute status.
    ///
    /// An assignee exists iff the wish passed through `accept`, so the
    /// pre-dispute status is recomputable: no assignee means active.
    pub fn revert_from_dispute(&mut self) -> Result<()> {
        if self.status != WishStatus::Disputed {
            return Err(EngineError::IllegalTransition("wish is not disputed"));
        }
        self.status = if self.assignee_id.is_some() {
            WishStatus::InProgress
        } else {
            WishStatus::Active
        };
        self.touch();
        Ok(())
    }

    /// disputed -> rejected (terminal).
    pub fn reject(&mut self) -> Result<()> {
        if self.status != WishStatus::Disputed {
            return Err(EngineError::IllegalTransition("wish is not disputed"));
        }
        self.status = WishStatus::Rejected;
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
