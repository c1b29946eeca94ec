use crate::domain::ids::UserId;
use crate::error::{EngineError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MAX_NAME_LEN: usize = 100;

/// Minimal identity record the engine needs for wallet creation and
/// name/handle search. Authentication lives outside the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub handle: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: impl Into<String>, handle: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let handle = handle.into();
        if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
            return Err(EngineError::Validation(format!(
                "name must be 1..={MAX_NAME_LEN} characters"
            )));
        }
        if handle.is_empty() || handle.contains(char::is_whitespace) {
            return Err(EngineError::Validation(
                "handle must be non-empty and contain no whitespace".to_string(),
            ));
        }
        Ok(Self {
            id: UserId::new(),
            name,
            handle,
            created_at: Utc::now(),
        })
    }

    /// Case-insensitive substring match over name and handle.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.name.to_lowercase().contains(&query) || self.handle.to_lowercase().contains(&query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_validation() {
        assert!(User::new("Alice", "alice").is_ok());
        assert!(User::new("Alice", "").is_err());
        assert!(User::new("Alice", "al ice").is_err());
        assert!(User::new("", "alice").is_err());
    }

    #[test]
    fn test_search_matches() {
        let user = User::new("Alice Cooper", "acooper").unwrap();
        assert!(user.matches("alice"));
        assert!(user.matches("COOP"));
        assert!(!user.matches("bob"));
    }
}
