use thiserror::Error;

/// Stable failure kinds for every engine operation.
///
/// Business-rule violations are detected before any mutation is persisted, so
/// a returned error always means nothing was written. Storage failures are
/// wrapped as [`EngineError::Storage`]; no backend error type crosses the
/// engine boundary.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("insufficient funds")]
    InsufficientFunds,
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("invalid conversion pair")]
    InvalidConversionPair,
    #[error("cannot transfer to yourself")]
    InvalidSelfTransfer,
    #[error("users are not friends")]
    NotFriends,
    #[error("illegal transition: {0}")]
    IllegalTransition(&'static str),
    #[error("not authorized")]
    NotAuthorized,
    #[error("cannot send a friend request to yourself")]
    SelfFriendRequest,
    #[error("already friends")]
    AlreadyFriends,
    #[error("friend request already pending")]
    RequestAlreadyPending,
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
