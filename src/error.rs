use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChatError>;

/// Failure taxonomy for the ordering assistant.
///
/// Handlers never surface these raw to the chat user: the dialogue engine
/// degrades every error into a conversational reply with a fallback option
/// set. The variants exist so the application layer can tell "guide the user"
/// apart from "retry later".
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("invalid transition: {0}")]
    InvalidTransition(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("payment provider error: {0}")]
    Provider(String),
    #[error("storage error: {0}")]
    Persistence(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ChatError {
    pub fn persistence<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Persistence(Box::new(err))
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        Self::persistence(err)
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for ChatError {
    fn from(err: rocksdb::Error) -> Self {
        Self::persistence(err)
    }
}
