use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Persistence failure: {0}")]
    Persistence(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Lock error: {0}")]
    LockPoisoned(String),
}

impl StoreError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence(message.into())
    }

    /// `true` for errors caused by caller input rather than the store itself.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl<T> From<std::sync::PoisonError<T>> for StoreError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockPoisoned(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
