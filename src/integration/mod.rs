pub mod catalog;
pub mod identity;
pub mod transport;

/// Failure of the persistence collaborator. `Unavailable` is transient
/// and safe to retry; `Rejected` is not.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store rejected operation: {0}")]
    Rejected(String),
}

impl StoreError {
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Failure of the real-time transport collaborator.
#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    #[error("unknown channel handle")]
    UnknownHandle,
    #[error("channel unavailable: {0}")]
    Unavailable(String),
}
