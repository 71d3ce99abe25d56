use std::sync::Arc;

use crate::{conversation, integration};

pub mod registry;
pub mod service;

type Result<T> = std::result::Result<T, Error>;
pub type Hub = Arc<service::SubscriptionHub>;

#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub enum Error {
    #[error("already subscribed to conversation: {0}")]
    AlreadySubscribed(conversation::Id),
    #[error("no active subscription for conversation: {0}")]
    NotSubscribed(conversation::Id),

    _Transport(#[from] integration::TransportError),
}
