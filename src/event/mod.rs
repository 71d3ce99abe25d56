use std::sync::Arc;

use async_trait::async_trait;

use crate::conversation;
use crate::integration;

pub mod bus;
pub mod model;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub enum Error {
    #[error("no active channel for conversation: {0}")]
    NoChannel(conversation::Id),

    _Transport(#[from] integration::TransportError),
}

/// Outbound half of the realtime boundary: deliver one event to every
/// remote subscriber of a conversation's channel.
#[async_trait]
pub trait Broadcast: Send + Sync {
    async fn broadcast(
        &self,
        conversation: &conversation::Id,
        event: &model::ChannelEvent,
    ) -> Result<()>;
}

pub type Broadcaster = Arc<dyn Broadcast>;
