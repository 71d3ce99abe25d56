use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use crate::conversation;
use crate::event::model::ChannelEvent;
use crate::event::{self, Broadcast};
use crate::integration::transport::{self, ChannelHandle};

/// Conversation → channel handle map, one handle per conversation.
/// Holding the handle is what lets the rest of the core publish.
pub struct ChannelRegistry {
    transport: transport::Transport,
    channels: RwLock<HashMap<conversation::Id, ChannelHandle>>,
}

impl ChannelRegistry {
    pub fn new(transport: transport::Transport) -> Arc<Self> {
        Arc::new(Self {
            transport,
            channels: RwLock::new(HashMap::new()),
        })
    }

    pub fn topic(conversation: &conversation::Id) -> String {
        format!("conversation:{conversation}")
    }

    pub async fn register(&self, conversation: conversation::Id, handle: ChannelHandle) {
        self.channels.write().await.insert(conversation, handle);
    }

    pub async fn take(&self, conversation: &conversation::Id) -> Option<ChannelHandle> {
        self.channels.write().await.remove(conversation)
    }

    pub async fn get(&self, conversation: &conversation::Id) -> Option<ChannelHandle> {
        self.channels.read().await.get(conversation).cloned()
    }

    pub async fn contains(&self, conversation: &conversation::Id) -> bool {
        self.channels.read().await.contains_key(conversation)
    }

    pub async fn active(&self) -> Vec<conversation::Id> {
        self.channels.read().await.keys().cloned().collect()
    }
}

#[async_trait]
impl Broadcast for ChannelRegistry {
    async fn broadcast(
        &self,
        conversation: &conversation::Id,
        event: &ChannelEvent,
    ) -> event::Result<()> {
        let handle = self
            .get(conversation)
            .await
            .ok_or_else(|| event::Error::NoChannel(conversation.clone()))?;

        self.transport
            .publish(&handle, event.kind(), Bytes::from(event))
            .await?;
        Ok(())
    }
}
