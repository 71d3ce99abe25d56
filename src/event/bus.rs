use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use log::error;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::model::ChannelEvent;
use crate::conversation;

/// Subscriber callback. Failures are isolated: logged per subscriber,
/// never propagated to the publisher or to other subscribers.
pub type Handler = Box<dyn Fn(ChannelEvent) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct SubscriberId(Uuid);

struct Subscriber {
    conversation: conversation::Id,
    handler: Handler,
}

/// Local fan-out point for inbound channel events, scoped per
/// conversation.
#[derive(Default)]
pub struct Bus {
    subscribers: RwLock<HashMap<SubscriberId, Subscriber>>,
}

impl Bus {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn attach(&self, conversation: conversation::Id, handler: Handler) -> SubscriberId {
        let id = SubscriberId(Uuid::new_v4());
        self.subscribers
            .write()
            .await
            .insert(id, Subscriber { conversation, handler });
        id
    }

    pub async fn detach(&self, id: SubscriberId) -> bool {
        self.subscribers.write().await.remove(&id).is_some()
    }

    pub async fn detach_conversation(&self, conversation: &conversation::Id) {
        self.subscribers
            .write()
            .await
            .retain(|_, s| s.conversation != *conversation);
    }

    pub async fn dispatch(&self, conversation: &conversation::Id, event: &ChannelEvent) {
        let subscribers = self.subscribers.read().await;
        for (id, subscriber) in subscribers.iter() {
            if subscriber.conversation != *conversation {
                continue;
            }
            if let Err(e) = (subscriber.handler)(event.clone()).await {
                error!("subscriber {id:?} failed on {}: {e:?}", event.kind());
            }
        }
    }
}
