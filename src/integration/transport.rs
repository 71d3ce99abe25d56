use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::future::BoxFuture;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::TransportError;
use crate::event::model::{self, ChannelEvent};
use crate::user;

type Result<T> = std::result::Result<T, TransportError>;

/// Callback invoked with the raw payload of an inbound channel event.
pub type EventCallback = Arc<dyn Fn(Bytes) -> BoxFuture<'static, ()> + Send + Sync>;

/// Opaque subscription handle. Owning a handle is what authorizes
/// publishing on and tearing down its topic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelHandle {
    id: Uuid,
    topic: String,
}

impl ChannelHandle {
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

/// Real-time transport collaborator: topic-scoped pub/sub plus presence
/// tracking, one handle per subscription.
#[async_trait]
pub trait RealtimeTransport: Send + Sync {
    async fn subscribe(&self, topic: &str) -> Result<ChannelHandle>;

    async fn publish(&self, handle: &ChannelHandle, kind: &str, payload: Bytes) -> Result<()>;

    async fn on_event(
        &self,
        handle: &ChannelHandle,
        kind: &str,
        callback: EventCallback,
    ) -> Result<()>;

    async fn track_presence(
        &self,
        handle: &ChannelHandle,
        user: &user::Id,
        online: bool,
    ) -> Result<()>;

    /// Handles the transport did not issue, or issued and already tore
    /// down, are rejected rather than reported as success.
    async fn unsubscribe(&self, handle: ChannelHandle) -> Result<()>;
}

pub type Transport = Arc<dyn RealtimeTransport>;

#[derive(Default)]
struct Subscriber {
    callbacks: HashMap<String, Vec<EventCallback>>,
    tracked: Option<user::Id>,
}

#[derive(Default)]
struct Topic {
    subscribers: HashMap<Uuid, Subscriber>,
}

impl Topic {
    fn online(&self) -> BTreeSet<user::Id> {
        self.subscribers
            .values()
            .filter_map(|s| s.tracked.clone())
            .collect()
    }

    fn callbacks_for(&self, kind: &str) -> Vec<EventCallback> {
        self.subscribers
            .values()
            .filter_map(|s| s.callbacks.get(kind))
            .flatten()
            .cloned()
            .collect()
    }
}

/// Loopback transport: every subscriber of a topic sees every published
/// event in-process. Backs the tests and the demo binary.
#[derive(Default)]
pub struct InProcessTransport {
    topics: RwLock<HashMap<String, Topic>>,
}

impl InProcessTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    async fn verify(&self, handle: &ChannelHandle) -> Result<()> {
        let topics = self.topics.read().await;
        topics
            .get(&handle.topic)
            .filter(|t| t.subscribers.contains_key(&handle.id))
            .map(|_| ())
            .ok_or(TransportError::UnknownHandle)
    }

    // collect under the lock, invoke outside it
    async fn fan_out(&self, topic: &str, kind: &str, payload: Bytes) {
        let callbacks = {
            let topics = self.topics.read().await;
            match topics.get(topic) {
                Some(t) => t.callbacks_for(kind),
                None => return,
            }
        };
        for callback in callbacks {
            callback(payload.clone()).await;
        }
    }

    async fn publish_presence(&self, topic: &str) {
        let snapshot = {
            let topics = self.topics.read().await;
            match topics.get(topic) {
                Some(t) => t.online(),
                None => return,
            }
        };
        let event = ChannelEvent::PresenceState {
            online: snapshot.into_iter().collect(),
        };
        self.fan_out(topic, model::PRESENCE_STATE, Bytes::from(&event))
            .await;
    }
}

#[async_trait]
impl RealtimeTransport for InProcessTransport {
    async fn subscribe(&self, topic: &str) -> Result<ChannelHandle> {
        let handle = ChannelHandle {
            id: Uuid::new_v4(),
            topic: topic.to_string(),
        };
        self.topics
            .write()
            .await
            .entry(topic.to_string())
            .or_default()
            .subscribers
            .insert(handle.id, Subscriber::default());
        Ok(handle)
    }

    async fn publish(&self, handle: &ChannelHandle, kind: &str, payload: Bytes) -> Result<()> {
        self.verify(handle).await?;
        self.fan_out(&handle.topic, kind, payload).await;
        Ok(())
    }

    async fn on_event(
        &self,
        handle: &ChannelHandle,
        kind: &str,
        callback: EventCallback,
    ) -> Result<()> {
        let mut topics = self.topics.write().await;
        let subscriber = topics
            .get_mut(&handle.topic)
            .and_then(|t| t.subscribers.get_mut(&handle.id))
            .ok_or(TransportError::UnknownHandle)?;
        subscriber
            .callbacks
            .entry(kind.to_string())
            .or_default()
            .push(callback);
        Ok(())
    }

    async fn track_presence(
        &self,
        handle: &ChannelHandle,
        user: &user::Id,
        online: bool,
    ) -> Result<()> {
        {
            let mut topics = self.topics.write().await;
            let subscriber = topics
                .get_mut(&handle.topic)
                .and_then(|t| t.subscribers.get_mut(&handle.id))
                .ok_or(TransportError::UnknownHandle)?;
            subscriber.tracked = online.then(|| user.clone());
        }
        self.publish_presence(&handle.topic).await;
        Ok(())
    }

    async fn unsubscribe(&self, handle: ChannelHandle) -> Result<()> {
        let was_tracking = {
            let mut topics = self.topics.write().await;
            let topic = topics
                .get_mut(&handle.topic)
                .ok_or(TransportError::UnknownHandle)?;
            let subscriber = topic
                .subscribers
                .remove(&handle.id)
                .ok_or(TransportError::UnknownHandle)?;
            if topic.subscribers.is_empty() {
                topics.remove(&handle.topic);
            }
            subscriber.tracked.is_some()
        };

        // remaining subscribers learn about the departure
        if was_tracking {
            self.publish_presence(&handle.topic).await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures::FutureExt;

    use super::*;

    fn recorder(counter: Arc<AtomicUsize>) -> EventCallback {
        Arc::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            futures::future::ready(()).boxed()
        })
    }

    #[tokio::test]
    async fn delivers_to_every_topic_subscriber() {
        let transport = InProcessTransport::new();
        let a = transport.subscribe("conversation:1").await.unwrap();
        let b = transport.subscribe("conversation:1").await.unwrap();

        let hits = Arc::new(AtomicUsize::new(0));
        transport.on_event(&a, "ping", recorder(hits.clone())).await.unwrap();
        transport.on_event(&b, "ping", recorder(hits.clone())).await.unwrap();

        transport
            .publish(&a, "ping", Bytes::from_static(b"{}"))
            .await
            .unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn rejects_foreign_handles() {
        let transport = InProcessTransport::new();
        let handle = transport.subscribe("conversation:1").await.unwrap();

        transport.unsubscribe(handle.clone()).await.unwrap();

        // the handle died with the subscription
        assert!(matches!(
            transport.unsubscribe(handle.clone()).await,
            Err(TransportError::UnknownHandle)
        ));
        assert!(matches!(
            transport
                .publish(&handle, "ping", Bytes::from_static(b"{}"))
                .await,
            Err(TransportError::UnknownHandle)
        ));
    }

    #[tokio::test]
    async fn topics_are_isolated() {
        let transport = InProcessTransport::new();
        let a = transport.subscribe("conversation:1").await.unwrap();
        let b = transport.subscribe("conversation:2").await.unwrap();

        let hits = Arc::new(AtomicUsize::new(0));
        transport.on_event(&b, "ping", recorder(hits.clone())).await.unwrap();

        transport
            .publish(&a, "ping", Bytes::from_static(b"{}"))
            .await
            .unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}
