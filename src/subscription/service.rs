use std::sync::Arc;

use bytes::Bytes;
use futures::FutureExt;
use log::warn;

use super::registry::ChannelRegistry;
use crate::event::bus::{Bus, Handler};
use crate::event::model::{self, ChannelEvent};
use crate::integration::transport::{self, EventCallback};
use crate::message::model::Message;
use crate::{conversation, presence, user};

/// What a caller wants to hear about a conversation. Missing callbacks
/// simply drop that event family.
#[derive(Default)]
pub struct Callbacks {
    on_message: Option<Box<dyn Fn(&Message) + Send + Sync>>,
    on_typing: Option<Box<dyn Fn(&user::Id, bool) + Send + Sync>>,
    on_presence: Option<Box<dyn Fn(&user::Id, bool) + Send + Sync>>,
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_message(mut self, f: impl Fn(&Message) + Send + Sync + 'static) -> Self {
        self.on_message = Some(Box::new(f));
        self
    }

    /// Invoked with `true` on `typing` and `false` on `stop_typing`.
    pub fn on_typing(mut self, f: impl Fn(&user::Id, bool) + Send + Sync + 'static) -> Self {
        self.on_typing = Some(Box::new(f));
        self
    }

    /// Invoked with `true` when a user comes online, `false` when they
    /// drop off.
    pub fn on_presence(mut self, f: impl Fn(&user::Id, bool) + Send + Sync + 'static) -> Self {
        self.on_presence = Some(Box::new(f));
        self
    }
}

/// Bridges conversations to their external realtime channels: at most
/// one subscription per conversation, inbound frames fanned out through
/// the local bus, outbound events published via the registry.
pub struct SubscriptionHub {
    transport: transport::Transport,
    registry: Arc<ChannelRegistry>,
    bus: Arc<Bus>,
    presence: presence::Tracker,
}

impl SubscriptionHub {
    pub fn new(
        transport: transport::Transport,
        registry: Arc<ChannelRegistry>,
        bus: Arc<Bus>,
        presence: presence::Tracker,
    ) -> Arc<Self> {
        Arc::new(Self {
            transport,
            registry,
            bus,
            presence,
        })
    }
}

impl SubscriptionHub {
    /// Opens the conversation's channel and wires inbound events to the
    /// caller's callbacks.
    pub async fn subscribe(
        self: &Arc<Self>,
        conversation: &conversation::Id,
        user: &user::Id,
        callbacks: Callbacks,
    ) -> super::Result<()> {
        if self.registry.contains(conversation).await {
            return Err(super::Error::AlreadySubscribed(conversation.clone()));
        }

        let handle = self
            .transport
            .subscribe(&ChannelRegistry::topic(conversation))
            .await?;

        // inbound: raw frames => typed events => local bus
        for kind in model::KINDS {
            let hub = Arc::clone(self);
            let conversation_id = conversation.clone();
            let callback: EventCallback = Arc::new(move |payload: Bytes| {
                let hub = Arc::clone(&hub);
                let conversation = conversation_id.clone();
                async move { hub.deliver(&conversation, payload).await }.boxed()
            });
            self.transport.on_event(&handle, kind, callback).await?;
        }

        self.bus
            .attach(conversation.clone(), into_handler(callbacks))
            .await;
        self.registry.register(conversation.clone(), handle.clone()).await;

        if let Err(e) = self.transport.track_presence(&handle, user, true).await {
            warn!("could not track presence on {conversation}: {e}");
        }
        Ok(())
    }

    async fn deliver(&self, conversation: &conversation::Id, payload: Bytes) {
        let event = match serde_json::from_slice::<ChannelEvent>(&payload) {
            Ok(event) => event,
            Err(e) => {
                warn!("skipping malformed channel event: {e}");
                return;
            }
        };

        match event {
            ChannelEvent::PresenceState { online } => {
                self.presence
                    .sync(conversation, online.into_iter().collect())
                    .await;
            }
            event => self.bus.dispatch(conversation, &event).await,
        }
    }

    /// Tears down the channel and halts local delivery. The transport
    /// rejects handles it did not issue, so success is only reported
    /// for a subscription this hub actually owns.
    pub async fn unsubscribe(&self, conversation: &conversation::Id) -> super::Result<()> {
        let handle = self
            .registry
            .take(conversation)
            .await
            .ok_or_else(|| super::Error::NotSubscribed(conversation.clone()))?;

        self.bus.detach_conversation(conversation).await;
        self.transport.unsubscribe(handle).await?;
        Ok(())
    }

    pub async fn active(&self) -> Vec<conversation::Id> {
        self.registry.active().await
    }
}

fn into_handler(callbacks: Callbacks) -> Handler {
    Box::new(move |event: ChannelEvent| {
        match &event {
            ChannelEvent::NewMessage { message } => {
                if let Some(f) = &callbacks.on_message {
                    f(message);
                }
            }
            ChannelEvent::Typing { user } => {
                if let Some(f) = &callbacks.on_typing {
                    f(user, true);
                }
            }
            ChannelEvent::StopTyping { user } => {
                if let Some(f) = &callbacks.on_typing {
                    f(user, false);
                }
            }
            ChannelEvent::UserOnline { user } => {
                if let Some(f) = &callbacks.on_presence {
                    f(user, true);
                }
            }
            ChannelEvent::UserOffline { user } => {
                if let Some(f) = &callbacks.on_presence {
                    f(user, false);
                }
            }
            // snapshots are reconciled by the tracker, not delivered raw
            ChannelEvent::PresenceState { .. } => {}
        }
        futures::future::ready(Ok(())).boxed()
    })
}
