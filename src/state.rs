use std::sync::Arc;

use log::error;

use crate::conversation::model::{Conversation, NewConversation};
use crate::event;
use crate::inquiry::model::{DealerInquiry, InquiryRequest};
use crate::integration::catalog::{self, StaticCatalog};
use crate::integration::identity::{self, StaticIdentity};
use crate::integration::transport::{self, InProcessTransport};
use crate::message::model::{Content, Message, Page};
use crate::subscription::service::Callbacks;
use crate::{
    conversation, inquiry, message, notification, presence, settings, subscription, typing, user,
};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub enum Error {
    #[error("no authenticated user")]
    Unauthenticated,

    _Conversation(#[from] conversation::Error),
    _Inquiry(#[from] inquiry::Error),
    _Message(#[from] message::Error),
    _Notification(#[from] notification::Error),
    _Subscription(#[from] subscription::Error),
}

/// Explicitly constructed service graph. Build one per client session,
/// pass it by reference, `shutdown` it when the session ends.
#[derive(Clone)]
pub struct AppContext {
    identity: identity::Provider,
    pub conversations: conversation::Service,
    pub messages: message::Service,
    pub notifications: notification::Service,
    pub presence: presence::Tracker,
    pub typing: typing::Coordinator,
    pub hub: subscription::Hub,
    pub inquiries: inquiry::Service,
}

impl AppContext {
    pub fn init(
        config: &settings::Config,
        conversation_repo: conversation::Repository,
        message_repo: message::Repository,
        notification_repo: notification::Repository,
        transport: transport::Transport,
        identity: identity::Provider,
        catalog: catalog::Catalog,
    ) -> Self {
        let bus = event::bus::Bus::new();
        let registry = subscription::registry::ChannelRegistry::new(Arc::clone(&transport));
        let broadcast: event::Broadcaster = registry.clone();

        let conversations =
            conversation::service::ConversationService::new(conversation_repo, config);
        let notifications =
            notification::service::NotificationService::new(notification_repo, config);
        let typing = typing::service::TypingCoordinator::new(broadcast.clone(), config);
        let presence = presence::service::PresenceTracker::new(
            conversations.clone(),
            broadcast.clone(),
            bus.clone(),
        );
        let messages = message::service::MessageService::new(
            message_repo,
            conversations.clone(),
            typing.clone(),
            notifications.clone(),
            broadcast,
            config,
        );
        let hub = subscription::service::SubscriptionHub::new(
            transport,
            registry,
            bus,
            presence.clone(),
        );
        let inquiries = inquiry::service::InquiryService::new(
            conversations.clone(),
            messages.clone(),
            catalog,
        );

        Self {
            identity,
            conversations,
            messages,
            notifications,
            presence,
            typing,
            hub,
            inquiries,
        }
    }

    /// Everything in-process: in-memory stores, loopback transport and
    /// a static identity. The extra values log users in and out and
    /// seed catalog cards.
    pub fn in_process(
        config: &settings::Config,
    ) -> (Self, Arc<StaticIdentity>, Arc<StaticCatalog>) {
        let identity = StaticIdentity::new();
        let catalog = StaticCatalog::new();
        let ctx = Self::init(
            config,
            conversation::repository::InMemoryConversations::new(),
            message::repository::InMemoryMessages::new(),
            notification::repository::InMemoryNotifications::new(),
            InProcessTransport::new(),
            identity.clone(),
            catalog.clone(),
        );
        (ctx, identity, catalog)
    }

    fn current_user(&self) -> Result<user::Id> {
        self.identity.current_user().ok_or(Error::Unauthenticated)
    }
}

impl AppContext {
    pub async fn create_conversation(&self, new: NewConversation) -> Result<Conversation> {
        let creator = self.current_user()?;
        let conversation = self.conversations.create(&creator, new).await?;
        Ok(conversation)
    }

    pub async fn get_conversations(
        &self,
        kind: Option<conversation::Kind>,
    ) -> Result<Vec<Conversation>> {
        let user = self.current_user()?;
        let conversations = self.conversations.find_all(&user, kind).await?;
        Ok(conversations)
    }

    pub async fn get_conversation(&self, id: &conversation::Id) -> Result<Conversation> {
        let conversation = self.conversations.get(id).await?;
        Ok(conversation)
    }

    pub async fn add_participant(
        &self,
        conversation: &conversation::Id,
        user: &user::Id,
        role: conversation::Role,
    ) -> Result<()> {
        self.current_user()?;
        self.conversations
            .add_participant(conversation, user, role)
            .await?;
        Ok(())
    }

    pub async fn remove_participant(
        &self,
        conversation: &conversation::Id,
        user: &user::Id,
    ) -> bool {
        self.conversations.remove_participant(conversation, user).await
    }

    pub async fn send_message(
        &self,
        conversation: &conversation::Id,
        content: Content,
    ) -> Result<Message> {
        let sender = self.current_user()?;
        let message = self.messages.send(&sender, conversation, content).await?;
        Ok(message)
    }

    pub async fn get_messages(
        &self,
        conversation: &conversation::Id,
        page: &Page,
    ) -> Result<Vec<Message>> {
        let messages = self.messages.find_range(conversation, page).await?;
        Ok(messages)
    }

    pub async fn mark_message_read(&self, id: &message::Id) -> Result<Message> {
        let user = self.current_user()?;
        let message = self.messages.mark_read(id, &user).await?;
        Ok(message)
    }

    pub async fn create_dealer_inquiry(&self, request: InquiryRequest) -> Result<DealerInquiry> {
        let buyer = self.current_user()?;
        let inquiry = self.inquiries.create(&buyer, request).await?;
        Ok(inquiry)
    }

    pub async fn subscribe(
        &self,
        conversation: &conversation::Id,
        callbacks: Callbacks,
    ) -> Result<()> {
        let user = self.current_user()?;
        self.hub.subscribe(conversation, &user, callbacks).await?;
        self.presence.join(conversation, &user).await;
        Ok(())
    }

    /// Reports the user offline, sweeps the conversation's typing
    /// timers and tears down the channel. Nothing stale fires after
    /// this returns.
    pub async fn unsubscribe(&self, conversation: &conversation::Id) -> Result<()> {
        if let Ok(user) = self.current_user() {
            self.presence.leave(conversation, &user).await;
        }
        self.typing.cancel_conversation(conversation).await;
        self.hub.unsubscribe(conversation).await?;
        Ok(())
    }

    pub async fn start_typing(&self, conversation: &conversation::Id) -> Result<()> {
        let user = self.current_user()?;
        self.typing.start(conversation, &user).await;
        Ok(())
    }

    pub async fn stop_typing(&self, conversation: &conversation::Id) -> Result<()> {
        let user = self.current_user()?;
        self.typing.stop(conversation, &user).await;
        Ok(())
    }

    pub async fn unread_notification_count(&self) -> Result<u64> {
        let user = self.current_user()?;
        let count = self.notifications.unread_count(&user).await?;
        Ok(count)
    }

    pub async fn mark_notification_read(&self, id: &notification::Id) -> Result<bool> {
        let user = self.current_user()?;
        let updated = self.notifications.mark_read(id, &user).await?;
        Ok(updated)
    }

    pub async fn set_notifications_enabled(
        &self,
        conversation: &conversation::Id,
        enabled: bool,
    ) -> Result<()> {
        let user = self.current_user()?;
        self.conversations
            .set_notifications_enabled(conversation, &user, enabled)
            .await?;
        Ok(())
    }

    /// Releases every active channel and timer. Call once on session
    /// end.
    pub async fn shutdown(&self) {
        for conversation in self.hub.active().await {
            self.typing.cancel_conversation(&conversation).await;
            if let Err(e) = self.hub.unsubscribe(&conversation).await {
                error!("could not release channel for {conversation}: {e}");
            }
        }
    }
}
