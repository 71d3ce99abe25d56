use std::sync::Arc;

use log::warn;

use super::model::{Content, Message, Page};
use crate::cache;
use crate::event;
use crate::event::model::ChannelEvent;
use crate::settings;
use crate::typing::service::TypingCoordinator;
use crate::{conversation, notification, user};

#[derive(Clone)]
struct CachedPage {
    limit: usize,
    messages: Vec<Message>,
}

#[derive(Clone)]
pub struct MessageService {
    repo: super::Repository,
    conversations: conversation::Service,
    typing: Arc<TypingCoordinator>,
    notifications: notification::Service,
    broadcast: event::Broadcaster,
    pages: Arc<cache::Bounded<conversation::Id, CachedPage>>,
}

impl MessageService {
    pub fn new(
        repo: super::Repository,
        conversations: conversation::Service,
        typing: Arc<TypingCoordinator>,
        notifications: notification::Service,
        broadcast: event::Broadcaster,
        config: &settings::Config,
    ) -> Arc<Self> {
        Arc::new(Self {
            repo,
            conversations,
            typing,
            notifications,
            broadcast,
            pages: cache::Bounded::new(config.message_cache_capacity),
        })
    }
}

impl MessageService {
    /// Accepts a message into the conversation's log. The sender must
    /// be a participant; a rejected send leaves no trace anywhere. Once
    /// the append and the activity bump have succeeded, everything that
    /// follows is best-effort and cannot fail the send.
    pub async fn send(
        &self,
        sender: &user::Id,
        conversation: &conversation::Id,
        content: Content,
    ) -> super::Result<Message> {
        content.validate()?;

        let participants = self.conversations.participants(conversation).await?;
        if !participants.iter().any(|p| p.user_id() == sender) {
            return Err(super::Error::NotParticipant(sender.clone()));
        }

        let message = self.repo.append(conversation, sender, content).await?;
        self.conversations
            .touch_activity(conversation, message.created_at())
            .await?;
        self.pages.invalidate(conversation).await;

        // send implies stop typing
        self.typing.stop(conversation, sender).await;

        self.notifications
            .on_message_appended(&message, &participants)
            .await;

        let event = ChannelEvent::NewMessage {
            message: message.clone(),
        };
        if let Err(e) = self.broadcast.broadcast(conversation, &event).await {
            warn!("could not broadcast message {}: {e}", message.id());
        }

        Ok(message)
    }

    /// Message history, oldest to newest. The newest page is served
    /// from the cache until the next append.
    pub async fn find_range(
        &self,
        conversation: &conversation::Id,
        page: &Page,
    ) -> super::Result<Vec<Message>> {
        if page.before.is_none() {
            if let Some(cached) = self.pages.get(conversation).await {
                if cached.limit == page.limit {
                    return Ok(cached.messages);
                }
            }
        }

        let messages = self
            .repo
            .find_range(conversation, page.before, page.limit)
            .await?;

        if page.before.is_none() {
            let cached = CachedPage {
                limit: page.limit,
                messages: messages.clone(),
            };
            self.pages.put(conversation.clone(), cached).await;
        }
        Ok(messages)
    }

    /// Idempotent union into `read_by`.
    pub async fn mark_read(&self, id: &super::Id, user: &user::Id) -> super::Result<Message> {
        let message = self
            .repo
            .mark_read(id, user)
            .await?
            .ok_or_else(|| super::Error::NotFound(id.clone()))?;
        self.pages.invalidate(message.conversation_id()).await;
        Ok(message)
    }
}
