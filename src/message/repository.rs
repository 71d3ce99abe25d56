use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::model::{Content, Message};
use crate::integration::StoreError;
use crate::{conversation, user};

type Result<T> = std::result::Result<T, StoreError>;

/// Append-only message log with read tracking.
#[async_trait]
pub trait MessageRepository {
    /// Accepts the message and assigns its position. `created_at` is
    /// chosen here, never by the client, and strictly increases within
    /// one conversation regardless of client clock skew.
    async fn append(
        &self,
        conversation: &conversation::Id,
        sender: &user::Id,
        content: Content,
    ) -> Result<Message>;

    /// A contiguous page ordered by `created_at` ascending: the newest
    /// `limit` messages older than `before` (newest page if absent).
    async fn find_range(
        &self,
        conversation: &conversation::Id,
        before: Option<i64>,
        limit: usize,
    ) -> Result<Vec<Message>>;

    /// Unions the user into `read_by`. `None` for an unknown message.
    async fn mark_read(&self, id: &super::Id, user: &user::Id) -> Result<Option<Message>>;
}

#[derive(Default)]
struct Inner {
    by_conversation: HashMap<conversation::Id, Vec<Message>>,
    index: HashMap<super::Id, conversation::Id>,
}

/// In-process reference implementation backing the tests and the demo
/// binary.
#[derive(Default)]
pub struct InMemoryMessages {
    state: RwLock<Inner>,
}

impl InMemoryMessages {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessages {
    async fn append(
        &self,
        conversation: &conversation::Id,
        sender: &user::Id,
        content: Content,
    ) -> Result<Message> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;
        let log = state.by_conversation.entry(conversation.clone()).or_default();

        // per-conversation serialization point: monotonic even when the
        // wall clock stalls within a millisecond
        let floor = log.last().map(|m| m.created_at() + 1).unwrap_or(i64::MIN);
        let at = Utc::now().timestamp_millis().max(floor);

        let message = Message::new(conversation.clone(), sender.clone(), content, at);
        log.push(message.clone());
        state.index.insert(message.id().clone(), conversation.clone());
        Ok(message)
    }

    async fn find_range(
        &self,
        conversation: &conversation::Id,
        before: Option<i64>,
        limit: usize,
    ) -> Result<Vec<Message>> {
        let state = self.state.read().await;
        let Some(log) = state.by_conversation.get(conversation) else {
            return Ok(Vec::new());
        };

        let mut page: Vec<Message> = log
            .iter()
            .rev()
            .filter(|m| before.is_none_or(|b| m.created_at() < b))
            .take(limit)
            .cloned()
            .collect();
        page.reverse();
        Ok(page)
    }

    async fn mark_read(&self, id: &super::Id, user: &user::Id) -> Result<Option<Message>> {
        let mut state = self.state.write().await;
        let Some(conversation) = state.index.get(id).cloned() else {
            return Ok(None);
        };
        let message = state
            .by_conversation
            .get_mut(&conversation)
            .and_then(|log| log.iter_mut().find(|m| m.id() == id));

        Ok(message.map(|m| {
            m.add_reader(user.clone());
            m.clone()
        }))
    }
}
