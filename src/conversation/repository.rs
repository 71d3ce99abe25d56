use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::Kind;
use super::model::{Conversation, Participant};
use crate::integration::StoreError;
use crate::user;

type Result<T> = std::result::Result<T, StoreError>;

/// Minimal persistence contract for conversations and their
/// participant records. Row-level operations are atomic; nothing here
/// assumes a particular query language.
#[async_trait]
pub trait ConversationRepository {
    async fn insert(&self, conversation: &Conversation, participants: &[Participant])
    -> Result<()>;

    async fn find(&self, id: &super::Id) -> Result<Option<Conversation>>;

    /// Conversations the user participates in, most recent activity
    /// first, optionally narrowed to one kind.
    async fn find_by_member(&self, member: &user::Id, kind: Option<Kind>)
    -> Result<Vec<Conversation>>;

    async fn participants(&self, id: &super::Id) -> Result<Vec<Participant>>;

    async fn upsert_participant(&self, participant: &Participant) -> Result<()>;

    async fn remove_participant(&self, id: &super::Id, user: &user::Id) -> Result<bool>;

    async fn update_last_activity(&self, id: &super::Id, at: i64) -> Result<()>;

    async fn update_presence(
        &self,
        id: &super::Id,
        user: &user::Id,
        online: bool,
        at: i64,
    ) -> Result<bool>;

    async fn set_notifications_enabled(
        &self,
        id: &super::Id,
        user: &user::Id,
        enabled: bool,
    ) -> Result<bool>;
}

struct Entry {
    conversation: Conversation,
    participants: HashMap<user::Id, Participant>,
}

/// In-process reference implementation backing the tests and the demo
/// binary.
#[derive(Default)]
pub struct InMemoryConversations {
    state: RwLock<HashMap<super::Id, Entry>>,
}

impl InMemoryConversations {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl ConversationRepository for InMemoryConversations {
    async fn insert(
        &self,
        conversation: &Conversation,
        participants: &[Participant],
    ) -> Result<()> {
        let entry = Entry {
            conversation: conversation.clone(),
            participants: participants
                .iter()
                .map(|p| (p.user_id().clone(), p.clone()))
                .collect(),
        };
        self.state
            .write()
            .await
            .insert(conversation.id().clone(), entry);
        Ok(())
    }

    async fn find(&self, id: &super::Id) -> Result<Option<Conversation>> {
        let state = self.state.read().await;
        Ok(state.get(id).map(|e| e.conversation.clone()))
    }

    async fn find_by_member(
        &self,
        member: &user::Id,
        kind: Option<Kind>,
    ) -> Result<Vec<Conversation>> {
        let state = self.state.read().await;
        let mut conversations: Vec<Conversation> = state
            .values()
            .filter(|e| e.conversation.members().contains(member))
            .filter(|e| kind.is_none_or(|k| *e.conversation.kind() == k))
            .map(|e| e.conversation.clone())
            .collect();
        conversations.sort_by_key(|c| std::cmp::Reverse(c.last_activity_at()));
        Ok(conversations)
    }

    async fn participants(&self, id: &super::Id) -> Result<Vec<Participant>> {
        let state = self.state.read().await;
        Ok(state
            .get(id)
            .map(|e| e.participants.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn upsert_participant(&self, participant: &Participant) -> Result<()> {
        let mut state = self.state.write().await;
        let entry = state
            .get_mut(participant.conversation_id())
            .ok_or_else(|| StoreError::Rejected("conversation row is missing".into()))?;
        entry
            .conversation
            .add_member(participant.user_id().clone());
        entry
            .participants
            .insert(participant.user_id().clone(), participant.clone());
        Ok(())
    }

    async fn remove_participant(&self, id: &super::Id, user: &user::Id) -> Result<bool> {
        let mut state = self.state.write().await;
        let Some(entry) = state.get_mut(id) else {
            return Ok(false);
        };
        entry.conversation.remove_member(user);
        Ok(entry.participants.remove(user).is_some())
    }

    async fn update_last_activity(&self, id: &super::Id, at: i64) -> Result<()> {
        let mut state = self.state.write().await;
        if let Some(entry) = state.get_mut(id) {
            entry.conversation.touch(at);
        }
        Ok(())
    }

    async fn update_presence(
        &self,
        id: &super::Id,
        user: &user::Id,
        online: bool,
        at: i64,
    ) -> Result<bool> {
        let mut state = self.state.write().await;
        let Some(participant) = state.get_mut(id).and_then(|e| e.participants.get_mut(user))
        else {
            return Ok(false);
        };
        participant.set_online(online, at);
        Ok(true)
    }

    async fn set_notifications_enabled(
        &self,
        id: &super::Id,
        user: &user::Id,
        enabled: bool,
    ) -> Result<bool> {
        let mut state = self.state.write().await;
        let Some(participant) = state.get_mut(id).and_then(|e| e.participants.get_mut(user))
        else {
            return Ok(false);
        };
        participant.set_notifications_enabled(enabled);
        Ok(true)
    }
}
