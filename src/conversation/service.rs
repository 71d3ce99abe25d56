use std::sync::Arc;

use chrono::Utc;
use log::error;

use super::model::{Conversation, NewConversation, Participant};
use super::{Kind, Role};
use crate::cache;
use crate::settings;
use crate::user;

#[derive(Clone)]
pub struct ConversationService {
    repo: super::Repository,
    records: Arc<cache::Bounded<super::Id, Conversation>>,
    members: Arc<cache::Bounded<super::Id, Vec<Participant>>>,
}

impl ConversationService {
    pub fn new(repo: super::Repository, config: &settings::Config) -> Arc<Self> {
        Arc::new(Self {
            repo,
            records: cache::Bounded::new(config.conversation_cache_capacity),
            members: cache::Bounded::new(config.conversation_cache_capacity),
        })
    }
}

impl ConversationService {
    /// Opens a conversation with the caller as admin. Other initial
    /// members keep their requested roles.
    pub async fn create(
        &self,
        creator: &user::Id,
        new: NewConversation,
    ) -> super::Result<Conversation> {
        let mut conversation = Conversation::new(
            new.kind,
            new.title,
            new.car_id,
            new.metadata,
            Utc::now().timestamp_millis(),
        );

        let mut participants = vec![Participant::new(
            conversation.id().clone(),
            creator.clone(),
            Role::Admin,
        )];
        for (user, role) in new.members {
            if user == *creator {
                continue;
            }
            participants.push(Participant::new(conversation.id().clone(), user, role));
        }
        for participant in &participants {
            conversation.add_member(participant.user_id().clone());
        }

        self.repo.insert(&conversation, &participants).await?;
        Ok(conversation)
    }

    pub async fn get(&self, id: &super::Id) -> super::Result<Conversation> {
        if let Some(conversation) = self.records.get(id).await {
            return Ok(conversation);
        }

        let conversation = self
            .repo
            .find(id)
            .await?
            .ok_or_else(|| super::Error::NotFound(id.clone()))?;
        self.records.put(id.clone(), conversation.clone()).await;
        Ok(conversation)
    }

    pub async fn find_all(
        &self,
        member: &user::Id,
        kind: Option<Kind>,
    ) -> super::Result<Vec<Conversation>> {
        let conversations = self.repo.find_by_member(member, kind).await?;
        Ok(conversations)
    }

    /// Member records, read through the cache. Every write to the
    /// participant set drops the cached entry.
    pub async fn participants(&self, id: &super::Id) -> super::Result<Vec<Participant>> {
        match self.members.get(id).await {
            Some(participants) if !participants.is_empty() => Ok(participants),
            _ => {
                self.get(id).await?;
                let participants = self.repo.participants(id).await?;
                self.members.put(id.clone(), participants.clone()).await;
                Ok(participants)
            }
        }
    }

    /// Idempotent: an existing participant keeps the higher of their
    /// current and the requested role.
    pub async fn add_participant(
        &self,
        id: &super::Id,
        user: &user::Id,
        role: Role,
    ) -> super::Result<Participant> {
        let current = self.participants(id).await?;

        let participant = match current.iter().find(|p| p.user_id() == user) {
            Some(existing) if existing.role().rank() >= role.rank() => existing.clone(),
            Some(existing) => {
                let mut upgraded = existing.clone();
                upgraded.set_role(role);
                upgraded
            }
            None => Participant::new(id.clone(), user.clone(), role),
        };

        self.repo.upsert_participant(&participant).await?;
        self.invalidate(id).await;
        Ok(participant)
    }

    /// Never fails: unknown conversations, absent members and store
    /// hiccups all report `false`.
    pub async fn remove_participant(&self, id: &super::Id, user: &user::Id) -> bool {
        let removed = match self.repo.remove_participant(id, user).await {
            Ok(removed) => removed,
            Err(e) => {
                error!("could not remove participant {user} from {id}: {e}");
                false
            }
        };
        if removed {
            self.invalidate(id).await;
        }
        removed
    }

    /// Bumps the activity clock after a message is accepted. `at` is
    /// the store-assigned message timestamp, which can run ahead of the
    /// wall clock; the stored value never decreases either way.
    pub async fn touch_activity(&self, id: &super::Id, at: i64) -> super::Result<()> {
        self.repo
            .update_last_activity(id, at.max(Utc::now().timestamp_millis()))
            .await?;
        self.records.invalidate(id).await;
        Ok(())
    }

    pub async fn update_presence(
        &self,
        id: &super::Id,
        user: &user::Id,
        online: bool,
    ) -> super::Result<()> {
        self.repo
            .update_presence(id, user, online, Utc::now().timestamp_millis())
            .await?;
        self.members.invalidate(id).await;
        Ok(())
    }

    pub async fn set_notifications_enabled(
        &self,
        id: &super::Id,
        user: &user::Id,
        enabled: bool,
    ) -> super::Result<()> {
        let updated = self
            .repo
            .set_notifications_enabled(id, user, enabled)
            .await?;
        if !updated {
            return Err(super::Error::NotMember(id.clone()));
        }
        self.members.invalidate(id).await;
        Ok(())
    }

    async fn invalidate(&self, id: &super::Id) {
        self.records.invalidate(id).await;
        self.members.invalidate(id).await;
    }
}
