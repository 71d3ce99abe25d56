use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Id, Kind, Role};
use crate::user;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Conversation {
    id: Id,
    kind: Kind,
    title: Option<String>,
    car_id: Option<String>,
    members: HashSet<user::Id>,
    last_activity_at: i64,
    metadata: Map<String, Value>,
}

impl Conversation {
    pub(crate) fn new(
        kind: Kind,
        title: Option<String>,
        car_id: Option<String>,
        metadata: Map<String, Value>,
        now: i64,
    ) -> Self {
        Self {
            id: Id::random(),
            kind,
            title,
            car_id,
            members: HashSet::new(),
            last_activity_at: now,
            metadata,
        }
    }

    pub const fn id(&self) -> &Id {
        &self.id
    }

    pub const fn kind(&self) -> &Kind {
        &self.kind
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn car_id(&self) -> Option<&str> {
        self.car_id.as_deref()
    }

    pub const fn members(&self) -> &HashSet<user::Id> {
        &self.members
    }

    pub const fn last_activity_at(&self) -> i64 {
        self.last_activity_at
    }

    pub const fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    pub(crate) fn add_member(&mut self, user: user::Id) -> bool {
        self.members.insert(user)
    }

    pub(crate) fn remove_member(&mut self, user: &user::Id) -> bool {
        self.members.remove(user)
    }

    /// The activity clock never moves backwards.
    pub(crate) fn touch(&mut self, at: i64) {
        self.last_activity_at = self.last_activity_at.max(at);
    }
}

/// Everything a caller chooses when opening a conversation.
pub struct NewConversation {
    pub kind: Kind,
    pub title: Option<String>,
    pub car_id: Option<String>,
    pub members: Vec<(user::Id, Role)>,
    pub metadata: Map<String, Value>,
}

impl NewConversation {
    pub fn new(kind: Kind) -> Self {
        Self {
            kind,
            title: None,
            car_id: None,
            members: Vec::new(),
            metadata: Map::new(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Participant {
    user_id: user::Id,
    conversation_id: Id,
    role: Role,
    display_name: Option<String>,
    is_online: bool,
    last_seen_at: Option<i64>,
    notifications_enabled: bool,
}

impl Participant {
    pub fn new(conversation_id: Id, user_id: user::Id, role: Role) -> Self {
        Self {
            user_id,
            conversation_id,
            role,
            display_name: None,
            is_online: false,
            last_seen_at: None,
            notifications_enabled: true,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub const fn user_id(&self) -> &user::Id {
        &self.user_id
    }

    pub const fn conversation_id(&self) -> &Id {
        &self.conversation_id
    }

    pub const fn role(&self) -> &Role {
        &self.role
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub const fn is_online(&self) -> bool {
        self.is_online
    }

    pub const fn last_seen_at(&self) -> Option<i64> {
        self.last_seen_at
    }

    pub const fn notifications_enabled(&self) -> bool {
        self.notifications_enabled
    }

    pub(crate) fn set_role(&mut self, role: Role) {
        self.role = role;
    }

    pub(crate) fn set_online(&mut self, online: bool, at: i64) {
        self.is_online = online;
        self.last_seen_at = Some(at);
    }

    pub(crate) fn set_notifications_enabled(&mut self, enabled: bool) {
        self.notifications_enabled = enabled;
    }
}
