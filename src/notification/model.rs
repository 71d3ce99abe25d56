use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::Id;
use crate::message::{self, model::Message};
use crate::{conversation, user};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Notification {
    id: Id,
    user_id: user::Id,
    conversation_id: conversation::Id,
    message_id: message::Id,
    kind: message::Kind,
    preview: String,
    read: bool,
    created_at: i64,
}

impl Notification {
    pub(crate) fn new(recipient: user::Id, message: &Message, preview: String) -> Self {
        Self {
            id: Id::random(),
            user_id: recipient,
            conversation_id: message.conversation_id().clone(),
            message_id: message.id().clone(),
            kind: message.content().kind(),
            preview,
            read: false,
            created_at: Utc::now().timestamp_millis(),
        }
    }

    pub const fn id(&self) -> &Id {
        &self.id
    }

    pub const fn user_id(&self) -> &user::Id {
        &self.user_id
    }

    pub const fn conversation_id(&self) -> &conversation::Id {
        &self.conversation_id
    }

    pub const fn message_id(&self) -> &message::Id {
        &self.message_id
    }

    pub const fn kind(&self) -> &message::Kind {
        &self.kind
    }

    pub fn preview(&self) -> &str {
        &self.preview
    }

    pub const fn is_read(&self) -> bool {
        self.read
    }

    pub const fn created_at(&self) -> i64 {
        self.created_at
    }

    pub(crate) fn mark_read(&mut self) {
        self.read = true;
    }
}
