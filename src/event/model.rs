use bytes::Bytes;
use log::error;
use serde::{Deserialize, Serialize};

use crate::message::model::Message;
use crate::user;

pub const NEW_MESSAGE: &str = "new_message";
pub const TYPING: &str = "typing";
pub const STOP_TYPING: &str = "stop_typing";
pub const USER_ONLINE: &str = "user_online";
pub const USER_OFFLINE: &str = "user_offline";
pub const PRESENCE_STATE: &str = "presence_state";

/// Every event kind a channel can carry.
pub const KINDS: [&str; 6] = [
    NEW_MESSAGE,
    TYPING,
    STOP_TYPING,
    USER_ONLINE,
    USER_OFFLINE,
    PRESENCE_STATE,
];

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChannelEvent {
    NewMessage {
        message: Message,
    },
    Typing {
        user: user::Id,
    },
    StopTyping {
        user: user::Id,
    },
    UserOnline {
        user: user::Id,
    },
    UserOffline {
        user: user::Id,
    },
    /// Transport-originated snapshot of who is online on the channel.
    PresenceState {
        online: Vec<user::Id>,
    },
}

impl ChannelEvent {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NewMessage { .. } => NEW_MESSAGE,
            Self::Typing { .. } => TYPING,
            Self::StopTyping { .. } => STOP_TYPING,
            Self::UserOnline { .. } => USER_ONLINE,
            Self::UserOffline { .. } => USER_OFFLINE,
            Self::PresenceState { .. } => PRESENCE_STATE,
        }
    }
}

impl From<&ChannelEvent> for Bytes {
    fn from(e: &ChannelEvent) -> Self {
        let mut bytes: Vec<u8> = Vec::new();
        if let Err(err) = serde_json::to_writer(&mut bytes, e) {
            error!("could not serialize channel event: {err:?}");
        }
        bytes.into()
    }
}
