use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use log::warn;
use tokio::sync::Mutex;

use super::debounce::DebounceArena;
use crate::event;
use crate::event::model::ChannelEvent;
use crate::settings;
use crate::{conversation, user};

type Key = (conversation::Id, user::Id);

/// Idle/Typing state machine per (conversation, user), with a debounced
/// fall back to Idle. Indicator state lives only here and only until it
/// expires; nothing is ever persisted.
pub struct TypingCoordinator {
    broadcast: event::Broadcaster,
    timers: DebounceArena<Key>,
    typing: Arc<Mutex<HashSet<Key>>>,
    window: Duration,
}

impl TypingCoordinator {
    pub fn new(broadcast: event::Broadcaster, config: &settings::Config) -> Arc<Self> {
        Arc::new(Self {
            broadcast,
            timers: DebounceArena::new(),
            typing: Arc::new(Mutex::new(HashSet::new())),
            window: config.typing_window,
        })
    }
}

impl TypingCoordinator {
    /// Idle→Typing broadcasts `typing` once; every further keystroke
    /// only pushes the expiry forward.
    pub async fn start(&self, conversation: &conversation::Id, user: &user::Id) {
        let key = (conversation.clone(), user.clone());

        let started = self.typing.lock().await.insert(key.clone());
        if started {
            emit(
                &self.broadcast,
                conversation,
                ChannelEvent::Typing { user: user.clone() },
            )
            .await;
        }

        let typing = Arc::clone(&self.typing);
        let broadcast = Arc::clone(&self.broadcast);
        let expiry_key = key.clone();
        let expiry_conversation = conversation.clone();
        let expiry_user = user.clone();
        self.timers
            .arm(key, self.window, async move {
                if typing.lock().await.remove(&expiry_key) {
                    emit(
                        &broadcast,
                        &expiry_conversation,
                        ChannelEvent::StopTyping { user: expiry_user },
                    )
                    .await;
                }
            })
            .await;
    }

    /// Explicit stop, also used when a send implies one. No-op when
    /// already idle.
    pub async fn stop(&self, conversation: &conversation::Id, user: &user::Id) {
        let key = (conversation.clone(), user.clone());
        self.timers.cancel(&key).await;
        if self.typing.lock().await.remove(&key) {
            emit(
                &self.broadcast,
                conversation,
                ChannelEvent::StopTyping { user: user.clone() },
            )
            .await;
        }
    }

    /// Drops every indicator and timer for the conversation without
    /// emitting transitions. Used on channel teardown so a stale timer
    /// can never fire afterwards.
    pub async fn cancel_conversation(&self, conversation: &conversation::Id) {
        self.timers.cancel_matching(|(c, _)| c == conversation).await;
        self.typing.lock().await.retain(|(c, _)| c != conversation);
    }
}

// typing signals are best-effort and degrade silently
async fn emit(broadcast: &event::Broadcaster, conversation: &conversation::Id, event: ChannelEvent) {
    if let Err(e) = broadcast.broadcast(conversation, &event).await {
        warn!("could not broadcast {} for {conversation}: {e}", event.kind());
    }
}
