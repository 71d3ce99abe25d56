use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use log::warn;
use tokio::sync::Mutex;

use crate::event;
use crate::event::bus::Bus;
use crate::event::model::ChannelEvent;
use crate::{conversation, user};

/// Edge-triggered online/offline tracking per conversation. Transitions
/// originating locally are broadcast on the channel; reconciled remote
/// snapshots surface as local diff events only.
pub struct PresenceTracker {
    conversations: conversation::Service,
    broadcast: event::Broadcaster,
    bus: Arc<Bus>,
    online: Mutex<HashMap<conversation::Id, HashSet<user::Id>>>,
}

impl PresenceTracker {
    pub fn new(
        conversations: conversation::Service,
        broadcast: event::Broadcaster,
        bus: Arc<Bus>,
    ) -> Arc<Self> {
        Arc::new(Self {
            conversations,
            broadcast,
            bus,
            online: Mutex::new(HashMap::new()),
        })
    }
}

impl PresenceTracker {
    /// Emits `user_online` only on the Offline→Online edge; repeated
    /// joins are silent.
    pub async fn join(&self, conversation: &conversation::Id, user: &user::Id) {
        let appeared = self
            .online
            .lock()
            .await
            .entry(conversation.clone())
            .or_default()
            .insert(user.clone());
        if !appeared {
            return;
        }

        self.record(conversation, user, true).await;
        self.emit(
            conversation,
            ChannelEvent::UserOnline { user: user.clone() },
        )
        .await;
    }

    pub async fn leave(&self, conversation: &conversation::Id, user: &user::Id) {
        let was_online = self
            .online
            .lock()
            .await
            .get_mut(conversation)
            .is_some_and(|set| set.remove(user));
        if !was_online {
            return;
        }

        self.record(conversation, user, false).await;
        self.emit(
            conversation,
            ChannelEvent::UserOffline { user: user.clone() },
        )
        .await;
    }

    /// Reconciles a full channel snapshot against the last known state
    /// and surfaces only the difference, so a reconnect never replays
    /// the whole room.
    pub async fn sync(&self, conversation: &conversation::Id, online: HashSet<user::Id>) {
        let (joined, left) = {
            let mut state = self.online.lock().await;
            let known = state.entry(conversation.clone()).or_default();
            let changes = diff(known, &online);
            *known = online;
            changes
        };

        for user in joined {
            self.record(conversation, &user, true).await;
            self.bus
                .dispatch(conversation, &ChannelEvent::UserOnline { user })
                .await;
        }
        for user in left {
            self.record(conversation, &user, false).await;
            self.bus
                .dispatch(conversation, &ChannelEvent::UserOffline { user })
                .await;
        }
    }

    // participant rows are a best-effort mirror of channel state
    async fn record(&self, conversation: &conversation::Id, user: &user::Id, online: bool) {
        if let Err(e) = self
            .conversations
            .update_presence(conversation, user, online)
            .await
        {
            warn!("could not record presence of {user} in {conversation}: {e}");
        }
    }

    async fn emit(&self, conversation: &conversation::Id, event: ChannelEvent) {
        if let Err(e) = self.broadcast.broadcast(conversation, &event).await {
            warn!("could not broadcast {} for {conversation}: {e}", event.kind());
        }
    }
}

fn diff(
    prev: &HashSet<user::Id>,
    next: &HashSet<user::Id>,
) -> (Vec<user::Id>, Vec<user::Id>) {
    let joined = next.difference(prev).cloned().collect();
    let left = prev.difference(next).cloned().collect();
    (joined, left)
}
