use std::sync::Arc;

use futures::future::join_all;
use log::error;
use text_splitter::TextSplitter;

use super::model::Notification;
use crate::conversation::model::Participant;
use crate::message::model::Message;
use crate::settings;
use crate::user;

#[derive(Clone)]
pub struct NotificationService {
    repo: super::Repository,
    preview_chars: usize,
}

impl NotificationService {
    pub fn new(repo: super::Repository, config: &settings::Config) -> Arc<Self> {
        Arc::new(Self {
            repo,
            preview_chars: config.preview_chars,
        })
    }
}

impl NotificationService {
    /// Fan-out derived from one accepted message. Recipients are every
    /// participant except the sender and anyone who muted the
    /// conversation. Inserts run concurrently and each one stands
    /// alone: a failed recipient never blocks the rest.
    pub async fn on_message_appended(&self, message: &Message, participants: &[Participant]) {
        let preview = preview(&message.content().display_text(), self.preview_chars);

        let inserts = participants
            .iter()
            .filter(|p| p.user_id() != message.sender() && p.notifications_enabled())
            .map(|p| {
                let notification = Notification::new(p.user_id().clone(), message, preview.clone());
                async move { (p.user_id(), self.repo.insert(&notification).await) }
            });

        for (recipient, outcome) in join_all(inserts).await {
            if let Err(e) = outcome {
                error!("could not store notification for {recipient}: {e}");
            }
        }
    }

    pub async fn unread_count(&self, user: &user::Id) -> super::Result<u64> {
        let count = self.repo.count_unread(user).await?;
        Ok(count)
    }

    pub async fn find_all(&self, user: &user::Id) -> super::Result<Vec<Notification>> {
        let notifications = self.repo.find_by_user(user).await?;
        Ok(notifications)
    }

    pub async fn mark_read(&self, id: &super::Id, user: &user::Id) -> super::Result<bool> {
        let updated = self.repo.mark_read(id, user).await?;
        Ok(updated)
    }
}

/// First chunk within the bound, cut on a character-safe boundary.
fn preview(text: &str, max_chars: usize) -> String {
    TextSplitter::new(max_chars)
        .chunks(text)
        .next()
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_is_bounded() {
        let text = "a very long description of a very well kept car".repeat(10);
        let cut = preview(&text, 40);
        assert!(cut.chars().count() <= 40);
        assert!(!cut.is_empty());
    }

    #[test]
    fn preview_keeps_short_text_whole() {
        assert_eq!(preview("still available?", 96), "still available?");
    }

    #[test]
    fn preview_respects_multibyte_boundaries() {
        let text = "čtyři sta tisíc korun českých ".repeat(5);
        let cut = preview(&text, 20);
        assert!(cut.chars().count() <= 20);
        assert!(text.starts_with(&cut));
    }
}
