use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::model::Notification;
use crate::integration::StoreError;
use crate::user;

type Result<T> = std::result::Result<T, StoreError>;

#[async_trait]
pub trait NotificationRepository {
    async fn insert(&self, notification: &Notification) -> Result<()>;

    async fn count_unread(&self, user: &user::Id) -> Result<u64>;

    async fn find_by_user(&self, user: &user::Id) -> Result<Vec<Notification>>;

    /// `false` when the notification does not exist or belongs to
    /// somebody else.
    async fn mark_read(&self, id: &super::Id, user: &user::Id) -> Result<bool>;
}

/// In-process reference implementation backing the tests and the demo
/// binary.
#[derive(Default)]
pub struct InMemoryNotifications {
    state: RwLock<HashMap<super::Id, Notification>>,
}

impl InMemoryNotifications {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl NotificationRepository for InMemoryNotifications {
    async fn insert(&self, notification: &Notification) -> Result<()> {
        self.state
            .write()
            .await
            .insert(notification.id().clone(), notification.clone());
        Ok(())
    }

    async fn count_unread(&self, user: &user::Id) -> Result<u64> {
        let state = self.state.read().await;
        Ok(state
            .values()
            .filter(|n| n.user_id() == user && !n.is_read())
            .count() as u64)
    }

    async fn find_by_user(&self, user: &user::Id) -> Result<Vec<Notification>> {
        let state = self.state.read().await;
        let mut notifications: Vec<Notification> = state
            .values()
            .filter(|n| n.user_id() == user)
            .cloned()
            .collect();
        notifications.sort_by_key(|n| std::cmp::Reverse(n.created_at()));
        Ok(notifications)
    }

    async fn mark_read(&self, id: &super::Id, user: &user::Id) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.get_mut(id) {
            Some(notification) if notification.user_id() == user => {
                notification.mark_read();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
