use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Id, Kind};
use crate::{conversation, user};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Message {
    id: Id,
    conversation_id: conversation::Id,
    sender: user::Id,
    content: Content,
    read_by: HashSet<user::Id>,
    created_at: i64,
}

impl Message {
    /// Built by the store at acceptance time; the sender has read their
    /// own message from the start.
    pub(crate) fn new(
        conversation_id: conversation::Id,
        sender: user::Id,
        content: Content,
        created_at: i64,
    ) -> Self {
        let read_by = HashSet::from([sender.clone()]);
        Self {
            id: Id::random(),
            conversation_id,
            sender,
            content,
            read_by,
            created_at,
        }
    }

    pub const fn id(&self) -> &Id {
        &self.id
    }

    pub const fn conversation_id(&self) -> &conversation::Id {
        &self.conversation_id
    }

    pub const fn sender(&self) -> &user::Id {
        &self.sender
    }

    pub const fn content(&self) -> &Content {
        &self.content
    }

    pub const fn read_by(&self) -> &HashSet<user::Id> {
        &self.read_by
    }

    pub const fn created_at(&self) -> i64 {
        self.created_at
    }

    pub(crate) fn add_reader(&mut self, user: user::Id) -> bool {
        self.read_by.insert(user)
    }
}

/// Message payload, one variant per message kind. Car-related variants
/// carry an opaque `details` value supplied by the catalog collaborator
/// and passed through untouched.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Content {
    Text {
        text: String,
    },
    Image {
        url: String,
        caption: Option<String>,
    },
    CarLink {
        car_id: String,
        comment: Option<String>,
        #[serde(default)]
        details: Value,
    },
    PriceQuote {
        car_id: String,
        amount: i64,
        currency: String,
        note: Option<String>,
        #[serde(default)]
        details: Value,
    },
    InspectionReport {
        car_id: String,
        url: String,
        summary: Option<String>,
    },
    System {
        text: String,
    },
}

impl Content {
    pub const fn kind(&self) -> Kind {
        match self {
            Self::Text { .. } => Kind::Text,
            Self::Image { .. } => Kind::Image,
            Self::CarLink { .. } => Kind::CarLink,
            Self::PriceQuote { .. } => Kind::PriceQuote,
            Self::InspectionReport { .. } => Kind::InspectionReport,
            Self::System { .. } => Kind::System,
        }
    }

    pub fn validate(&self) -> super::Result<()> {
        match self {
            Self::Text { text } | Self::System { text } if text.trim().is_empty() => {
                Err(super::Error::EmptyText)
            }
            Self::Image { url, .. } if url.trim().is_empty() => Err(super::Error::EmptyUrl),
            Self::CarLink { car_id, .. }
            | Self::PriceQuote { car_id, .. }
            | Self::InspectionReport { car_id, .. }
                if car_id.trim().is_empty() =>
            {
                Err(super::Error::MissingCarId)
            }
            _ => Ok(()),
        }
    }

    /// Single line shown in previews and notification trays.
    pub fn display_text(&self) -> String {
        match self {
            Self::Text { text } | Self::System { text } => text.clone(),
            Self::Image { caption, .. } => caption.clone().unwrap_or_else(|| "Photo".into()),
            Self::CarLink { comment, .. } => {
                comment.clone().unwrap_or_else(|| "Shared a car".into())
            }
            Self::PriceQuote {
                amount,
                currency,
                note,
                ..
            } => note
                .clone()
                .unwrap_or_else(|| format!("Offered {amount} {currency}")),
            Self::InspectionReport { summary, .. } => summary
                .clone()
                .unwrap_or_else(|| "Inspection report".into()),
        }
    }
}

/// Paging cursor for message history: the newest `limit` messages older
/// than `before`, or the newest page when `before` is absent.
#[derive(Clone, Copy, Debug)]
pub struct Page {
    pub before: Option<i64>,
    pub limit: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            before: None,
            limit: 50,
        }
    }
}
