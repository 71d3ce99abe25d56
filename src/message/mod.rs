use std::fmt::Display;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{conversation, integration, user};

pub mod model;
pub mod repository;
pub mod service;

type Result<T> = std::result::Result<T, Error>;
pub type Repository = Arc<dyn repository::MessageRepository + Send + Sync>;
pub type Service = Arc<service::MessageService>;

#[derive(Clone, Debug, Deserialize, Serialize, Hash, PartialEq, Eq)]
pub struct Id(Uuid);

impl Id {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub const fn get(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for Id {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Text,
    Image,
    CarLink,
    PriceQuote,
    InspectionReport,
    System,
}

impl Kind {
    pub const fn as_str(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::CarLink => "car_link",
            Self::PriceQuote => "price_quote",
            Self::InspectionReport => "inspection_report",
            Self::System => "system",
        }
    }
}

#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub enum Error {
    #[error("message not found: {0}")]
    NotFound(Id),
    #[error("sender is not a participant: {0}")]
    NotParticipant(user::Id),
    #[error("message text is empty")]
    EmptyText,
    #[error("missing car reference")]
    MissingCarId,
    #[error("image url is empty")]
    EmptyUrl,

    _Conversation(#[from] conversation::Error),
    _Store(#[from] integration::StoreError),
}
