use std::fmt::Display;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::integration;

pub mod model;
pub mod repository;
pub mod service;

type Result<T> = std::result::Result<T, Error>;
pub type Repository = Arc<dyn repository::ConversationRepository + Send + Sync>;
pub type Service = Arc<service::ConversationService>;

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
    Direct,
    Group,
    DealerInquiry,
    Support,
}

impl Kind {
    pub const fn as_str(&self) -> &str {
        match self {
            Self::Direct => "direct",
            Self::Group => "group",
            Self::DealerInquiry => "dealer_inquiry",
            Self::Support => "support",
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Member,
    Buyer,
    Dealer,
    Support,
    Admin,
}

impl Role {
    pub const fn as_str(&self) -> &str {
        match self {
            Self::Member => "member",
            Self::Buyer => "buyer",
            Self::Dealer => "dealer",
            Self::Support => "support",
            Self::Admin => "admin",
        }
    }

    /// Re-adding a participant may only move them up this ladder.
    pub const fn rank(&self) -> u8 {
        match self {
            Self::Member => 0,
            Self::Buyer => 1,
            Self::Dealer => 2,
            Self::Support => 3,
            Self::Admin => 4,
        }
    }
}

#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub enum Error {
    #[error("conversation not found: {0}")]
    NotFound(Id),
    #[error("not a member of conversation: {0}")]
    NotMember(Id),

    _Store(#[from] integration::StoreError),
}
