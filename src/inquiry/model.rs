use serde::{Deserialize, Serialize};

use crate::conversation::model::Conversation;
use crate::message::model::Message;
use crate::user;

/// Structured request that seeds a dealer conversation around one car.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct InquiryRequest {
    pub dealer: user::Id,
    pub car_id: String,
    pub message: String,
    /// An opening offer turns the first message into a price quote.
    pub offer: Option<PriceOffer>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PriceOffer {
    pub amount: i64,
    pub currency: String,
}

/// Outcome of the inquiry workflow: the conversation and its opening
/// message, created as one unit.
pub struct DealerInquiry {
    conversation: Conversation,
    message: Message,
}

impl DealerInquiry {
    pub(crate) fn new(conversation: Conversation, message: Message) -> Self {
        Self {
            conversation,
            message,
        }
    }

    pub const fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub const fn message(&self) -> &Message {
        &self.message
    }
}
