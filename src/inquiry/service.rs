use std::sync::Arc;

use log::warn;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::model::{DealerInquiry, InquiryRequest};
use crate::conversation::model::NewConversation;
use crate::conversation::{Kind, Role};
use crate::integration::catalog;
use crate::message::model::Content;
use crate::{conversation, message, user};

#[derive(Clone)]
pub struct InquiryService {
    conversations: conversation::Service,
    messages: message::Service,
    catalog: catalog::Catalog,
}

impl InquiryService {
    pub fn new(
        conversations: conversation::Service,
        messages: message::Service,
        catalog: catalog::Catalog,
    ) -> Arc<Self> {
        Arc::new(Self {
            conversations,
            messages,
            catalog,
        })
    }
}

impl InquiryService {
    /// One workflow: open the dealer conversation, seat the dealer and
    /// post the opening message about the car.
    pub async fn create(
        &self,
        buyer: &user::Id,
        request: InquiryRequest,
    ) -> super::Result<DealerInquiry> {
        if request.car_id.trim().is_empty() {
            return Err(super::Error::MissingCar);
        }
        if request.message.trim().is_empty() {
            return Err(super::Error::EmptyMessage);
        }
        if request.dealer == *buyer {
            return Err(super::Error::SelfInquiry);
        }

        let inquiry_id = Uuid::new_v4();
        let mut metadata = Map::new();
        metadata.insert("inquiry_id".into(), Value::String(inquiry_id.to_string()));
        metadata.insert("buyer".into(), Value::String(buyer.to_string()));

        let mut new = NewConversation::new(Kind::DealerInquiry);
        new.car_id = Some(request.car_id.clone());
        new.metadata = metadata;

        let conversation = self.conversations.create(buyer, new).await?;
        self.conversations
            .add_participant(conversation.id(), &request.dealer, Role::Dealer)
            .await?;

        // opaque car card from the catalog; inquiries survive without it
        let details = match self.catalog.car_card(&request.car_id).await {
            Ok(details) => details,
            Err(e) => {
                warn!("no catalog card for {}: {e}", request.car_id);
                Value::Null
            }
        };

        let content = match request.offer {
            Some(offer) => Content::PriceQuote {
                car_id: request.car_id,
                amount: offer.amount,
                currency: offer.currency,
                note: Some(request.message),
                details,
            },
            None => Content::CarLink {
                car_id: request.car_id,
                comment: Some(request.message),
                details,
            },
        };

        let message = self
            .messages
            .send(buyer, conversation.id(), content)
            .await?;

        // re-read: the workflow above moved the membership and the
        // activity clock past our local copy
        let conversation = self.conversations.get(conversation.id()).await?;
        Ok(DealerInquiry::new(conversation, message))
    }
}
