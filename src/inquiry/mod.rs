use std::sync::Arc;

use crate::{conversation, message};

pub mod model;
pub mod service;

type Result<T> = std::result::Result<T, Error>;
pub type Service = Arc<service::InquiryService>;

#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub enum Error {
    #[error("missing car reference")]
    MissingCar,
    #[error("inquiry message is empty")]
    EmptyMessage,
    #[error("cannot open an inquiry with yourself")]
    SelfInquiry,

    _Conversation(#[from] conversation::Error),
    _Message(#[from] message::Error),
}
