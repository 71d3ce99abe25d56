use std::sync::Arc;

pub mod debounce;
pub mod service;

pub type Coordinator = Arc<service::TypingCoordinator>;
