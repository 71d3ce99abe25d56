use std::sync::Arc;

pub mod service;

pub type Tracker = Arc<service::PresenceTracker>;
