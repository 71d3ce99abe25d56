use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde_json::Value;

use super::StoreError;

type Result<T> = std::result::Result<T, StoreError>;

/// Car/dealer metadata collaborator. The returned card is opaque to
/// this crate: it is embedded into message payloads and passed through
/// untouched.
#[async_trait]
pub trait CarCatalog: Send + Sync {
    async fn car_card(&self, car_id: &str) -> Result<Value>;
}

pub type Catalog = Arc<dyn CarCatalog>;

/// Fixed in-process catalog for tests and the demo binary.
#[derive(Default)]
pub struct StaticCatalog {
    cards: RwLock<HashMap<String, Value>>,
}

impl StaticCatalog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn put(&self, car_id: impl Into<String>, card: Value) {
        self.cards
            .write()
            .expect("catalog lock poisoned")
            .insert(car_id.into(), card);
    }
}

#[async_trait]
impl CarCatalog for StaticCatalog {
    async fn car_card(&self, car_id: &str) -> Result<Value> {
        let cards = self.cards.read().expect("catalog lock poisoned");
        Ok(cards.get(car_id).cloned().unwrap_or(Value::Null))
    }
}
