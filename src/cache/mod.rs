use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::sync::Arc;

use tokio::sync::Mutex;

/// Fixed-capacity map with least-recently-used eviction. One instance
/// per cached concern, keyed by conversation id, so resident state
/// stays bounded no matter how many conversations a session touches.
pub struct Bounded<K, V> {
    capacity: usize,
    inner: Mutex<Inner<K, V>>,
}

struct Inner<K, V> {
    entries: HashMap<K, V>,
    order: VecDeque<K>,
}

impl<K, V> Bounded<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    pub fn new(capacity: usize) -> Arc<Self> {
        assert!(capacity > 0, "cache capacity must be positive");
        Arc::new(Self {
            capacity,
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
        })
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        let mut inner = self.inner.lock().await;
        let value = inner.entries.get(key).cloned()?;
        touch(&mut inner.order, key);
        Some(value)
    }

    pub async fn put(&self, key: K, value: V) {
        let mut inner = self.inner.lock().await;
        if inner.entries.insert(key.clone(), value).is_some() {
            touch(&mut inner.order, &key);
        } else {
            inner.order.push_back(key);
        }
        while inner.entries.len() > self.capacity {
            match inner.order.pop_front() {
                Some(oldest) => {
                    inner.entries.remove(&oldest);
                }
                None => break,
            }
        }
    }

    pub async fn invalidate(&self, key: &K) {
        let mut inner = self.inner.lock().await;
        inner.entries.remove(key);
        inner.order.retain(|k| k != key);
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn touch<K: Eq>(order: &mut VecDeque<K>, key: &K) {
    if let Some(pos) = order.iter().position(|k| k == key) {
        if let Some(k) = order.remove(pos) {
            order.push_back(k);
        }
    }
}
