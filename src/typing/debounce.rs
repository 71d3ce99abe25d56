use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

struct Entry {
    handle: JoinHandle<()>,
    generation: u64,
}

struct Inner<K> {
    timers: HashMap<K, Entry>,
    generation: u64,
}

/// Arena of keyed one-shot timers. Arming a key always replaces its
/// previous timer; the callback of a replaced or cancelled timer never
/// runs. Each live key holds exactly one timer.
pub struct DebounceArena<K> {
    inner: Arc<Mutex<Inner<K>>>,
}

impl<K> DebounceArena<K>
where
    K: Clone + Eq + Hash + Send + 'static,
{
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                timers: HashMap::new(),
                generation: 0,
            })),
        }
    }

    pub async fn arm<F>(&self, key: K, delay: Duration, on_fire: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut inner = self.inner.lock().await;
        inner.generation += 1;
        let generation = inner.generation;

        if let Some(previous) = inner.timers.remove(&key) {
            previous.handle.abort();
        }

        let arena = Arc::clone(&self.inner);
        let timer_key = key.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            // the key may have been re-armed or cancelled while we slept
            let current = {
                let mut inner = arena.lock().await;
                let live = inner
                    .timers
                    .get(&timer_key)
                    .is_some_and(|e| e.generation == generation);
                if live {
                    inner.timers.remove(&timer_key);
                }
                live
            };
            if current {
                on_fire.await;
            }
        });

        inner.timers.insert(key, Entry { handle, generation });
    }

    pub async fn cancel(&self, key: &K) -> bool {
        let mut inner = self.inner.lock().await;
        match inner.timers.remove(key) {
            Some(entry) => {
                entry.handle.abort();
                true
            }
            None => false,
        }
    }

    pub async fn cancel_matching<F>(&self, keep_out: F)
    where
        F: Fn(&K) -> bool,
    {
        let mut inner = self.inner.lock().await;
        inner.timers.retain(|key, entry| {
            if keep_out(key) {
                entry.handle.abort();
                false
            } else {
                true
            }
        });
    }

    pub async fn is_armed(&self, key: &K) -> bool {
        self.inner.lock().await.timers.contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn bump(counter: &Arc<AtomicUsize>) -> impl Future<Output = ()> + Send + 'static {
        let counter = Arc::clone(counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_delay() {
        let arena = DebounceArena::new();
        let fired = Arc::new(AtomicUsize::new(0));

        arena.arm("k", Duration::from_secs(3), bump(&fired)).await;
        tokio::time::sleep(Duration::from_millis(2_900)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!arena.is_armed(&"k").await);
    }

    #[tokio::test(start_paused = true)]
    async fn rearm_extends_the_deadline() {
        let arena = DebounceArena::new();
        let fired = Arc::new(AtomicUsize::new(0));

        for _ in 0..5 {
            arena.arm("k", Duration::from_secs(3), bump(&fired)).await;
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        // 2.9s after the last arm: still pending
        tokio::time::sleep(Duration::from_millis(2_800)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_the_callback() {
        let arena = DebounceArena::new();
        let fired = Arc::new(AtomicUsize::new(0));

        arena.arm("k", Duration::from_secs(3), bump(&fired)).await;
        assert!(arena.cancel(&"k").await);
        assert!(!arena.cancel(&"k").await);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn keys_are_independent() {
        let arena = DebounceArena::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        arena.arm("a", Duration::from_secs(1), bump(&first)).await;
        arena.arm("b", Duration::from_secs(3), bump(&second)).await;

        tokio::time::sleep(Duration::from_millis(1_100)).await;
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 0);

        arena.cancel_matching(|k| *k == "b").await;
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(second.load(Ordering::SeqCst), 0);
    }
}
