use crate::errors::{AppError, AppResult};
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;

type Outcome<V> = Option<AppResult<V>>;
type Entries<K, V> = Arc<Mutex<HashMap<K, InflightEntry<V>>>>;

struct InflightEntry<V> {
    generation: u64,
    outcome: watch::Receiver<Outcome<V>>,
}

pub struct InflightMap<K, V> {
    entries: Entries<K, V>,
    next_generation: AtomicU64,
    label: &'static str,
}

struct InflightGuard<K: Eq + Hash, V> {
    entries: Entries<K, V>,
    key: K,
    generation: u64,
}

impl<K: Eq + Hash, V> Drop for InflightGuard<K, V> {
    fn drop(&mut self) {
        let mut entries = lock_entries(&self.entries);
        let owned = entries
            .get(&self.key)
            .is_some_and(|entry| entry.generation == self.generation);
        if owned {
            entries.remove(&self.key);
        }
    }
}

impl<K, V> InflightMap<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(label: &'static str) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(1),
            label,
        }
    }

    pub fn len(&self) -> usize {
        lock_entries(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &K) -> bool {
        lock_entries(&self.entries).contains_key(key)
    }

    pub async fn run<F, Fut>(&self, key: K, start: F) -> AppResult<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<V>> + Send + 'static,
    {
        let mut outcome = self.join_or_start(key, start);
        let settled = outcome
            .wait_for(Option::is_some)
            .await
            .map(|value| (*value).clone());
        match settled {
            Ok(Some(result)) => result,
            _ => Err(AppError::Internal(format!(
                "{} operation ended without a result",
                self.label
            ))),
        }
    }

    fn join_or_start<F, Fut>(&self, key: K, start: F) -> watch::Receiver<Outcome<V>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<V>> + Send + 'static,
    {
        let (sender, receiver, generation) = {
            let mut entries = lock_entries(&self.entries);
            if let Some(entry) = entries.get(&key) {
                tracing::debug!(operation = self.label, generation = entry.generation, "joining in-flight operation");
                return entry.outcome.clone();
            }
            let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
            let (sender, receiver) = watch::channel(None);
            entries.insert(
                key.clone(),
                InflightEntry {
                    generation,
                    outcome: receiver.clone(),
                },
            );
            (sender, receiver, generation)
        };

        let guard = InflightGuard {
            entries: Arc::clone(&self.entries),
            key,
            generation,
        };
        tracing::debug!(operation = self.label, generation, "starting operation");
        let operation = start();
        tokio::spawn(async move {
            // The key is released before the result is published.
            let result = {
                let _guard = guard;
                operation.await
            };
            let _ = sender.send(Some(result));
        });
        receiver
    }
}

fn lock_entries<K, V>(entries: &Mutex<HashMap<K, InflightEntry<V>>>) -> MutexGuard<'_, HashMap<K, InflightEntry<V>>> {
    // Nothing panics while the map is held, so a poisoned lock still guards a consistent map.
    entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
