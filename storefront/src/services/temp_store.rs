// storefront/src/services/temp_store.rs

//! Short-lived key/value state (sign-in codes, sessions).

use crate::errors::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::debug;

#[async_trait]
pub trait TempStore: Send + Sync {
  /// Stores `value` under `key`, replacing any previous entry.
  async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<()>;

  async fn get(&self, key: &str) -> Result<Option<String>>;

  /// Removes the entry and returns it if it had not expired.
  async fn take(&self, key: &str) -> Result<Option<String>>;

  /// Atomically increments the counter at `key` and returns the new value.
  /// A missing or expired counter starts at zero and lives for `ttl`; later
  /// increments keep the original expiry.
  async fn incr(&self, key: &str, ttl: Duration) -> Result<u64>;
}

struct Entry {
  value: String,
  expires_at: Instant,
}

/// In-process [`TempStore`]. Expired entries are never returned. They are
/// dropped when looked up, or in bulk by [`MemoryTempStore::spawn_purger`].
#[derive(Default)]
pub struct MemoryTempStore {
  entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryTempStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Removes every expired entry and returns how many were dropped.
  pub fn purge_expired(&self) -> usize {
    let now = Instant::now();
    let mut entries = self.entries.lock();
    let before = entries.len();
    entries.retain(|_, entry| entry.expires_at > now);
    before - entries.len()
  }

  /// Purges expired entries every `every` on a background task. The task
  /// ends once the store itself has been dropped.
  pub fn spawn_purger(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
    let store: Weak<Self> = Arc::downgrade(self);
    tokio::spawn(async move {
      let mut ticker = tokio::time::interval(every);
      ticker.tick().await;
      loop {
        ticker.tick().await;
        let Some(store) = store.upgrade() else { break };
        let dropped = store.purge_expired();
        if dropped > 0 {
          debug!(dropped, "Purged expired temp entries.");
        }
      }
    })
  }

  pub fn len(&self) -> usize {
    self.entries.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

#[async_trait]
impl TempStore for MemoryTempStore {
  async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
    let entry = Entry {
      value,
      expires_at: Instant::now() + ttl,
    };
    self.entries.lock().insert(key.to_string(), entry);
    Ok(())
  }

  async fn get(&self, key: &str) -> Result<Option<String>> {
    let mut entries = self.entries.lock();
    let expired = match entries.get(key) {
      Some(entry) if entry.expires_at > Instant::now() => return Ok(Some(entry.value.clone())),
      Some(_) => true,
      None => false,
    };
    if expired {
      entries.remove(key);
    }
    Ok(None)
  }

  async fn take(&self, key: &str) -> Result<Option<String>> {
    let entry = self.entries.lock().remove(key);
    Ok(entry.filter(|e| e.expires_at > Instant::now()).map(|e| e.value))
  }

  async fn incr(&self, key: &str, ttl: Duration) -> Result<u64> {
    let now = Instant::now();
    let mut entries = self.entries.lock();
    let (current, expires_at) = match entries.get(key) {
      Some(entry) if entry.expires_at > now => (entry.value.parse::<u64>().unwrap_or(0), entry.expires_at),
      _ => (0, now + ttl),
    };
    let next = current.saturating_add(1);
    entries.insert(
      key.to_string(),
      Entry {
        value: next.to_string(),
        expires_at,
      },
    );
    Ok(next)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn values_expire() {
    let store = MemoryTempStore::new();
    store.put("otp:a", "123456".to_string(), Duration::from_millis(20)).await.unwrap();
    assert_eq!(store.get("otp:a").await.unwrap().as_deref(), Some("123456"));

    tokio::time::sleep(Duration::from_millis(40)).await;
    assert_eq!(store.get("otp:a").await.unwrap(), None);
    assert_eq!(store.take("otp:a").await.unwrap(), None);
  }

  #[tokio::test]
  async fn take_consumes_the_entry() {
    let store = MemoryTempStore::new();
    store.put("session:x", "user".to_string(), Duration::from_secs(60)).await.unwrap();
    assert_eq!(store.take("session:x").await.unwrap().as_deref(), Some("user"));
    assert_eq!(store.get("session:x").await.unwrap(), None);
  }

  #[tokio::test]
  async fn purge_drops_only_expired_entries() {
    let store = MemoryTempStore::new();
    store.put("short", "1".to_string(), Duration::from_millis(1)).await.unwrap();
    store.put("long", "2".to_string(), Duration::from_secs(60)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(store.purge_expired(), 1);
    assert_eq!(store.get("long").await.unwrap().as_deref(), Some("2"));
  }

  #[tokio::test]
  async fn counters_increment_and_expire() {
    let store = MemoryTempStore::new();
    assert_eq!(store.incr("n", Duration::from_millis(30)).await.unwrap(), 1);
    assert_eq!(store.incr("n", Duration::from_secs(60)).await.unwrap(), 2);

    // The second call did not extend the first expiry.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(store.incr("n", Duration::from_secs(60)).await.unwrap(), 1);
  }

  #[tokio::test]
  async fn purger_clears_entries_nobody_reads_again() {
    let store = Arc::new(MemoryTempStore::new());
    for i in 0..20 {
      store
        .put(&format!("session:{}", i), "user".to_string(), Duration::from_millis(5))
        .await
        .unwrap();
    }
    store.put("session:keep", "user".to_string(), Duration::from_secs(60)).await.unwrap();
    let purger = store.spawn_purger(Duration::from_millis(10));

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(store.len(), 1);

    drop(store);
    tokio::time::timeout(Duration::from_secs(1), purger)
      .await
      .expect("purger stops once the store is gone")
      .unwrap();
  }
}
