//! Response cache for generated answers
//!
//! Keys combine the question with a fingerprint of the customer's data, so a
//! new transaction or balance change misses the cache.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};
use tracing::debug;

/// Characters of the normalized message that take part in the key
const KEY_MESSAGE_CHARS: usize = 50;
/// Entries dropped at once when over capacity
const EVICT_BATCH: usize = 20;

/// SHA-256 of the normalized message prefix plus balance and transaction count
pub fn cache_key(message: &str, total_balance: f64, transaction_count: usize) -> String {
    let normalized: String = message
        .trim()
        .to_lowercase()
        .chars()
        .take(KEY_MESSAGE_CHARS)
        .collect();
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    hasher.update(format!("|{:.2}|{}", total_balance, transaction_count).as_bytes());
    hex::encode(hasher.finalize())
}

struct CacheEntry {
    response: String,
    inserted_at: Instant,
}

/// Time-limited, size-bounded answer cache
pub struct ResponseCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
    capacity: usize,
}

impl ResponseCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            capacity,
        }
    }

    /// Cached answer if present and younger than the TTL
    pub fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().ok()?;
        match entries.get(key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => Some(entry.response.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: String, response: String) {
        let Ok(mut entries) = self.entries.lock() else {
            return;
        };
        entries.insert(
            key,
            CacheEntry {
                response,
                inserted_at: Instant::now(),
            },
        );

        if entries.len() > self.capacity {
            let mut by_age: Vec<(String, Instant)> = entries
                .iter()
                .map(|(k, e)| (k.clone(), e.inserted_at))
                .collect();
            by_age.sort_by_key(|(_, inserted_at)| *inserted_at);
            for (key, _) in by_age.into_iter().take(EVICT_BATCH) {
                entries.remove(&key);
            }
            debug!(remaining = entries.len(), "Evicted oldest cached responses");
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_normalizes_message() {
        let a = cache_key("  What is my BALANCE? ", 100.0, 3);
        let b = cache_key("what is my balance?", 100.0, 3);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_key_depends_on_data_fingerprint() {
        let base = cache_key("balance", 100.0, 3);
        assert_ne!(base, cache_key("balance", 100.5, 3));
        assert_ne!(base, cache_key("balance", 100.0, 4));
    }

    #[test]
    fn test_key_uses_first_fifty_chars() {
        let prefix = "x".repeat(50);
        assert_eq!(
            cache_key(&format!("{}tail one", prefix), 1.0, 1),
            cache_key(&format!("{}tail two", prefix), 1.0, 1)
        );
    }

    #[test]
    fn test_get_and_expiry() {
        let cache = ResponseCache::new(Duration::from_secs(60), 10);
        cache.insert("k".into(), "v".into());
        assert_eq!(cache.get("k").as_deref(), Some("v"));
        assert!(cache.get("missing").is_none());

        let expired = ResponseCache::new(Duration::ZERO, 10);
        expired.insert("k".into(), "v".into());
        assert!(expired.get("k").is_none());
        assert!(expired.is_empty());
    }

    #[test]
    fn test_evicts_oldest_batch_over_capacity() {
        let cache = ResponseCache::new(Duration::from_secs(60), 100);
        for i in 0..101 {
            cache.insert(format!("k{}", i), format!("v{}", i));
            std::thread::sleep(Duration::from_micros(50));
        }
        assert_eq!(cache.len(), 81);
        assert!(cache.get("k0").is_none());
        assert!(cache.get("k19").is_none());
        assert!(cache.get("k20").is_some());
        assert!(cache.get("k100").is_some());
    }
}
