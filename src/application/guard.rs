use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// Deterministic in-flight key for an operation and its payload.
///
/// Two calls with the same operation name and a structurally equal payload
/// produce the same key, so collaborators can detect that a logically
/// identical operation is already being issued.
pub fn in_flight_key(operation: &str, payload: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(operation.as_bytes());
    hasher.update([0u8]);
    hasher.update(payload.to_string().as_bytes());
    let digest = hasher.finalize();
    format!("{operation}:{}", hex::encode(&digest[..16]))
}

/// Time-bounded registry of in-flight operation keys.
///
/// `try_begin` hands out a ticket per key; holding the ticket marks the
/// operation as in flight, dropping it releases the key. Entries older than
/// the TTL are treated as abandoned and reclaimed, so a collaborator that
/// never drops its ticket cannot block the key forever.
#[derive(Clone)]
pub struct InFlightRegistry {
    entries: Arc<Mutex<HashMap<String, Instant>>>,
    ttl: Duration,
}

impl Default for InFlightRegistry {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    /// Marks `key` as in flight. Returns `None` when a live entry for the
    /// same key already exists.
    pub fn try_begin(&self, key: impl Into<String>) -> Option<InFlightTicket> {
        let key = key.into();
        let mut entries = self.entries.lock().expect("in-flight registry poisoned");
        let now = Instant::now();
        entries.retain(|_, started| now.duration_since(*started) < self.ttl);
        if entries.contains_key(&key) {
            return None;
        }
        entries.insert(key.clone(), now);
        Some(InFlightTicket {
            key,
            started: now,
            entries: Arc::clone(&self.entries),
        })
    }

    pub fn is_in_flight(&self, key: &str) -> bool {
        let mut entries = self.entries.lock().expect("in-flight registry poisoned");
        let now = Instant::now();
        entries.retain(|_, started| now.duration_since(*started) < self.ttl);
        entries.contains_key(key)
    }
}

/// RAII marker for one in-flight operation; releases its key on drop.
pub struct InFlightTicket {
    key: String,
    started: Instant,
    entries: Arc<Mutex<HashMap<String, Instant>>>,
}

impl InFlightTicket {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for InFlightTicket {
    fn drop(&mut self) {
        if let Ok(mut entries) = self.entries.lock() {
            // Only release the entry this ticket created: a stale ticket
            // dropped after TTL reclamation must not evict the new holder.
            if entries.get(&self.key) == Some(&self.started) {
                entries.remove(&self.key);
            }
        }
    }
}
