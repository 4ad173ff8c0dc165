//! Tool-call idempotency cache (§3, §4.G step c, §5, §6): `get(key) -> ToolResult?`,
//! `set(key, result)` with TTL, keyed by `(business_id, channel, message_id, tool_name)`
//! so a retried or duplicated webhook delivery never re-executes a tool with
//! side effects.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;

use convo_domain::{Channel, ToolResult};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdempotencyKey {
    pub business_id: String,
    pub channel: Channel,
    pub message_id: String,
    pub tool_name: String,
}

impl IdempotencyKey {
    pub fn new(business_id: impl Into<String>, channel: Channel, message_id: impl Into<String>, tool_name: impl Into<String>) -> Self {
        Self { business_id: business_id.into(), channel, message_id: message_id.into(), tool_name: tool_name.into() }
    }
}

/// Strongly consistent within a session (§5): reads and writes are
/// serialized by the caller's per-session turn lock.
pub struct IdempotencyCache {
    default_ttl: Duration,
    entries: RwLock<HashMap<IdempotencyKey, (ToolResult, DateTime<Utc>)>>,
}

impl IdempotencyCache {
    pub fn new(default_ttl: Duration) -> Self {
        Self { default_ttl, entries: RwLock::new(HashMap::new()) }
    }

    /// Return the cached result for `key`, if present and not expired.
    pub fn get(&self, key: &IdempotencyKey, now: DateTime<Utc>) -> Option<ToolResult> {
        let entries = self.entries.read();
        let (result, expires_at) = entries.get(key)?;
        if now >= *expires_at {
            return None;
        }
        Some(result.clone())
    }

    /// Cache `result` under `key` with the default TTL.
    pub fn set(&self, key: IdempotencyKey, result: ToolResult, now: DateTime<Utc>) {
        self.set_with_ttl(key, result, now, self.default_ttl);
    }

    pub fn set_with_ttl(&self, key: IdempotencyKey, result: ToolResult, now: DateTime<Utc>, ttl: Duration) {
        self.entries.write().insert(key, (result, now + ttl));
    }

    /// Drop expired entries; callers may invoke this periodically to bound
    /// memory, since entries are not proactively evicted otherwise.
    pub fn sweep_expired(&self, now: DateTime<Utc>) {
        self.entries.write().retain(|_, (_, expires_at)| now < *expires_at);
    }
}

impl Default for IdempotencyCache {
    fn default() -> Self {
        Self::new(Duration::hours(24))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> IdempotencyKey {
        IdempotencyKey::new("biz1", Channel::Whatsapp, "msg1", "order_lookup")
    }

    #[test]
    fn cache_hit_returns_previous_result() {
        let cache = IdempotencyCache::default();
        let now = Utc::now();
        let result = ToolResult::ok("order_lookup", "found", serde_json::json!({"status": "shipped"}));
        cache.set(key(), result.clone(), now);

        let got = cache.get(&key(), now).unwrap();
        assert_eq!(got.message, result.message);
    }

    #[test]
    fn expired_entry_is_not_returned() {
        let cache = IdempotencyCache::default();
        let now = Utc::now();
        let result = ToolResult::ok("order_lookup", "found", serde_json::json!({}));
        cache.set_with_ttl(key(), result, now, Duration::seconds(1));

        assert!(cache.get(&key(), now + Duration::seconds(2)).is_none());
    }

    #[test]
    fn sweep_removes_expired_entries() {
        let cache = IdempotencyCache::default();
        let now = Utc::now();
        cache.set_with_ttl(key(), ToolResult::ok("order_lookup", "found", serde_json::json!({})), now, Duration::seconds(1));
        cache.sweep_expired(now + Duration::seconds(2));
        assert!(cache.get(&key(), now + Duration::seconds(2)).is_none());
        assert_eq!(cache.entries.read().len(), 0);
    }
}
