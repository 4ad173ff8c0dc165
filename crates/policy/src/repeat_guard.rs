use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};

use convo_domain::LastToolAttempt;

/// Computes a stable hash over tool call arguments: sort keys, trim and
/// lowercase string values, then take the first 16 hex chars of a SHA-256
/// digest over the canonical JSON (§4.G step b).
pub fn args_hash(arguments: &serde_json::Value) -> String {
    let canonical = canonicalize(arguments);
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    let digest = hasher.finalize();
    hex::encode(digest)[..16].to_string()
}

fn canonicalize(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let parts: Vec<String> = keys
                .into_iter()
                .map(|k| format!("{}={}", k.trim().to_ascii_lowercase(), canonicalize(&map[k])))
                .collect();
            format!("{{{}}}", parts.join(","))
        }
        serde_json::Value::String(s) => s.trim().to_ascii_lowercase(),
        other => other.to_string(),
    }
}

/// Whether a repeated tool call must be short-circuited without execution
/// (§3, §4.B, §4.G step b, §8).
pub fn should_repeat_guard(
    last_attempt: Option<&LastToolAttempt>,
    tool_name: &str,
    current_args_hash: &str,
    now: DateTime<Utc>,
    window_ms: u64,
    has_new_identifier_slot: bool,
) -> bool {
    let Some(attempt) = last_attempt else { return false };
    if attempt.tool_name != tool_name || attempt.args_hash != current_args_hash {
        return false;
    }
    if !attempt.outcome.is_repeat_guard_eligible() {
        return false;
    }
    if has_new_identifier_slot {
        return false;
    }
    (now - attempt.at) < Duration::milliseconds(window_ms as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use convo_domain::ToolOutcome;

    #[test]
    fn args_hash_is_order_and_case_insensitive() {
        let a = serde_json::json!({"Order_Number": " ORD-1 ", "Phone": "0555"});
        let b = serde_json::json!({"phone": "0555", "order_number": "ord-1"});
        assert_eq!(args_hash(&a), args_hash(&b));
    }

    #[test]
    fn repeat_guard_trips_on_matching_recent_not_found() {
        let attempt = LastToolAttempt {
            tool_name: "order_lookup".into(),
            args_hash: "deadbeef".into(),
            outcome: ToolOutcome::NotFound,
            count: 1,
            ask_for: None,
            at: Utc::now(),
        };
        assert!(should_repeat_guard(
            Some(&attempt),
            "order_lookup",
            "deadbeef",
            Utc::now(),
            600_000,
            false,
        ));
    }

    #[test]
    fn repeat_guard_does_not_trip_with_new_identifier() {
        let attempt = LastToolAttempt {
            tool_name: "order_lookup".into(),
            args_hash: "deadbeef".into(),
            outcome: ToolOutcome::NotFound,
            count: 1,
            ask_for: None,
            at: Utc::now(),
        };
        assert!(!should_repeat_guard(
            Some(&attempt),
            "order_lookup",
            "deadbeef",
            Utc::now(),
            600_000,
            true,
        ));
    }

    #[test]
    fn repeat_guard_ignores_successful_outcomes() {
        let attempt = LastToolAttempt {
            tool_name: "order_lookup".into(),
            args_hash: "deadbeef".into(),
            outcome: ToolOutcome::Ok,
            count: 1,
            ask_for: None,
            at: Utc::now(),
        };
        assert!(!should_repeat_guard(Some(&attempt), "order_lookup", "deadbeef", Utc::now(), 600_000, false));
    }
}
