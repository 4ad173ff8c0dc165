use chrono::{DateTime, Duration, Utc};

/// Result of checking the enumeration lock (§4.B, §8).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumerationCheck {
    Clear,
    Lock { lock_until: DateTime<Utc> },
}

/// Checks the enumeration lock against `Session.consecutive_not_found` — a
/// counter kept independent of `(tool_name, args_hash)` so it still trips on
/// *varying* identifiers (§4.B, §8, glossary: "patterns consistent with
/// credential/identifier probing"), unlike the single-slot repeat-attempt
/// ledger, which only ever sees one `(tool_name, args_hash)` at a time.
pub fn check_enumeration_lock(
    consecutive_not_found: u32,
    last_not_found_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    threshold: u32,
    window_secs: i64,
    lock_duration_secs: i64,
) -> EnumerationCheck {
    let Some(at) = last_not_found_at else {
        return EnumerationCheck::Clear;
    };
    if (now - at) > Duration::seconds(window_secs) {
        return EnumerationCheck::Clear;
    }
    if consecutive_not_found >= threshold {
        EnumerationCheck::Lock { lock_until: now + Duration::seconds(lock_duration_secs) }
    } else {
        EnumerationCheck::Clear
    }
}
