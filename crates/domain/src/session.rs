use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::turn::Channel;

/// Outer session state machine (§4.H): `Idle -> InProgress -> PostResult -> Idle`
/// (auto after three follow-ups), with `Terminated` reachable from anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowStatus {
    Idle,
    InProgress,
    PostResult,
    Terminated,
}

/// Coarse task state constraining which tools and verification rules apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveFlow {
    OrderStatus,
    DebtInquiry,
    TrackingInfo,
    AccountLookup,
    StockCheck,
    ProductInfo,
    CallbackRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorType {
    Stock,
    Order,
}

/// The last verified truth for a flow, used to detect disputes or disambiguate
/// follow-ups (e.g. "kaç tane var?" after a `Stock` anchor).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Anchor {
    pub anchor_type: AnchorType,
    pub truth: serde_json::Value,
    pub set_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    None,
    Pending,
    Verified,
}

/// Verification sub-state (§4.H): three failed attempts terminate the outer session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationState {
    pub status: VerificationStatus,
    pub pending_field: Option<String>,
    pub attempts: u8,
}

impl Default for VerificationState {
    fn default() -> Self {
        Self { status: VerificationStatus::None, pending_field: None, attempts: 0 }
    }
}

impl VerificationState {
    pub const MAX_ATTEMPTS: u8 = 3;

    pub fn record_failed_attempt(&mut self) -> bool {
        self.attempts = (self.attempts + 1).min(Self::MAX_ATTEMPTS);
        self.attempts >= Self::MAX_ATTEMPTS
    }
}

/// Repeat-attempt ledger entry: a single fixed-size slot per session (§9),
/// pruned by age rather than grown unbounded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastToolAttempt {
    pub tool_name: String,
    pub args_hash: String,
    pub outcome: crate::tool::ToolOutcome,
    pub count: u32,
    pub ask_for: Option<Vec<String>>,
    pub at: DateTime<Utc>,
}

impl LastToolAttempt {
    /// Entries older than 10 minutes are ignored by the repeat-guard (§3).
    pub const WINDOW_SECS: i64 = 600;

    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        (now - self.at).num_seconds() < Self::WINDOW_SECS
    }
}

/// Deterministic key so the same real-world customer always lands on the
/// same session across turns, unless a caller supplies an explicit id (§4.C).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub channel: Channel,
    pub business_id: String,
    pub channel_user_id: String,
}

impl SessionKey {
    pub fn new(channel: Channel, business_id: impl Into<String>, channel_user_id: impl Into<String>) -> Self {
        Self { channel, business_id: business_id.into(), channel_user_id: channel_user_id.into() }
    }

    /// Stable string form used as the storage key / log field.
    pub fn as_string(&self) -> String {
        format!("{:?}:{}:{}", self.channel, self.business_id, self.channel_user_id)
    }
}

/// Per-session record owned exclusively by the persistence layer (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub key: SessionKey,
    pub flow_status: FlowStatus,
    pub active_flow: Option<ActiveFlow>,
    pub post_result_turns: u8,
    pub extracted_slots: std::collections::HashMap<String, String>,
    pub anchor: Option<Anchor>,
    pub verification: VerificationState,
    pub last_tool_attempt: Option<LastToolAttempt>,
    /// Consecutive `NotFound` results regardless of which tool or args
    /// produced them — the enumeration lock's real counter (§4.B, §8): a
    /// prober varying identifiers never repeats `(tool_name, args_hash)`,
    /// so `last_tool_attempt.count` alone can't catch it.
    pub consecutive_not_found: u32,
    pub last_not_found_at: Option<DateTime<Utc>>,
    pub termination_reason: Option<String>,
    pub lock_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
}

impl Session {
    pub fn new(session_id: impl Into<String>, key: SessionKey, now: DateTime<Utc>) -> Self {
        Self {
            session_id: session_id.into(),
            key,
            flow_status: FlowStatus::Idle,
            active_flow: None,
            post_result_turns: 0,
            extracted_slots: std::collections::HashMap::new(),
            anchor: None,
            verification: VerificationState::default(),
            last_tool_attempt: None,
            consecutive_not_found: 0,
            last_not_found_at: None,
            termination_reason: None,
            lock_until: None,
            created_at: now,
            last_active_at: now,
        }
    }

    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        matches!(self.flow_status, FlowStatus::Terminated)
            && self.lock_until.map(|until| now < until).unwrap_or(true)
    }

    pub fn terminate(&mut self, reason: impl Into<String>, lock_until: Option<DateTime<Utc>>) {
        self.flow_status = FlowStatus::Terminated;
        self.termination_reason = Some(reason.into());
        self.lock_until = lock_until;
    }

    /// Post-result counter auto-resets the session to idle after three
    /// consecutive follow-ups, preserving slots/anchor for stock-follow-up
    /// detection after expiry (§4.C).
    pub fn advance_post_result(&mut self) {
        if self.flow_status != FlowStatus::PostResult {
            return;
        }
        self.post_result_turns += 1;
        if self.post_result_turns >= 3 {
            self.flow_status = FlowStatus::Idle;
            self.active_flow = None;
            self.post_result_turns = 0;
        }
    }

    pub fn merge_slots(&mut self, slots: impl IntoIterator<Item = (String, String)>) {
        for (k, v) in slots {
            self.extracted_slots.insert(k, v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_caps_at_three_attempts() {
        let mut v = VerificationState::default();
        assert!(!v.record_failed_attempt());
        assert!(!v.record_failed_attempt());
        assert!(v.record_failed_attempt());
        assert_eq!(v.attempts, 3);
        assert!(!v.record_failed_attempt());
        assert_eq!(v.attempts, 3);
    }

    #[test]
    fn post_result_resets_after_three_turns() {
        let key = SessionKey::new(Channel::Whatsapp, "biz1", "user1");
        let mut s = Session::new("s1", key, Utc::now());
        s.flow_status = FlowStatus::PostResult;
        s.active_flow = Some(ActiveFlow::OrderStatus);
        s.advance_post_result();
        s.advance_post_result();
        assert_eq!(s.flow_status, FlowStatus::PostResult);
        s.advance_post_result();
        assert_eq!(s.flow_status, FlowStatus::Idle);
        assert!(s.active_flow.is_none());
    }

    #[test]
    fn repeat_attempt_freshness_window() {
        let attempt = LastToolAttempt {
            tool_name: "order_lookup".into(),
            args_hash: "abc".into(),
            outcome: crate::tool::ToolOutcome::NotFound,
            count: 1,
            ask_for: None,
            at: Utc::now() - chrono::Duration::minutes(11),
        };
        assert!(!attempt.is_fresh(Utc::now()));
    }
}
