//! Session lifecycle reset — daily boundary + idle timeout, per channel (§4.C).
//!
//! A lifecycle reset is routine and never punitive: it mints a fresh
//! `session_id` for the same `SessionKey` while preserving slots and the
//! anchor, so the classifier and guardrails keep their continuity even
//! though the durable session record has rolled over.

use chrono::{DateTime, Utc};

use convo_domain::{Channel, LifecycleConfig, Session, TraceEvent};

/// Reason a session was reset, if any.
#[derive(Debug, Clone)]
pub enum ResetReason {
    DailyReset { hour: u8 },
    IdleTimeout { idle_minutes: u32 },
}

impl std::fmt::Display for ResetReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DailyReset { hour } => write!(f, "daily reset (hour={hour})"),
            Self::IdleTimeout { idle_minutes } => write!(f, "idle timeout ({idle_minutes}m)"),
        }
    }
}

/// Evaluates whether a session should be reset, and applies the reset.
pub struct LifecycleManager {
    config: LifecycleConfig,
}

impl LifecycleManager {
    pub fn new(config: LifecycleConfig) -> Self {
        Self { config }
    }

    /// Evaluate whether `session` should be reset given the current time and
    /// channel. Returns `Some(reason)` if a reset is needed.
    pub fn should_reset(&self, session: &Session, channel: Channel, now: DateTime<Utc>) -> Option<ResetReason> {
        let daily_hour = self.config.daily_reset_hour_for(channel);
        let idle_minutes = self.config.idle_timeout_minutes_for(channel);

        if crossed_daily_boundary(session.last_active_at, now, daily_hour) {
            return Some(ResetReason::DailyReset { hour: daily_hour });
        }

        let elapsed = now.signed_duration_since(session.last_active_at).num_minutes();
        if elapsed >= idle_minutes as i64 {
            return Some(ResetReason::IdleTimeout { idle_minutes });
        }

        None
    }

    /// Mint a fresh `session_id` for `session` in place, preserving slots and
    /// anchor for identity continuity (§4.C). Clears the in-progress flow
    /// state, since a reset session always resumes from `Idle`.
    pub fn apply_reset(&self, session: &mut Session, reason: &ResetReason, now: DateTime<Utc>) {
        let old_id = session.session_id.clone();
        let new_id = uuid::Uuid::new_v4().to_string();

        session.session_id = new_id.clone();
        session.created_at = now;
        session.last_active_at = now;
        session.flow_status = convo_domain::FlowStatus::Idle;
        session.active_flow = None;
        session.post_result_turns = 0;
        session.verification = Default::default();
        session.last_tool_attempt = None;

        TraceEvent::SessionLifecycleReset {
            session_key: session.key.as_string(),
            old_session_id: old_id,
            new_session_id: new_id,
            reason: reason.to_string(),
        }
        .emit();
    }
}

/// Check whether the daily boundary at `hour` was crossed between
/// `last_active` and `now`.
fn crossed_daily_boundary(last_active: DateTime<Utc>, now: DateTime<Utc>, hour: u8) -> bool {
    if now.signed_duration_since(last_active).num_seconds() < 60 {
        return false;
    }

    let Some(today_boundary) = now.date_naive().and_hms_opt(hour as u32, 0, 0) else {
        return false;
    };
    let today_boundary = today_boundary.and_utc();

    let boundary = if now >= today_boundary {
        today_boundary
    } else {
        today_boundary - chrono::Duration::days(1)
    };

    last_active < boundary && now >= boundary
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use convo_domain::SessionKey;

    fn session_at(last_active: DateTime<Utc>) -> Session {
        let key = SessionKey::new(Channel::Whatsapp, "biz1", "user1");
        let mut s = Session::new("s1", key, last_active);
        s.last_active_at = last_active;
        s
    }

    #[test]
    fn daily_boundary_crossed() {
        let last = Utc.with_ymd_and_hms(2026, 1, 15, 3, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 5, 0, 0).unwrap();
        assert!(crossed_daily_boundary(last, now, 4));
    }

    #[test]
    fn daily_boundary_not_crossed() {
        let last = Utc.with_ymd_and_hms(2026, 1, 15, 5, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 6, 0, 0).unwrap();
        assert!(!crossed_daily_boundary(last, now, 4));
    }

    #[test]
    fn daily_boundary_across_days() {
        let last = Utc.with_ymd_and_hms(2026, 1, 14, 23, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 5, 0, 0).unwrap();
        assert!(crossed_daily_boundary(last, now, 4));
    }

    #[test]
    fn idle_timeout_triggers_reset() {
        let now = Utc::now();
        let session = session_at(now - chrono::Duration::minutes(45));
        let mgr = LifecycleManager::new(LifecycleConfig { idle_timeout_minutes: 30, ..Default::default() });
        let reason = mgr.should_reset(&session, Channel::Whatsapp, now);
        assert!(matches!(reason, Some(ResetReason::IdleTimeout { .. })));
    }

    #[test]
    fn reset_preserves_slots_and_anchor() {
        let now = Utc::now();
        let mut session = session_at(now - chrono::Duration::minutes(45));
        session.merge_slots([("order_number".to_string(), "ORD-1".to_string())]);
        let mgr = LifecycleManager::new(LifecycleConfig::default());
        let reason = ResetReason::IdleTimeout { idle_minutes: 30 };
        let old_id = session.session_id.clone();

        mgr.apply_reset(&mut session, &reason, now);

        assert_ne!(session.session_id, old_id);
        assert_eq!(session.extracted_slots.get("order_number").map(String::as_str), Some("ORD-1"));
        assert_eq!(session.flow_status, convo_domain::FlowStatus::Idle);
    }
}
