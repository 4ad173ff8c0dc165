use serde::Serialize;

/// Structured trace events emitted across the orchestrator's stages (§4.L).
/// Side-channel fields (tool arguments, LLM text) are expected to already be
/// redacted by the caller before an event reaches here.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    TurnStarted {
        business_id: String,
        channel: String,
        session_id: String,
        message_id: String,
    },
    SessionResolved {
        session_key: String,
        session_id: String,
        is_new: bool,
    },
    SessionLifecycleReset {
        session_key: String,
        old_session_id: String,
        new_session_id: String,
        reason: String,
    },
    ClassificationCompleted {
        intent: String,
        confidence: f32,
        had_classifier_failure: bool,
    },
    RoutingDecided {
        route: String,
    },
    ToolGated {
        allowed: Vec<String>,
        reason: String,
    },
    ToolInvoked {
        tool_name: String,
        outcome: String,
        retried: bool,
        duration_ms: u64,
    },
    RepeatGuardTripped {
        tool_name: String,
        args_hash: String,
    },
    EnumerationLockTripped {
        session_key: String,
        lock_until: String,
    },
    GuardrailApplied {
        action: String,
        reasons: Vec<String>,
    },
    BudgetReportEmitted {
        total_estimated_tokens: usize,
        trimmed_sections: Vec<String>,
    },
    TurnCompleted {
        should_end_session: bool,
        force_end: bool,
        duration_ms: u64,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "orchestrator_event");
    }
}
