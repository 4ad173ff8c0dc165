use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A function call the LLM asked the orchestrator to execute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub call_id: String,
    pub tool_name: String,
    pub arguments: serde_json::Value,
}

/// Tool definition exposed to the LLM (name, description, JSON-schema args).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Outcome tag every tool must resolve to. Unknown/legacy strings normalize
/// to `InfraError` via [`normalize_outcome`] rather than panicking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolOutcome {
    Ok,
    NotFound,
    NeedMoreInfo,
    VerificationRequired,
    Denied,
    InfraError,
}

impl ToolOutcome {
    /// Outcomes that feed the repeat-attempt ledger (§4.B, §8).
    pub fn is_repeat_guard_eligible(self) -> bool {
        matches!(self, ToolOutcome::NotFound | ToolOutcome::NeedMoreInfo)
    }

    /// Outcomes that short-circuit the tool loop without a further LLM call (§4.G step h).
    pub fn is_terminal(self) -> bool {
        matches!(self, ToolOutcome::NotFound | ToolOutcome::Denied | ToolOutcome::InfraError)
    }
}

/// Map a legacy/free-form outcome string onto the typed enum. Anything
/// unrecognized becomes `InfraError` rather than being dropped silently.
pub fn normalize_outcome(raw: &str) -> ToolOutcome {
    match raw.trim().to_ascii_lowercase().as_str() {
        "ok" | "success" => ToolOutcome::Ok,
        "not_found" | "notfound" => ToolOutcome::NotFound,
        "need_more_info" | "needmoreinfo" => ToolOutcome::NeedMoreInfo,
        "verification_required" | "verificationrequired" => ToolOutcome::VerificationRequired,
        "denied" => ToolOutcome::Denied,
        _ => ToolOutcome::InfraError,
    }
}

/// Declarative state transition a tool result asks the policy kernel to apply.
/// Kept data-only so the kernel stays pure: no tool ever mutates `Session` directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StateEvent {
    SetAnchor { anchor_type: String, truth: serde_json::Value },
    ClearVerification,
    SetActiveFlow { flow: String },
    ClearActiveFlow,
}

/// The contract every tool produces and every later stage consumes read-only (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool_name: String,
    pub outcome: ToolOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ask_for: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_events: Option<Vec<StateEvent>>,
}

impl ToolResult {
    pub fn ok(tool_name: impl Into<String>, message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            tool_name: tool_name.into(),
            outcome: ToolOutcome::Ok,
            data: Some(data),
            message: message.into(),
            ask_for: None,
            state_events: None,
        }
    }

    pub fn not_found(tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            outcome: ToolOutcome::NotFound,
            data: None,
            message: message.into(),
            ask_for: None,
            state_events: None,
        }
    }

    pub fn need_more_info(tool_name: impl Into<String>, message: impl Into<String>, ask_for: Vec<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            outcome: ToolOutcome::NeedMoreInfo,
            data: None,
            message: message.into(),
            ask_for: Some(ask_for),
            state_events: None,
        }
    }

    pub fn infra_error(tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            outcome: ToolOutcome::InfraError,
            data: None,
            message: message.into(),
            ask_for: None,
            state_events: None,
        }
    }

    /// The view of this result that may be sent back to the LLM: internal
    /// flags never cross that boundary, only `message` and, for `Ok`, `data` (§4.G step h).
    pub fn model_facing_content(&self) -> String {
        match (&self.outcome, &self.data) {
            (ToolOutcome::Ok, Some(data)) => {
                format!("{}\n{}", self.message, data)
            }
            _ => self.message.clone(),
        }
    }
}

/// Preconditions a tool declares against the currently extracted slots (§4.G step a).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolPrecondition {
    pub required_slots: Vec<String>,
    /// Localized guidance keyed by language code (`"tr"`, `"en"`).
    pub guidance_per_language: HashMap<String, String>,
}

/// Field whitelist applied during sanitization (§4.G step e).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldWhitelist {
    pub required: Vec<String>,
    pub priority: Vec<String>,
    pub optional: Vec<String>,
}

/// Static metadata describing a tool, independent of any single call (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCatalogEntry {
    pub name: String,
    pub description: String,
    pub parameter_schema: serde_json::Value,
    pub preconditions: ToolPrecondition,
    pub field_whitelist: FieldWhitelist,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_outcome_unknown_is_infra_error() {
        assert_eq!(normalize_outcome("weird_status"), ToolOutcome::InfraError);
        assert_eq!(normalize_outcome("OK"), ToolOutcome::Ok);
        assert_eq!(normalize_outcome(" Not_Found "), ToolOutcome::NotFound);
    }

    #[test]
    fn terminal_and_repeat_guard_classification() {
        assert!(ToolOutcome::NotFound.is_terminal());
        assert!(ToolOutcome::NotFound.is_repeat_guard_eligible());
        assert!(!ToolOutcome::Ok.is_terminal());
        assert!(ToolOutcome::NeedMoreInfo.is_repeat_guard_eligible());
        assert!(!ToolOutcome::VerificationRequired.is_repeat_guard_eligible());
    }

    #[test]
    fn model_facing_content_hides_internal_flags() {
        let r = ToolResult::ok("stock_check", "3 adet stokta var", serde_json::json!({"qty": 3}));
        assert!(r.model_facing_content().contains("3 adet"));
        let nf = ToolResult::not_found("order_lookup", "Sipariş bulunamadı");
        assert_eq!(nf.model_facing_content(), "Sipariş bulunamadı");
    }
}
