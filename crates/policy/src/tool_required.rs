use convo_domain::{IntentType, ToolOutcome, ToolResult};

/// What the router must do when a tool-required intent lacks a successful
/// tool result (§4.B).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolRequiredDecision {
    /// A successful result exists (or the intent isn't tool-required); the
    /// reply may proceed normally.
    Satisfied,
    /// No tool ran, or it returned a non-terminal outcome: ask for the
    /// missing identifiers.
    AskForVerification(Vec<String>),
    /// A tool returned `InfraError`: surface a system-error message.
    SystemError,
    /// A tool returned `VerificationRequired`: surface an identity check.
    IdentityCheck(Vec<String>),
}

/// Enforces that tool-required intents never assert facts without a
/// successful tool result (§4.B, §8).
pub fn enforce_tool_required(intent: IntentType, tool_results: &[ToolResult]) -> ToolRequiredDecision {
    if !intent.is_tool_required() {
        return ToolRequiredDecision::Satisfied;
    }
    if tool_results.iter().any(|r| r.outcome == ToolOutcome::Ok) {
        return ToolRequiredDecision::Satisfied;
    }
    if tool_results.iter().any(|r| r.outcome == ToolOutcome::InfraError) {
        return ToolRequiredDecision::SystemError;
    }
    if let Some(r) = tool_results.iter().find(|r| r.outcome == ToolOutcome::VerificationRequired) {
        return ToolRequiredDecision::IdentityCheck(r.ask_for.clone().unwrap_or_default());
    }
    let ask_for = tool_results
        .iter()
        .find_map(|r| r.ask_for.clone())
        .unwrap_or_default();
    ToolRequiredDecision::AskForVerification(ask_for)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_tool_required_intent_is_always_satisfied() {
        let decision = enforce_tool_required(IntentType::Chatter, &[]);
        assert_eq!(decision, ToolRequiredDecision::Satisfied);
    }

    #[test]
    fn tool_required_with_no_results_asks_for_verification() {
        let decision = enforce_tool_required(IntentType::Order, &[]);
        assert_eq!(decision, ToolRequiredDecision::AskForVerification(vec![]));
    }

    #[test]
    fn infra_error_yields_system_error() {
        let results = vec![ToolResult::infra_error("order_lookup", "upstream down")];
        let decision = enforce_tool_required(IntentType::Order, &results);
        assert_eq!(decision, ToolRequiredDecision::SystemError);
    }

    #[test]
    fn successful_result_satisfies() {
        let results = vec![ToolResult::ok("order_lookup", "found", serde_json::json!({"id": 1}))];
        let decision = enforce_tool_required(IntentType::Order, &results);
        assert_eq!(decision, ToolRequiredDecision::Satisfied);
    }
}
