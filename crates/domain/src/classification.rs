use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::session::ActiveFlow;

/// Coarse intents the classifier assigns a user turn to. Variants carrying
/// "tool-required" semantics gate the fact-grounding policy (§4.B).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentType {
    Order,
    Billing,
    Appointment,
    Complaint,
    Tracking,
    Pricing,
    Stock,
    Return,
    Refund,
    Account,
    Chatter,
    Unknown,
}

impl IntentType {
    /// Intents that must have at least one successful tool result before the
    /// reply may assert facts (§4.B).
    pub fn is_tool_required(self) -> bool {
        matches!(
            self,
            IntentType::Order
                | IntentType::Billing
                | IntentType::Appointment
                | IntentType::Complaint
                | IntentType::Tracking
                | IntentType::Pricing
                | IntentType::Stock
                | IntentType::Return
                | IntentType::Refund
                | IntentType::Account
        )
    }
}

/// Output of the classifier (§4.D): `{type, confidence, extracted_slots,
/// suggested_flow?, had_classifier_failure?}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub intent: IntentType,
    pub confidence: f32,
    pub extracted_slots: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_flow: Option<ActiveFlow>,
    #[serde(default)]
    pub had_classifier_failure: bool,
}

impl ClassificationResult {
    /// The classifier fails **closed**: timeout or error returns this safe,
    /// low-confidence classification (§4.D).
    pub fn safe_fallback() -> Self {
        Self {
            intent: IntentType::Unknown,
            confidence: 0.0,
            extracted_slots: HashMap::new(),
            suggested_flow: None,
            had_classifier_failure: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_required_intents_match_spec_list() {
        assert!(IntentType::Order.is_tool_required());
        assert!(IntentType::Account.is_tool_required());
        assert!(!IntentType::Chatter.is_tool_required());
        assert!(!IntentType::Unknown.is_tool_required());
    }

    #[test]
    fn safe_fallback_is_low_confidence_and_flagged() {
        let c = ClassificationResult::safe_fallback();
        assert_eq!(c.confidence, 0.0);
        assert!(c.had_classifier_failure);
    }
}
