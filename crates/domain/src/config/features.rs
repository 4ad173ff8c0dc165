use serde::{Deserialize, Serialize};

/// Process-wide, read-mostly feature flags (§6, §9). Changes take effect on
/// the next turn; stages never read these ambiently, they're threaded
/// through the shared `Arc<Config>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureFlags {
    /// Router stage 2: out-of-scope/fuzzy-match entity resolution short-circuits
    /// to a clarification instead of reaching the LLM.
    #[serde(default = "d_true")]
    pub text_strict_grounding: bool,
    /// Whether tool results' `state_events` are applied by the policy kernel,
    /// versus relying solely on hardcoded outcome-policy rules.
    #[serde(default = "d_true")]
    pub use_state_events: bool,
    /// Whether transcript entries are tagged with `message_type` for routing
    /// decisions downstream (e.g. dashboards filtering system barriers).
    #[serde(default = "d_true")]
    pub use_message_type_routing: bool,
    /// Test hook: when set, the tool loop executes against injected mock
    /// fixtures instead of dispatching to real tool implementations.
    #[serde(default)]
    pub test_mock_tools: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            text_strict_grounding: true,
            use_state_events: true,
            use_message_type_routing: true,
            test_mock_tools: false,
        }
    }
}

fn d_true() -> bool {
    true
}
