use serde::{Deserialize, Serialize};

/// Enumeration-lock thresholds (§4.B): a sliding counter of suspicious
/// `NotFound` results that, once crossed, terminates the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumerationLockConfig {
    #[serde(default = "d_enum_threshold")]
    pub threshold: u32,
    #[serde(default = "d_enum_window_secs")]
    pub window_secs: i64,
    #[serde(default = "d_enum_lock_duration_secs")]
    pub lock_duration_secs: i64,
}

impl Default for EnumerationLockConfig {
    fn default() -> Self {
        Self {
            threshold: d_enum_threshold(),
            window_secs: d_enum_window_secs(),
            lock_duration_secs: d_enum_lock_duration_secs(),
        }
    }
}

/// Thresholds driving the policy kernel and tool loop (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Bounded tool-loop iteration cap (§4.G).
    #[serde(default = "d_max_iterations")]
    pub max_iterations: u32,
    /// Repeat-guard window in milliseconds (§4.B, §4.G step b).
    #[serde(default = "d_repeat_window_ms")]
    pub repeat_window_ms: u64,
    /// Classifier timeout before failing closed (§4.D).
    #[serde(default = "d_classifier_timeout_ms")]
    pub classifier_timeout_ms: u64,
    /// Verification attempts cap before the session terminates (§3).
    #[serde(default = "d_verification_max_attempts")]
    pub verification_max_attempts: u8,
    /// Consecutive post-result follow-ups before auto-reset to idle (§4.C).
    #[serde(default = "d_post_result_reset_turns")]
    pub post_result_reset_turns: u8,
    /// Per-tool token cap applied during sanitization (§4.G step e).
    #[serde(default = "d_per_tool_token_cap")]
    pub per_tool_token_cap: usize,
    #[serde(default)]
    pub enumeration_lock: EnumerationLockConfig,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            max_iterations: d_max_iterations(),
            repeat_window_ms: d_repeat_window_ms(),
            classifier_timeout_ms: d_classifier_timeout_ms(),
            verification_max_attempts: d_verification_max_attempts(),
            post_result_reset_turns: d_post_result_reset_turns(),
            per_tool_token_cap: d_per_tool_token_cap(),
            enumeration_lock: EnumerationLockConfig::default(),
        }
    }
}

fn d_max_iterations() -> u32 {
    3
}
fn d_repeat_window_ms() -> u64 {
    600_000
}
fn d_classifier_timeout_ms() -> u64 {
    3_000
}
fn d_verification_max_attempts() -> u8 {
    3
}
fn d_post_result_reset_turns() -> u8 {
    3
}
fn d_per_tool_token_cap() -> usize {
    3_000
}
fn d_enum_threshold() -> u32 {
    5
}
fn d_enum_window_secs() -> i64 {
    600
}
fn d_enum_lock_duration_secs() -> i64 {
    3_600
}
