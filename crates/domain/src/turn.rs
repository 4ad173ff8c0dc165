use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classification::ClassificationResult;
use crate::tool::ToolCall;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Phone,
    ChatWidget,
    Whatsapp,
    Email,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Tr,
    En,
}

/// Whether an assistant message is supported by tool data, an honest
/// non-answer, or a scope refusal (GLOSSARY).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseGrounding {
    Grounded,
    Clarification,
    OutOfScope,
}

/// Guardrail disposition recorded alongside the persisted message (§4.H).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardrailAction {
    Pass,
    Sanitize,
    Block,
    NeedMinInfoForTool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Normal,
    SystemBarrier,
    Clarification,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptMetadata {
    pub message_type: MessageType,
    pub guardrail_action: Option<GuardrailAction>,
}

/// One append-only entry in a session's transcript (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: TranscriptRole,
    pub content: String,
    pub response_grounding: ResponseGrounding,
    pub metadata: TranscriptMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    pub at: DateTime<Utc>,
}

/// Inbound request for one turn (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnInput {
    pub channel: Channel,
    pub business_id: String,
    pub channel_user_id: String,
    #[serde(default)]
    pub session_id: Option<String>,
    pub message_id: String,
    pub text: String,
    pub language: Language,
    pub timezone: String,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub dry_run: bool,
}

/// Per-turn counters emitted alongside the reply (§4.I).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnMetrics {
    pub tools_called: Vec<String>,
    pub tool_successes: u32,
    pub tool_failures: u32,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub duration_ms: u64,
    pub enumeration_attempts: u32,
    pub repeat_blocks: u32,
}

/// Debug view of routing decisions, useful to tests and the CLI harness (§4.N).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnDebug {
    pub classification: ClassificationResult,
    pub routing: String,
    pub tools_called: Vec<String>,
    pub grounding: ResponseGrounding,
    pub guardrail_action: GuardrailAction,
}

/// Outbound result of `handle_turn` (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnResult {
    pub reply: String,
    pub should_end_session: bool,
    pub force_end: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<serde_json::Value>,
    pub metrics: TurnMetrics,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub debug: TurnDebug,
}
