use convo_domain::{Message, Result, ToolCall, ToolDefinition, Usage};

/// Everything the LLM needs for the first exchange of a tool-loop iteration
/// (§4.G step a, §6): the system prompt built by the prompt kit, the prior
/// turn's history, the user's current message, and the gated tool allowlist.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub system_prompt: String,
    pub history: Vec<Message>,
    pub user_message: String,
    pub tools: Vec<ToolDefinition>,
}

/// A tool's result handed back to the model after `send` asked for a call.
#[derive(Debug, Clone)]
pub struct FunctionResponse {
    pub call_id: String,
    pub content: String,
    pub is_error: bool,
}

/// What the model produced: text for the user, zero or more function calls
/// to resolve before that text is final, and the usage it billed for.
#[derive(Debug, Clone, Default)]
pub struct LlmResponse {
    pub text: String,
    pub function_calls: Vec<ToolCall>,
    pub usage: Usage,
}

/// The LLM collaborator contract (§1, §6): `send` opens a turn, `reply`
/// continues it once function responses are available. Out of scope per
/// §1: streaming, embeddings, and capability negotiation — none of it has a
/// counterpart in the turn orchestrator.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    async fn send(&self, req: &LlmRequest) -> Result<LlmResponse>;

    async fn reply(
        &self,
        req: &LlmRequest,
        function_responses: &[FunctionResponse],
    ) -> Result<LlmResponse>;

    /// A unique identifier for this provider instance, used in log lines and
    /// `Error::Provider` messages.
    fn provider_id(&self) -> &str;
}
