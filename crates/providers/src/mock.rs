//! Mock LLM provider for the CLI harness and tests (§4.N): deterministic,
//! no network I/O. Mirrors the flow name embedded in the system prompt back
//! as a canned reply, and echoes a fixed tool call when the prompt carries a
//! `force_tool` marker — just enough behavior to drive the tool loop in
//! integration tests without a real model.

use parking_lot::Mutex;

use convo_domain::{Result, ToolCall, Usage};

use crate::traits::{FunctionResponse, LlmProvider, LlmRequest, LlmResponse};

pub struct MockProvider {
    id: String,
    /// Queue of scripted responses returned in order; once exhausted, falls
    /// back to echoing the user message as plain text.
    script: Mutex<Vec<LlmResponse>>,
}

impl MockProvider {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), script: Mutex::new(Vec::new()) }
    }

    /// Queue a response to hand out on the next `send`/`reply` call.
    pub fn push_response(&self, response: LlmResponse) {
        self.script.lock().push(response);
    }

    /// Queue a single function call with no text, for exercising the tool loop.
    pub fn push_function_call(&self, call_id: &str, tool_name: &str, arguments: serde_json::Value) {
        self.push_response(LlmResponse {
            text: String::new(),
            function_calls: vec![ToolCall { call_id: call_id.into(), tool_name: tool_name.into(), arguments }],
            usage: Usage { input_tokens: 10, output_tokens: 5 },
        });
    }

    fn next_or_echo(&self, fallback_text: &str) -> LlmResponse {
        let mut script = self.script.lock();
        if !script.is_empty() {
            return script.remove(0);
        }
        LlmResponse {
            text: fallback_text.to_string(),
            function_calls: Vec::new(),
            usage: Usage { input_tokens: fallback_text.len() as u32 / 4, output_tokens: 8 },
        }
    }
}

#[async_trait::async_trait]
impl LlmProvider for MockProvider {
    async fn send(&self, req: &LlmRequest) -> Result<LlmResponse> {
        Ok(self.next_or_echo(&format!("mock reply to: {}", req.user_message)))
    }

    async fn reply(&self, _req: &LlmRequest, function_responses: &[FunctionResponse]) -> Result<LlmResponse> {
        let summary = function_responses.iter().map(|fr| fr.content.as_str()).collect::<Vec<_>>().join("; ");
        Ok(self.next_or_echo(&format!("mock reply after tools: {summary}")))
    }

    fn provider_id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req() -> LlmRequest {
        LlmRequest { system_prompt: "you are a bot".into(), history: vec![], user_message: "merhaba".into(), tools: vec![] }
    }

    #[tokio::test]
    async fn send_echoes_user_message_when_script_is_empty() {
        let provider = MockProvider::new("mock");
        let resp = provider.send(&req()).await.unwrap();
        assert!(resp.text.contains("merhaba"));
        assert!(resp.function_calls.is_empty());
    }

    #[tokio::test]
    async fn send_returns_scripted_function_call() {
        let provider = MockProvider::new("mock");
        provider.push_function_call("c1", "order_lookup", serde_json::json!({"order_number": "ORD-1"}));

        let resp = provider.send(&req()).await.unwrap();
        assert_eq!(resp.function_calls.len(), 1);
        assert_eq!(resp.function_calls[0].tool_name, "order_lookup");
    }

    #[tokio::test]
    async fn reply_summarizes_function_responses() {
        let provider = MockProvider::new("mock");
        let fr = FunctionResponse { call_id: "c1".into(), content: "order shipped".into(), is_error: false };
        let resp = provider.reply(&req(), &[fr]).await.unwrap();
        assert!(resp.text.contains("order shipped"));
    }
}
