//! OpenAI-compatible chat adapter.
//!
//! Works with OpenAI and any endpoint that follows the same chat-completions
//! wire format (Ollama, vLLM, LM Studio, Together, ...). Non-streaming only
//! and carries no embeddings or capability-negotiation surface — the turn
//! orchestrator never asks for either (§1, §6).

use std::sync::Arc;

use convo_domain::{ContentPart, Error, Message, MessageContent, Result, Role, ToolCall, ToolDefinition, Usage};
use serde_json::Value;

use crate::traits::{FunctionResponse, LlmProvider, LlmRequest, LlmResponse};

pub struct OpenAiCompatProvider {
    id: String,
    base_url: String,
    api_key: String,
    default_model: String,
    client: Arc<reqwest::Client>,
}

impl OpenAiCompatProvider {
    /// Build a provider reading its API key from `api_key_env` (§6: the LLM
    /// is an external collaborator; no keychain/OAuth resolution chain is in
    /// scope here, just the one env var the deployment sets).
    pub fn new(id: impl Into<String>, base_url: impl Into<String>, default_model: impl Into<String>, api_key_env: &str) -> Result<Self> {
        let api_key = std::env::var(api_key_env)
            .map_err(|_| Error::Config(format!("missing environment variable {api_key_env}")))?;

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .map_err(from_reqwest)?;

        Ok(Self {
            id: id.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            default_model: default_model.into(),
            client: Arc::new(client),
        })
    }

    async fn chat(&self, messages: Vec<Value>, tools: &[ToolDefinition]) -> Result<LlmResponse> {
        let mut body = serde_json::json!({
            "model": self.default_model,
            "messages": messages,
            "stream": false,
        });
        if !tools.is_empty() {
            body["tools"] = Value::Array(tools.iter().map(tool_to_openai).collect());
        }

        let url = format!("{}/chat/completions", self.base_url);
        tracing::debug!(provider = %self.id, %url, "openai_compat chat request");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = resp.status();
        let resp_text = resp.text().await.map_err(from_reqwest)?;
        if !status.is_success() {
            return Err(Error::Provider {
                provider: self.id.clone(),
                message: format!("HTTP {} - {resp_text}", status.as_u16()),
            });
        }

        let resp_json: Value = serde_json::from_str(&resp_text)?;
        parse_chat_response(&resp_json, &self.id)
    }
}

fn tool_to_openai(tool: &ToolDefinition) -> Value {
    serde_json::json!({
        "type": "function",
        "function": {
            "name": tool.name,
            "description": tool.description,
            "parameters": tool.parameters,
        }
    })
}

fn role_to_str(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    }
}

fn msg_to_openai(msg: &Message) -> Value {
    match msg.role {
        Role::Tool => tool_result_to_openai(msg),
        Role::Assistant => assistant_to_openai(msg),
        _ => serde_json::json!({
            "role": role_to_str(msg.role),
            "content": msg.content.extract_all_text(),
        }),
    }
}

fn assistant_to_openai(msg: &Message) -> Value {
    let mut obj = serde_json::json!({"role": "assistant"});
    let mut text_parts = Vec::new();
    let mut tool_calls = Vec::new();

    match &msg.content {
        MessageContent::Text(t) => text_parts.push(t.clone()),
        MessageContent::Parts(parts) => {
            for part in parts {
                match part {
                    ContentPart::Text { text } => text_parts.push(text.clone()),
                    ContentPart::ToolUse { id, name, input } => tool_calls.push(serde_json::json!({
                        "id": id,
                        "type": "function",
                        "function": { "name": name, "arguments": input.to_string() },
                    })),
                    ContentPart::ToolResult { .. } => {}
                }
            }
        }
    }

    obj["content"] = if text_parts.is_empty() { Value::Null } else { Value::String(text_parts.join("\n")) };
    if !tool_calls.is_empty() {
        obj["tool_calls"] = Value::Array(tool_calls);
    }
    obj
}

fn tool_result_to_openai(msg: &Message) -> Value {
    if let MessageContent::Parts(parts) = &msg.content {
        for part in parts {
            if let ContentPart::ToolResult { tool_use_id, content, .. } = part {
                return serde_json::json!({
                    "role": "tool",
                    "tool_call_id": tool_use_id,
                    "content": content,
                });
            }
        }
    }
    serde_json::json!({"role": "tool", "tool_call_id": "", "content": ""})
}

fn parse_chat_response(body: &Value, provider_id: &str) -> Result<LlmResponse> {
    let missing = |what: &str| Error::Provider { provider: provider_id.to_string(), message: format!("{what} missing from response") };

    let choice = body.get("choices").and_then(|c| c.as_array()).and_then(|a| a.first()).ok_or_else(|| missing("choices"))?;
    let message = choice.get("message").ok_or_else(|| missing("message"))?;

    let text = message.get("content").and_then(|v| v.as_str()).unwrap_or("").to_string();
    let function_calls = parse_tool_calls(message);
    let usage = body.get("usage").map(parse_usage).unwrap_or_default();

    Ok(LlmResponse { text, function_calls, usage })
}

fn parse_tool_calls(message: &Value) -> Vec<ToolCall> {
    let Some(arr) = message.get("tool_calls").and_then(|v| v.as_array()) else {
        return Vec::new();
    };
    arr.iter()
        .filter_map(|tc| {
            let call_id = tc.get("id")?.as_str()?.to_string();
            let func = tc.get("function")?;
            let tool_name = func.get("name")?.as_str()?.to_string();
            let args_str = func.get("arguments")?.as_str().unwrap_or("{}");
            let arguments = serde_json::from_str(args_str).unwrap_or(Value::Object(Default::default()));
            Some(ToolCall { call_id, tool_name, arguments })
        })
        .collect()
}

fn parse_usage(v: &Value) -> Usage {
    Usage {
        input_tokens: v.get("prompt_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
        output_tokens: v.get("completion_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
    }
}

fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Provider { provider: "openai_compat".into(), message: e.to_string() }
    }
}

#[async_trait::async_trait]
impl LlmProvider for OpenAiCompatProvider {
    async fn send(&self, req: &LlmRequest) -> Result<LlmResponse> {
        let mut messages = vec![serde_json::json!({"role": "system", "content": req.system_prompt})];
        messages.extend(req.history.iter().map(msg_to_openai));
        messages.push(serde_json::json!({"role": "user", "content": req.user_message}));
        self.chat(messages, &req.tools).await
    }

    async fn reply(&self, req: &LlmRequest, function_responses: &[FunctionResponse]) -> Result<LlmResponse> {
        let mut messages = vec![serde_json::json!({"role": "system", "content": req.system_prompt})];
        messages.extend(req.history.iter().map(msg_to_openai));
        for fr in function_responses {
            messages.push(serde_json::json!({
                "role": "tool",
                "tool_call_id": fr.call_id,
                "content": fr.content,
            }));
            let _ = fr.is_error;
        }
        self.chat(messages, &req.tools).await
    }

    fn provider_id(&self) -> &str {
        &self.id
    }
}
