//! The tool trait and catalog (§3, §4.G step d).

use std::collections::HashMap;
use std::sync::Arc;

use convo_domain::{Result, ToolCatalogEntry, ToolDefinition, ToolResult};

/// A single executable tool. Implementations never see session state — they
/// receive only the arguments the LLM supplied and return a [`ToolResult`]
/// (§3: no tool ever mutates `Session` directly).
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    fn entry(&self) -> &ToolCatalogEntry;

    async fn execute(&self, arguments: &serde_json::Value) -> Result<ToolResult>;
}

/// Resolves tools by name and exposes the gated allowlist as LLM-facing
/// [`ToolDefinition`]s. The orchestrator's Router computes which names are
/// allowed this turn (`convo-policy::gating`); the catalog just knows how to
/// run them.
#[derive(Clone, Default)]
pub struct ToolCatalog {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.entry().name.clone(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn entries(&self) -> Vec<ToolCatalogEntry> {
        self.tools.values().map(|t| t.entry().clone()).collect()
    }

    /// LLM-facing definitions for a gated subset of tool names, in the order
    /// given (§4.B tool-gating resolves the allowlist; this just projects it).
    pub fn definitions_for(&self, allowed: &[String]) -> Vec<ToolDefinition> {
        allowed
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|t| {
                let e = t.entry();
                ToolDefinition { name: e.name.clone(), description: e.description.clone(), parameters: e.parameter_schema.clone() }
            })
            .collect()
    }

    /// Run a tool once, retrying exactly once on `InfraError` (§4.G step d:
    /// "one retry, two attempts total, for transient failures").
    pub async fn execute_with_retry(&self, name: &str, arguments: &serde_json::Value) -> Result<ToolResult> {
        let tool = self
            .get(name)
            .ok_or_else(|| convo_domain::Error::ToolError(format!("unknown tool: {name}")))?;

        let first = tool.execute(arguments).await?;
        if first.outcome != convo_domain::ToolOutcome::InfraError {
            return Ok(first);
        }

        tracing::warn!(tool = name, "tool returned infra_error, retrying once");
        tool.execute(arguments).await
    }
}
