use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Input/output token allowances for one model tier (§4.F).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelBudget {
    #[serde(default = "d_input_tokens")]
    pub input_tokens: usize,
    #[serde(default = "d_output_tokens")]
    pub output_tokens: usize,
    #[serde(default = "d_safety_buffer_tokens")]
    pub safety_buffer_tokens: usize,
}

impl Default for ModelBudget {
    fn default() -> Self {
        Self {
            input_tokens: d_input_tokens(),
            output_tokens: d_output_tokens(),
            safety_buffer_tokens: d_safety_buffer_tokens(),
        }
    }
}

/// Per-1k-token cost used for turn cost estimation metrics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelPricing {
    #[serde(default)]
    pub input_cost_per_1k: f64,
    #[serde(default)]
    pub output_cost_per_1k: f64,
}

/// Token budgeting configuration (§4.F, §6): a large- and small-model tier,
/// plus an optional per-model override and pricing table for cost estimation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetConfig {
    #[serde(default = "d_chars_per_token")]
    pub chars_per_token: usize,
    #[serde(default = "d_large_model_budget")]
    pub large_model: ModelBudget,
    #[serde(default = "d_small_model_budget")]
    pub small_model: ModelBudget,
    /// Model name -> budget override, for models that don't fit either tier.
    #[serde(default)]
    pub model_overrides: HashMap<String, ModelBudget>,
    #[serde(default)]
    pub pricing: HashMap<String, ModelPricing>,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            chars_per_token: d_chars_per_token(),
            large_model: d_large_model_budget(),
            small_model: d_small_model_budget(),
            model_overrides: HashMap::new(),
            pricing: HashMap::new(),
        }
    }
}

impl BudgetConfig {
    pub fn budget_for_model(&self, model: &str, is_small: bool) -> &ModelBudget {
        self.model_overrides
            .get(model)
            .unwrap_or(if is_small { &self.small_model } else { &self.large_model })
    }
}

fn d_chars_per_token() -> usize {
    4
}
fn d_input_tokens() -> usize {
    100_000
}
fn d_output_tokens() -> usize {
    4_000
}
fn d_safety_buffer_tokens() -> usize {
    8_000
}
fn d_large_model_budget() -> ModelBudget {
    ModelBudget { input_tokens: 100_000, output_tokens: 4_000, safety_buffer_tokens: 8_000 }
}
fn d_small_model_budget() -> ModelBudget {
    ModelBudget { input_tokens: 6_000, output_tokens: 2_000, safety_buffer_tokens: 1_000 }
}
