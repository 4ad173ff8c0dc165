use serde::{Deserialize, Serialize};

/// Per-section accounting within one prompt build (§4.F).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionReport {
    pub name: String,
    pub estimated_tokens: usize,
    pub included: bool,
    pub trimmed: bool,
    pub trim_reason: Option<String>,
}

/// Structured record of a prompt build: per-section token estimate, what
/// was trimmed and why, so callers and tests can assert on trimming order
/// without parsing the prompt text (§4.F).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetReport {
    pub sections: Vec<SectionReport>,
    pub total_estimated_tokens: usize,
    pub input_budget_tokens: usize,
    pub available_for_trimmable_tokens: usize,
}

impl BudgetReport {
    pub fn was_trimmed(&self, name: &str) -> bool {
        self.sections.iter().any(|s| s.name == name && s.trimmed)
    }

    pub fn is_included(&self, name: &str) -> bool {
        self.sections.iter().any(|s| s.name == name && s.included)
    }
}
