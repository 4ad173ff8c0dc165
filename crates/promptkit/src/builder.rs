//! Prompt Builder & Budgeter (§4.F): assembles the system prompt from
//! persona, datetime, knowledge, writing style, tool results, retrieved
//! examples, snippets, fact-grounding directives, and business-identity
//! hints, applying a strict trimming priority when the estimate exceeds the
//! input budget.

use crate::injection;
use crate::report::{BudgetReport, SectionReport};

/// `≈4 chars/token`, the estimate used throughout §4.F.
const CHARS_PER_TOKEN: usize = 4;

/// One trimmable prompt section being accumulated against the total char
/// budget (§4.F's knowledge-base/retrieved-examples/snippets categories).
struct Section {
    name: String,
    content: String,
    raw_chars: usize,
    truncated_total_cap: bool,
    included: bool,
}

/// Applies the total char cap across `sections` in order: earlier sections
/// are kept whole, the first one that would overflow is cut at the
/// boundary, and anything after that is dropped entirely (§4.F's trim
/// priority — pass sections in "most protected first" order).
fn apply_total_cap(sections: &mut [Section], total_max_chars: usize) {
    let mut accumulated: usize = 0;

    for section in sections.iter_mut() {
        if !section.included {
            continue;
        }

        let section_len = section.content.len();

        if accumulated + section_len <= total_max_chars {
            accumulated += section_len;
        } else if accumulated < total_max_chars {
            let remaining = total_max_chars - accumulated;
            let boundary = section.content.floor_char_boundary(remaining);
            section.content = format!("{}\n\n[TRUNCATED_TOTAL_CAP]\n", &section.content[..boundary]);
            section.truncated_total_cap = true;
            accumulated = total_max_chars;
        } else {
            section.content.clear();
            section.included = false;
        }
    }
}

/// Token budget for one prompt build. §4.F gives two presets: a large-model
/// default (~100k input, ~4k output reserve, ~8k safety buffer) and a
/// smaller preset (6k/2k) for small models — see the Open Question decision
/// in `DESIGN.md` for how the small preset's safety buffer was chosen.
#[derive(Debug, Clone, Copy)]
pub struct BudgetConfig {
    pub input_budget_tokens: usize,
    pub output_reserve_tokens: usize,
    pub safety_buffer_tokens: usize,
}

impl BudgetConfig {
    pub fn large_model() -> Self {
        Self { input_budget_tokens: 100_000, output_reserve_tokens: 4_000, safety_buffer_tokens: 8_000 }
    }

    pub fn small_model() -> Self {
        Self { input_budget_tokens: 6_000, output_reserve_tokens: 2_000, safety_buffer_tokens: 1_000 }
    }

    pub fn available_for_input(&self) -> usize {
        self.input_budget_tokens.saturating_sub(self.output_reserve_tokens).saturating_sub(self.safety_buffer_tokens)
    }
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self::large_model()
    }
}

/// Pre-assembled inputs for one prompt build. Each field is already
/// rendered text (rendering knowledge items, retrieved examples, etc. into
/// strings is the caller's job — this builder only assembles and budgets).
#[derive(Debug, Clone, Default)]
pub struct PromptInput {
    pub persona: String,
    pub datetime_line: String,
    pub business_identity_hints: Option<String>,
    pub writing_style: Option<String>,
    pub fact_grounding_directive: Option<String>,
    /// Never truncated (§4.F): the tool loop's own result context.
    pub tool_result_context: Option<String>,
    pub knowledge_base: Vec<String>,
    pub retrieved_examples: Vec<String>,
    pub snippets: Vec<String>,
}

fn estimate_tokens(s: &str) -> usize {
    s.len().div_ceil(CHARS_PER_TOKEN)
}

/// Deterministic, pure prompt assembler. No I/O: every input is pre-fetched
/// by the caller (the orchestrator's bootstrap/retrieval stages).
pub struct PromptBuilder {
    budget: BudgetConfig,
}

impl PromptBuilder {
    pub fn new(budget: BudgetConfig) -> Self {
        Self { budget }
    }

    pub fn build(&self, input: &PromptInput) -> (String, BudgetReport) {
        let available = self.budget.available_for_input();

        // Protected sections are never trimmed; their combined size is
        // subtracted from the budget before the trimmable categories see it.
        let protected_parts: Vec<(&str, String)> = [
            Some(("persona", input.persona.clone())),
            Some(("datetime", input.datetime_line.clone())),
            input.business_identity_hints.clone().map(|c| ("business_identity", c)),
            input.writing_style.clone().map(|c| ("writing_style", c)),
            input.fact_grounding_directive.clone().map(|c| ("fact_grounding", c)),
            input.tool_result_context.clone().map(|c| ("tool_results", c)),
        ]
        .into_iter()
        .flatten()
        .collect();

        let protected_tokens: usize = protected_parts.iter().map(|(_, c)| estimate_tokens(c)).sum();
        let available_for_trimmable = available.saturating_sub(protected_tokens);
        let trimmable_char_budget = available_for_trimmable * CHARS_PER_TOKEN;

        // Trim order (§4.F): knowledge base is most protected (trimmed
        // last), then retrieved examples, then snippets (trimmed first).
        // `apply_total_cap` keeps earlier sections whole and cuts later
        // ones, so pass them in "most protected first" order.
        let mut trimmable_sections = vec![
            joined_section("knowledge_base", &input.knowledge_base),
            joined_section("retrieved_examples", &input.retrieved_examples),
            joined_section("snippets", &input.snippets),
        ];
        apply_total_cap(&mut trimmable_sections, trimmable_char_budget);

        let mut assembled = String::new();
        let mut section_reports = Vec::new();

        for (name, content) in &protected_parts {
            assembled.push_str(&injection::format_protected_section(name, content));
            assembled.push('\n');
            section_reports.push(SectionReport {
                name: (*name).to_string(),
                estimated_tokens: estimate_tokens(content),
                included: true,
                trimmed: false,
                trim_reason: None,
            });
        }

        // Display order follows §4.F's listing: knowledge, writing style
        // already emitted above, then retrieved examples, then snippets.
        for section in &trimmable_sections {
            let trimmed = section.truncated_total_cap || (!section.included && section.raw_chars > 0);
            section_reports.push(SectionReport {
                name: section.name.clone(),
                estimated_tokens: estimate_tokens(&section.content),
                included: section.included,
                trimmed,
                trim_reason: if trimmed { Some("over input token budget".to_string()) } else { None },
            });

            if section.included && !section.content.is_empty() {
                assembled.push_str(&injection::format_section(&section.name, &section.content, section.raw_chars, trimmed));
                assembled.push('\n');
            }
        }

        let total_estimated_tokens = section_reports.iter().map(|s| s.estimated_tokens).sum();

        let report = BudgetReport {
            sections: section_reports,
            total_estimated_tokens,
            input_budget_tokens: self.budget.input_budget_tokens,
            available_for_trimmable_tokens: available_for_trimmable,
        };

        (assembled, report)
    }
}

fn joined_section(name: &str, items: &[String]) -> Section {
    let content = items.join("\n\n");
    Section { name: name.to_string(), raw_chars: content.len(), content, truncated_total_cap: false, included: true }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input_with(knowledge: usize, examples: usize, snippets: usize) -> PromptInput {
        PromptInput {
            persona: "You are a helpful assistant.".into(),
            datetime_line: "2026-08-01T00:00:00Z".into(),
            tool_result_context: Some("order ORD-1: shipped".into()),
            knowledge_base: vec!["k".repeat(knowledge)],
            retrieved_examples: vec!["e".repeat(examples)],
            snippets: vec!["s".repeat(snippets)],
            ..Default::default()
        }
    }

    #[test]
    fn small_inputs_are_not_trimmed() {
        let builder = PromptBuilder::new(BudgetConfig::large_model());
        let (prompt, report) = builder.build(&input_with(100, 100, 100));
        assert!(!report.was_trimmed("snippets"));
        assert!(prompt.contains("order ORD-1: shipped"));
    }

    #[test]
    fn over_budget_trims_snippets_before_knowledge_base() {
        let budget = BudgetConfig { input_budget_tokens: 200, output_reserve_tokens: 0, safety_buffer_tokens: 0 };
        let builder = PromptBuilder::new(budget);
        // Each section is large enough on its own to blow the budget.
        let (_, report) = builder.build(&input_with(400, 400, 400));

        assert!(report.is_included("knowledge_base"));
        assert!(!report.is_included("snippets") || report.was_trimmed("snippets"));
    }

    #[test]
    fn tool_results_are_never_trimmed() {
        let budget = BudgetConfig { input_budget_tokens: 10, output_reserve_tokens: 0, safety_buffer_tokens: 0 };
        let builder = PromptBuilder::new(budget);
        let mut input = input_with(1000, 1000, 1000);
        input.tool_result_context = Some("critical tool output that must survive".into());
        let (prompt, _) = builder.build(&input);
        assert!(prompt.contains("critical tool output that must survive"));
    }

    #[test]
    fn total_cap_excludes_overflow() {
        let mut sections = vec![
            Section { name: "A".into(), content: "aaaa".into(), raw_chars: 4, truncated_total_cap: false, included: true },
            Section { name: "B".into(), content: "bbbbbb".into(), raw_chars: 6, truncated_total_cap: false, included: true },
            Section { name: "C".into(), content: "cccc".into(), raw_chars: 4, truncated_total_cap: false, included: true },
        ];

        apply_total_cap(&mut sections, 8);

        assert!(sections[0].included);
        assert!(!sections[0].truncated_total_cap);
        assert!(sections[1].included);
        assert!(sections[1].truncated_total_cap);
        assert!(!sections[2].included);
    }
}
