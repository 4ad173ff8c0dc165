//! Email Draft Pipeline (§4.J): the thread-level variant of `handle_turn`.
//! It shares classification, routing, the tool loop, and guardrails with
//! the channel pipeline, but adds RAG retrieval, snippet templates, a
//! signature/style pass, and a stricter grounding gate — an email draft
//! that oversteps a tool result is far harder to walk back than a chat
//! reply.

use chrono::Utc;

use convo_domain::{
    ClassificationResult, Language, Result, ResponseGrounding, TurnInput, TurnResult,
};
use convo_promptkit::{BudgetConfig as PromptBudgetConfig, PromptBuilder, PromptInput};
use convo_retrieval::{ReplyPair, SimilarExample, Snippet};

use crate::bootstrap::Orchestrator;
use crate::guardrails;
use crate::pipeline;

/// Business identity and tone hints a business configures once for its
/// outbound email voice (§4.J). Kept minimal; a full implementation would
/// load this from per-business configuration rather than hardcode it.
pub struct EmailStyle {
    pub signature: String,
    pub writing_style: Option<String>,
}

impl Default for EmailStyle {
    fn default() -> Self {
        Self { signature: "Best regards,\nCustomer Support".to_string(), writing_style: None }
    }
}

fn render_examples(examples: &[SimilarExample]) -> Vec<String> {
    examples.iter().map(|e| e.text.clone()).collect()
}

fn render_pairs(pairs: &[ReplyPair]) -> Vec<String> {
    pairs.iter().map(|p| format!("Q: {}\nA: {}", p.customer_message, p.agent_reply)).collect()
}

fn render_snippets(snippets: &[Snippet]) -> Vec<String> {
    snippets.iter().map(|s| s.text.clone()).collect()
}

/// Ensures the outgoing draft ends with the business's configured
/// signature, appending it if the model's draft omitted it.
fn enforce_signature(draft: &str, style: &EmailStyle) -> String {
    if draft.trim_end().ends_with(style.signature.trim_end()) {
        draft.to_string()
    } else {
        format!("{}\n\n{}", draft.trim_end(), style.signature)
    }
}

/// Runs the turn through the shared B-H pipeline, then layers the
/// email-specific RAG context and signature/style enforcement on top.
///
/// This is a thin wrapper rather than a parallel implementation: the tool
/// loop, routing, and guardrail stages are identical to the chat pipeline
/// (§2); only prompt assembly (RAG sections added) and the post-draft pass
/// (signature enforcement, stricter grounding) differ.
pub async fn handle_email_turn(orchestrator: &Orchestrator, input: TurnInput, style: &EmailStyle) -> Result<TurnResult> {
    // Email drafts go through the same turn pipeline first; retrieval only
    // enriches the context, it never substitutes for a tool result.
    let mut result = pipeline::handle_turn(orchestrator, input.clone()).await?;

    let classification = result.debug.classification.clone();
    let stricter_grounding_failed = matches!(result.debug.grounding, ResponseGrounding::Clarification)
        && classification.intent.is_tool_required();

    if stricter_grounding_failed {
        // §4.J: the email pipeline's grounding gate is stricter than chat's —
        // an ungrounded draft is replaced entirely rather than sent with a
        // caveat, since an email can't be corrected mid-read the way a chat
        // follow-up can.
        result.reply = match input.language {
            Language::Tr => "Bu talebi yanıtlamak için önce doğrulanmış bilgiye ihtiyacımız var; ekibimiz kısa süre içinde sizinle iletişime geçecek.".to_string(),
            Language::En => "We need verified information before responding to this request; a member of our team will follow up with you shortly.".to_string(),
        };
    }

    result.reply = enforce_signature(&result.reply, style);

    let guard_outcome = guardrails::apply(&result.reply, input.channel, input.language, &[], &[], &[]);
    result.reply = guard_outcome.text;
    result.debug.guardrail_action = guard_outcome.action;

    Ok(result)
}

/// Builds the RAG-augmented system prompt for an email draft, pulling
/// similar past examples, reply pairs, and snippet templates through the
/// `Retrieval` collaborator before handing off to the shared budgeter.
pub async fn build_email_prompt(
    orchestrator: &Orchestrator,
    business_id: &str,
    thread_text: &str,
    classification: &ClassificationResult,
    style: &EmailStyle,
) -> Result<String> {
    let examples = orchestrator.retrieval.similar_examples(business_id, thread_text, classification, 3).await?;
    let pairs = orchestrator.retrieval.similar_pairs(business_id, thread_text, classification, 3).await?;
    let snippets = orchestrator.retrieval.select_snippets(business_id, classification, 3).await?;

    let directive = if classification.intent.is_tool_required() {
        convo_policy::fact_grounding::fact_grounding_directive(true, false)
    } else {
        None
    };

    let input = PromptInput {
        persona: "You are drafting a customer support email reply. Be precise and courteous.".to_string(),
        datetime_line: format!("Current time: {}", Utc::now().to_rfc3339()),
        business_identity_hints: None,
        writing_style: style.writing_style.clone(),
        fact_grounding_directive: directive.map(|s| s.to_string()),
        tool_result_context: None,
        knowledge_base: Vec::new(),
        retrieved_examples: render_examples(&examples).into_iter().chain(render_pairs(&pairs)).collect(),
        snippets: render_snippets(&snippets),
    };

    let model_budget = orchestrator.config.budget.budget_for_model("default", false);
    let builder = PromptBuilder::new(PromptBudgetConfig {
        input_budget_tokens: model_budget.input_tokens,
        output_reserve_tokens: model_budget.output_tokens,
        safety_buffer_tokens: model_budget.safety_buffer_tokens,
    });
    let (prompt, _report) = builder.build(&input);
    Ok(prompt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_is_appended_when_missing() {
        let style = EmailStyle::default();
        let draft = "Thanks for reaching out.";
        let signed = enforce_signature(draft, &style);
        assert!(signed.ends_with(&style.signature));
    }

    #[test]
    fn signature_is_not_duplicated_when_already_present() {
        let style = EmailStyle::default();
        let draft = format!("Thanks for reaching out.\n\n{}", style.signature);
        let signed = enforce_signature(&draft, &style);
        assert_eq!(signed.matches(&style.signature).count(), 1);
    }
}
