//! Guardrails (§4.H): the five-step post-draft pipeline every reply passes
//! through before it leaves the process, regardless of which route produced
//! the draft text.

use convo_domain::{Channel, GuardrailAction, Language, ToolOutcome, ToolResult};
use convo_policy::action_claim::{contains_action_claim, rewrite_action_claims};
use convo_policy::pii::redact_outbound_text;
use convo_policy::verification::{strip_false_promises, verification_question};

pub struct GuardrailOutcome {
    pub text: String,
    pub action: GuardrailAction,
}

fn empty_draft_fallback(language: Language) -> &'static str {
    match language {
        Language::Tr => "Şu anda net bir yanıt veremiyorum, lütfen isteğinizi biraz daha açar mısınız?",
        Language::En => "I don't have a clear answer for that right now — could you rephrase your request?",
    }
}

/// Runs the post-draft guardrail pipeline over `draft`, returning the final
/// outbound text and the action taken so it can be recorded in the
/// transcript metadata.
pub fn apply(
    draft: &str,
    channel: Channel,
    language: Language,
    tool_results: &[ToolResult],
    already_supplied_slots: &[String],
    known_phone_numbers: &[String],
) -> GuardrailOutcome {
    let mut text = draft.to_string();
    let mut action = GuardrailAction::Pass;
    let is_turkish = matches!(language, Language::Tr);

    // 1. Recipient guard — action-claim rewriting and verification-question
    // appending are meaningful for any channel, but an explicit recipient
    // email address is only ever included in the Email Draft Pipeline; here
    // we only guard against an email-looking claim leaking into a non-email
    // channel reply.
    if channel != Channel::Email && text.contains('@') && text.to_lowercase().contains("mailto:") {
        text = text.replace("mailto:", "");
        action = GuardrailAction::Sanitize;
    }

    // 2 & 3. Action-claim guard + verification policy.
    let has_ok_result = tool_results.iter().any(|r| r.outcome == ToolOutcome::Ok);
    if contains_action_claim(&text) && !has_ok_result {
        text = rewrite_action_claims(&text, is_turkish);
        action = GuardrailAction::Sanitize;
    }

    if let Some(verification_result) = tool_results.iter().find(|r| r.outcome == ToolOutcome::VerificationRequired) {
        text = strip_false_promises(&text);
        let ask_for = verification_result.ask_for.clone().unwrap_or_default();
        let question = verification_question(&ask_for, already_supplied_slots, is_turkish);
        if !question.is_empty() {
            text = format!("{} {}", text.trim(), question);
            action = GuardrailAction::NeedMinInfoForTool;
        }
    }

    // 4. PII scrub.
    let scrubbed = redact_outbound_text(&text, known_phone_numbers);
    if scrubbed != text {
        text = scrubbed;
        if action == GuardrailAction::Pass {
            action = GuardrailAction::Sanitize;
        }
    }

    // 5. Empty-draft block.
    if text.trim().is_empty() {
        text = empty_draft_fallback(language).to_string();
        action = GuardrailAction::Block;
    }

    GuardrailOutcome { text, action }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_action_claim_without_backing_tool_result() {
        let outcome = apply("Talebiniz kaydedildi.", Channel::Whatsapp, Language::Tr, &[], &[], &[]);
        assert!(!contains_action_claim(&outcome.text));
        assert_eq!(outcome.action, GuardrailAction::Sanitize);
    }

    #[test]
    fn keeps_action_claim_when_tool_succeeded() {
        let results = vec![ToolResult::ok("create_callback", "Created", serde_json::json!({"id": "CB-1"}))];
        let outcome = apply("Your callback was created.", Channel::Phone, Language::En, &results, &[], &[]);
        assert_eq!(outcome.text, "Your callback was created.");
    }

    #[test]
    fn appends_verification_question_and_strips_false_promise() {
        let results = vec![convo_domain::ToolResult {
            tool_name: "customer_data_lookup".into(),
            outcome: ToolOutcome::VerificationRequired,
            data: None,
            message: "need id".into(),
            ask_for: Some(vec!["phone_last4".into()]),
            state_events: None,
        }];
        let outcome = apply("Kısa sürede dönüş yapılacaktır.", Channel::Whatsapp, Language::Tr, &results, &[], &[]);
        assert_eq!(outcome.action, GuardrailAction::NeedMinInfoForTool);
        assert!(outcome.text.contains("son 4 hanesini"));
        assert!(!outcome.text.to_lowercase().contains("dönüş yap"));
    }

    #[test]
    fn empty_draft_is_blocked_with_fallback() {
        let outcome = apply("   ", Channel::Whatsapp, Language::En, &[], &[], &[]);
        assert_eq!(outcome.action, GuardrailAction::Block);
        assert!(!outcome.text.trim().is_empty());
    }
}
