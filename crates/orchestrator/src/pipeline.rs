//! Top-level pipeline (§2): `handle_turn` wires classification, routing,
//! prompt building, the tool loop, guardrails, and persistence into the
//! single entry point every channel calls through.

use chrono::Utc;

use convo_classifier::{classify_with_timeout, ClassifyInput};
use convo_domain::{
    Channel, GuardrailAction, Language, MessageType, Result, ResponseGrounding, TraceEvent,
    TranscriptEntry, TranscriptMetadata, TranscriptRole, TurnDebug, TurnInput, TurnMetrics,
    TurnResult,
};
use convo_policy::fact_grounding::fact_grounding_directive;
use convo_policy::gating::gate_tools;
use convo_policy::tool_required::{enforce_tool_required, ToolRequiredDecision};
use convo_promptkit::{BudgetConfig as PromptBudgetConfig, PromptBuilder, PromptInput};
use convo_providers::LlmRequest;
use convo_state::LoadResult;

use crate::bootstrap::Orchestrator;
use crate::guardrails;
use crate::router::{self, RouteDecision};
use crate::tool_loop;

fn persona(language: Language) -> &'static str {
    match language {
        Language::Tr => "Sen bir müşteri hizmetleri asistanısın. Kısa, net ve kibar yanıtlar ver.",
        Language::En => "You are a customer support assistant. Keep replies short, clear, and polite.",
    }
}

fn to_prompt_budget(budget: &convo_domain::config::ModelBudget) -> PromptBudgetConfig {
    PromptBudgetConfig {
        input_budget_tokens: budget.input_tokens,
        output_reserve_tokens: budget.output_tokens,
        safety_buffer_tokens: budget.safety_buffer_tokens,
    }
}

/// Templated reply for when `enforce_tool_required` finds the tool-required
/// policy unmet — replaces the model's own (ungrounded) draft text rather
/// than leaving it in place with only `grounding` metadata flipped (§4.B).
fn tool_required_reply(decision: &ToolRequiredDecision, language: Language) -> Option<String> {
    match decision {
        ToolRequiredDecision::Satisfied => None,
        ToolRequiredDecision::SystemError => Some(
            match language {
                Language::Tr => "Şu anda sistemsel bir sorun nedeniyle bu bilgiye ulaşamıyorum; lütfen kısa süre sonra tekrar deneyin.".to_string(),
                Language::En => "I'm hitting a system issue reaching that information right now — please try again shortly.".to_string(),
            },
        ),
        ToolRequiredDecision::IdentityCheck(ask_for) => Some(identity_check_prompt(ask_for, language)),
        ToolRequiredDecision::AskForVerification(ask_for) => Some(ask_for_verification_prompt(ask_for, language)),
    }
}

fn identity_check_prompt(ask_for: &[String], language: Language) -> String {
    if ask_for.is_empty() {
        return match language {
            Language::Tr => "Devam edebilmem için önce kimliğinizi doğrulamam gerekiyor.".to_string(),
            Language::En => "I need to verify your identity before I can continue with that.".to_string(),
        };
    }
    let fields = ask_for.join(", ");
    match language {
        Language::Tr => format!("Devam edebilmem için önce kimliğinizi doğrulamam gerekiyor; {fields} bilgisini paylaşır mısınız?"),
        Language::En => format!("I need to verify your identity before I can continue — could you share {fields}?"),
    }
}

fn ask_for_verification_prompt(ask_for: &[String], language: Language) -> String {
    if ask_for.is_empty() {
        return match language {
            Language::Tr => "Bu talebi yanıtlayabilmem için biraz daha bilgiye ihtiyacım var.".to_string(),
            Language::En => "I need a bit more information before I can help with that.".to_string(),
        };
    }
    let fields = ask_for.join(", ");
    match language {
        Language::Tr => format!("Bu talebi yanıtlayabilmem için {fields} bilgisini paylaşır mısınız?"),
        Language::En => format!("Could you share {fields} so I can look into that?"),
    }
}

/// Whether the inbound channel has already proven the user's identity
/// out-of-band (§4.G step g) — e.g. a phone channel that only ever connects
/// verified callers. Read from `TurnInput.metadata` rather than hardcoded so
/// a channel adapter controls what counts as proof.
fn channel_identity_verified(channel: Channel, metadata: &std::collections::HashMap<String, serde_json::Value>) -> bool {
    channel == Channel::Phone
        && metadata.get("verified_caller_id").and_then(serde_json::Value::as_bool).unwrap_or(false)
}

/// The single entry point every channel adapter calls through (§2, §6).
pub async fn handle_turn(orchestrator: &Orchestrator, input: TurnInput) -> Result<TurnResult> {
    let turn_span = tracing::info_span!(
        "turn",
        business_id = %input.business_id,
        channel = ?input.channel,
        message_id = %input.message_id,
        session_id = tracing::field::Empty,
    );
    let _guard = turn_span.enter();

    let start = Utc::now();
    let config = &orchestrator.config;
    let channel = input.channel;
    let language = input.language;

    let key = convo_domain::SessionKey::new(channel, input.business_id.clone(), input.channel_user_id.clone());
    let mut session = match orchestrator.sessions.load(&key, input.session_id.as_deref(), start) {
        LoadResult::Active(s) => s,
        LoadResult::Terminated { .. } => {
            let text = match language {
                Language::Tr => "Bu oturum güvenlik nedeniyle sonlandırıldı, lütfen farklı bir kanaldan ulaşın.".to_string(),
                Language::En => "This session has been closed for security reasons — please reach out through a different channel.".to_string(),
            };
            return Ok(terminal_result(text, true, channel, start));
        }
    };

    turn_span.record("session_id", session.session_id.as_str());
    TraceEvent::TurnStarted {
        business_id: input.business_id.clone(),
        channel: format!("{channel:?}"),
        session_id: session.session_id.clone(),
        message_id: input.message_id.clone(),
    }
    .emit();

    if let Some(reason) = orchestrator.lifecycle.should_reset(&session, channel, start) {
        orchestrator.lifecycle.apply_reset(&mut session, &reason, start);
    }

    let last_assistant_content = orchestrator
        .transcripts
        .read(&session.session_id)?
        .iter()
        .rev()
        .find(|e| e.role == TranscriptRole::Assistant)
        .map(|e| e.content.clone());

    let classification = classify_with_timeout(
        orchestrator.classifier.as_ref(),
        ClassifyInput {
            last_assistant_content: last_assistant_content.as_deref(),
            user_text: &input.text,
            state: &session,
            language,
            channel,
        },
        config.policy.classifier_timeout_ms,
    )
    .await;
    TraceEvent::ClassificationCompleted {
        intent: format!("{:?}", classification.intent),
        confidence: classification.confidence,
        had_classifier_failure: classification.had_classifier_failure,
    }
    .emit();

    // Snapshot slot keys *before* this turn's merge so a repeated message
    // that re-extracts the same identifier from its own text can't look like
    // a "new" slot — only a key genuinely absent before this turn counts.
    let slots_before_merge: std::collections::HashSet<String> = session.extracted_slots.keys().cloned().collect();
    session.merge_slots(classification.extracted_slots.clone());
    if session.active_flow.is_none() {
        session.active_flow = classification.suggested_flow;
    }

    let decision = router::route(&classification, config, language, &session);
    let routing_label = match &decision {
        RouteDecision::DirectResponse { .. } => "direct_response",
        RouteDecision::ClarificationShortCircuit { .. } => "clarification_short_circuit",
        RouteDecision::Chatter => "chatter",
        RouteDecision::LlmWithTools => "llm_with_tools",
    }
    .to_string();
    TraceEvent::RoutingDecided { route: routing_label.clone() }.emit();

    let mut tools_called: Vec<String> = Vec::new();
    let mut tool_successes = 0u32;
    let mut tool_failures = 0u32;
    let mut repeat_blocks = 0u32;
    let mut enumeration_attempts = 0u32;
    let mut input_tokens = 0u32;
    let mut output_tokens = 0u32;
    let mut grounding = ResponseGrounding::Grounded;
    let mut turn_tool_results: Vec<convo_domain::ToolResult> = Vec::new();

    let draft = match &decision {
        RouteDecision::DirectResponse { text } => {
            grounding = ResponseGrounding::OutOfScope;
            text.clone()
        }
        RouteDecision::ClarificationShortCircuit { text } => {
            grounding = ResponseGrounding::Clarification;
            text.clone()
        }
        RouteDecision::Chatter => {
            let req = LlmRequest {
                system_prompt: persona(language).to_string(),
                history: Vec::new(),
                user_message: input.text.clone(),
                tools: Vec::new(),
            };
            let response = orchestrator.provider.send(&req).await?;
            input_tokens += response.usage.input_tokens;
            output_tokens += response.usage.output_tokens;
            response.text
        }
        RouteDecision::LlmWithTools => {
            let verification_pending = session.verification.status == convo_domain::VerificationStatus::Pending;
            let allowed = gate_tools(&orchestrator.tools.entries(), session.active_flow, config.kb.kb_only, verification_pending);
            TraceEvent::ToolGated {
                allowed: allowed.clone(),
                reason: if config.kb.kb_only {
                    "kb_only".to_string()
                } else if verification_pending {
                    "verification_pending".to_string()
                } else {
                    format!("active_flow={:?}", session.active_flow)
                },
            }
            .emit();
            let tool_defs = orchestrator.tools.definitions_for(&allowed);

            let directive = fact_grounding_directive(classification.intent.is_tool_required(), false);
            let prompt_input = PromptInput {
                persona: persona(language).to_string(),
                datetime_line: format!("Current time: {}", start.to_rfc3339()),
                business_identity_hints: None,
                writing_style: None,
                fact_grounding_directive: directive.map(|s| s.to_string()),
                tool_result_context: None,
                knowledge_base: Vec::new(),
                retrieved_examples: Vec::new(),
                snippets: Vec::new(),
            };
            let model_budget = config.budget.budget_for_model("default", false);
            let builder = PromptBuilder::new(to_prompt_budget(model_budget));
            let (system_prompt, report) = builder.build(&prompt_input);
            TraceEvent::BudgetReportEmitted {
                total_estimated_tokens: report.total_estimated_tokens,
                trimmed_sections: report.sections.iter().filter(|s| s.trimmed).map(|s| s.name.clone()).collect(),
            }
            .emit();
            let estimated_prompt_tokens = report.total_estimated_tokens;

            let has_new_identifier_slot = session
                .extracted_slots
                .keys()
                .any(|k| k != "customer_name" && !slots_before_merge.contains(k));
            let channel_identity_proven = channel_identity_verified(channel, &input.metadata);

            let outcome = tool_loop::run(
                &orchestrator.tools,
                &orchestrator.idempotency,
                orchestrator.provider.as_ref(),
                &mut session,
                &input.business_id,
                channel,
                &input.message_id,
                language,
                has_new_identifier_slot,
                channel_identity_proven,
                config.features.use_state_events,
                system_prompt,
                input.text.clone(),
                tool_defs,
                config.policy.max_iterations,
                config.policy.repeat_window_ms,
                config.policy.enumeration_lock.threshold,
                config.policy.enumeration_lock.window_secs,
                config.policy.enumeration_lock.lock_duration_secs,
                start,
            )
            .await?;

            orchestrator.calibrator.lock().record(estimated_prompt_tokens, outcome.usage.output_tokens);

            input_tokens += outcome.usage.input_tokens;
            output_tokens += outcome.usage.output_tokens;
            repeat_blocks += outcome.repeat_blocks;
            enumeration_attempts = outcome.enumeration_attempts;
            for result in &outcome.tool_results {
                tools_called.push(result.tool_name.clone());
                if result.outcome == convo_domain::ToolOutcome::Ok {
                    tool_successes += 1;
                } else {
                    tool_failures += 1;
                }
            }

            let decision = enforce_tool_required(classification.intent, &outcome.tool_results);
            let replacement = tool_required_reply(&decision, language);
            match decision {
                ToolRequiredDecision::Satisfied => {}
                ToolRequiredDecision::SystemError => grounding = ResponseGrounding::Clarification,
                ToolRequiredDecision::AskForVerification(_) | ToolRequiredDecision::IdentityCheck(_) => {
                    grounding = ResponseGrounding::Clarification;
                }
            }

            turn_tool_results = outcome.tool_results;
            replacement.unwrap_or(outcome.final_text)
        }
    };

    let already_supplied: Vec<String> = session.extracted_slots.keys().cloned().collect();
    let known_phones: Vec<String> = session.extracted_slots.get("phone").cloned().into_iter().collect();
    let guard_outcome = guardrails::apply(
        &draft,
        channel,
        language,
        &turn_tool_results,
        &already_supplied,
        &known_phones,
    );
    TraceEvent::GuardrailApplied { action: format!("{:?}", guard_outcome.action), reasons: Vec::new() }.emit();

    let verification_terminated = matches!(decision, RouteDecision::LlmWithTools)
        && session.verification.status == convo_domain::VerificationStatus::Pending
        && guard_outcome.action == GuardrailAction::Block
        && session.verification.record_failed_attempt();
    if verification_terminated {
        session.terminate("verification_exhausted", None);
    }

    if session.flow_status != convo_domain::FlowStatus::Terminated {
        session.flow_status = match decision {
            RouteDecision::LlmWithTools if tool_successes > 0 => convo_domain::FlowStatus::PostResult,
            RouteDecision::LlmWithTools => convo_domain::FlowStatus::InProgress,
            _ => session.flow_status,
        };
    }
    session.advance_post_result();
    session.last_active_at = start;

    let should_end_session = session.flow_status == convo_domain::FlowStatus::Terminated;
    let force_end = channel == Channel::Phone && tool_failures > 0;

    if !input.dry_run {
        let user_entry = TranscriptEntry {
            role: TranscriptRole::User,
            content: input.text.clone(),
            response_grounding: ResponseGrounding::Grounded,
            metadata: TranscriptMetadata { message_type: MessageType::Normal, guardrail_action: None },
            tool_calls: None,
            at: start,
        };
        let assistant_entry = TranscriptEntry {
            role: TranscriptRole::Assistant,
            content: guard_outcome.text.clone(),
            response_grounding: grounding,
            metadata: TranscriptMetadata {
                message_type: if config.features.use_message_type_routing
                    && matches!(decision, RouteDecision::ClarificationShortCircuit { .. })
                {
                    MessageType::Clarification
                } else {
                    MessageType::Normal
                },
                guardrail_action: Some(guard_outcome.action),
            },
            tool_calls: None,
            at: Utc::now(),
        };
        orchestrator.transcripts.append(&session.session_id, &[user_entry, assistant_entry])?;
        orchestrator.sessions.save(session.clone())?;
    }

    let duration_ms = (Utc::now() - start).num_milliseconds().max(0) as u64;
    TraceEvent::TurnCompleted { should_end_session, force_end, duration_ms }.emit();
    let metrics = TurnMetrics {
        tools_called: tools_called.clone(),
        tool_successes,
        tool_failures,
        input_tokens,
        output_tokens,
        duration_ms,
        enumeration_attempts,
        repeat_blocks,
    };

    Ok(TurnResult {
        reply: guard_outcome.text,
        should_end_session,
        force_end,
        state: Some(serde_json::json!({ "session_id": session.session_id })),
        metrics,
        input_tokens,
        output_tokens,
        debug: TurnDebug {
            classification,
            routing: routing_label,
            tools_called,
            grounding,
            guardrail_action: guard_outcome.action,
        },
    })
}

fn terminal_result(text: String, should_end_session: bool, _channel: Channel, start: chrono::DateTime<Utc>) -> TurnResult {
    TurnResult {
        reply: text,
        should_end_session,
        force_end: false,
        state: None,
        metrics: TurnMetrics { duration_ms: (Utc::now() - start).num_milliseconds().max(0) as u64, ..Default::default() },
        input_tokens: 0,
        output_tokens: 0,
        debug: TurnDebug {
            classification: convo_domain::ClassificationResult::safe_fallback(),
            routing: "terminated".to_string(),
            tools_called: Vec::new(),
            grounding: ResponseGrounding::OutOfScope,
            guardrail_action: GuardrailAction::Block,
        },
    }
}
