//! Tool Loop (§4.G) — the hardest subsystem: a bounded loop driving the LLM
//! with the gated tool set, with preconditions, repeat-guard, idempotency,
//! retry, sanitization, outcome policy, and terminal short-circuits.

use chrono::{DateTime, Utc};

use convo_domain::{
    Anchor, AnchorType, Channel, Language, LastToolAttempt, Result, Session, StateEvent,
    ToolCall, ToolDefinition, ToolOutcome, ToolResult, TraceEvent, Usage, VerificationState,
    VerificationStatus,
};
use convo_policy::enumeration::{check_enumeration_lock, EnumerationCheck};
use convo_policy::pii::redact_for_logging;
use convo_policy::repeat_guard::{args_hash, should_repeat_guard};
use convo_providers::{FunctionResponse, LlmProvider, LlmRequest};
use convo_state::IdempotencyCache;
use convo_state::IdempotencyKey;
use convo_tools::{sanitize_result, ToolCatalog};

/// What the loop produced for one turn.
pub struct ToolLoopOutcome {
    pub final_text: String,
    pub tool_results: Vec<ToolResult>,
    pub usage: Usage,
    /// A terminal outcome, repeat-guard trip, or enumeration lock ended the
    /// loop before a final LLM turn without tool calls (§4.G step h).
    pub short_circuited: bool,
    pub repeat_blocks: u32,
    pub enumeration_locked: bool,
    /// `Session.consecutive_not_found` as it stood when the loop returned —
    /// the real enumeration-lock counter, for the outbound metrics contract
    /// (§4.I).
    pub enumeration_attempts: u32,
}

fn localized_fallback(language: Language) -> &'static str {
    match language {
        Language::Tr => "Şu anda bu talebi tamamlayamıyorum, lütfen daha sonra tekrar deneyin.",
        Language::En => "I can't complete that request right now — please try again shortly.",
    }
}

fn lang_key(language: Language) -> &'static str {
    match language {
        Language::Tr => "tr",
        Language::En => "en",
    }
}

fn ask_for_clarification(ask_for: &[String], language: Language) -> String {
    let fields = ask_for.join(", ");
    match language {
        Language::Tr => format!("Bu konuda daha önce de bilgi almıştık; {fields} bilgisini teyit edebilir misiniz?"),
        Language::En => format!("We already checked this — could you confirm {fields}?"),
    }
}

fn apply_state_events(session: &mut Session, events: &[StateEvent], now: DateTime<Utc>) {
    for event in events {
        match event {
            StateEvent::SetAnchor { anchor_type, truth } => {
                let anchor_type = match anchor_type.as_str() {
                    "Stock" => AnchorType::Stock,
                    "Order" => AnchorType::Order,
                    _ => continue,
                };
                session.anchor = Some(Anchor { anchor_type, truth: truth.clone(), set_at: now });
            }
            StateEvent::ClearVerification => {
                session.verification = Default::default();
            }
            StateEvent::SetActiveFlow { flow } => {
                session.active_flow = match flow.as_str() {
                    "order_status" => Some(convo_domain::ActiveFlow::OrderStatus),
                    "debt_inquiry" => Some(convo_domain::ActiveFlow::DebtInquiry),
                    "tracking_info" => Some(convo_domain::ActiveFlow::TrackingInfo),
                    "account_lookup" => Some(convo_domain::ActiveFlow::AccountLookup),
                    "stock_check" => Some(convo_domain::ActiveFlow::StockCheck),
                    "product_info" => Some(convo_domain::ActiveFlow::ProductInfo),
                    "callback_request" => Some(convo_domain::ActiveFlow::CallbackRequest),
                    _ => session.active_flow,
                };
            }
            StateEvent::ClearActiveFlow => {
                session.active_flow = None;
            }
        }
    }
}

/// Update the single-slot repeat-attempt ledger (§3, §9): only `NotFound`
/// and `NeedMoreInfo` outcomes are tracked, and the counter resets whenever
/// the `(tool_name, args_hash)` pair changes.
fn update_last_tool_attempt(session: &mut Session, tool_name: &str, hash: &str, outcome: ToolOutcome, ask_for: Option<Vec<String>>, now: DateTime<Utc>) {
    if !outcome.is_repeat_guard_eligible() {
        return;
    }
    let count = match &session.last_tool_attempt {
        Some(prev) if prev.tool_name == tool_name && prev.args_hash == hash => prev.count + 1,
        _ => 1,
    };
    session.last_tool_attempt = Some(LastToolAttempt {
        tool_name: tool_name.to_string(),
        args_hash: hash.to_string(),
        outcome,
        count,
        ask_for,
        at: now,
    });
}

#[allow(clippy::too_many_arguments)]
pub async fn run(
    catalog: &ToolCatalog,
    idempotency: &IdempotencyCache,
    provider: &dyn LlmProvider,
    session: &mut Session,
    business_id: &str,
    channel: Channel,
    message_id: &str,
    language: Language,
    has_new_identifier_slot: bool,
    channel_identity_verified: bool,
    use_state_events: bool,
    system_prompt: String,
    user_message: String,
    tool_defs: Vec<ToolDefinition>,
    max_iterations: u32,
    repeat_window_ms: u64,
    enum_threshold: u32,
    enum_window_secs: i64,
    enum_lock_duration_secs: i64,
    now: DateTime<Utc>,
) -> Result<ToolLoopOutcome> {
    let req = LlmRequest { system_prompt, history: Vec::new(), user_message, tools: tool_defs };

    let mut usage = Usage::default();
    let mut all_results: Vec<ToolResult> = Vec::new();
    let mut repeat_blocks = 0u32;

    tracing::debug!(text = %redact_for_logging(&req.user_message), "tool loop sending user message to provider");
    let mut response = provider.send(&req).await?;
    usage.input_tokens += response.usage.input_tokens;
    usage.output_tokens += response.usage.output_tokens;

    for _iteration in 0..max_iterations {
        if response.function_calls.is_empty() {
            let final_text = if response.text.trim().is_empty() { localized_fallback(language).to_string() } else { response.text };
            tracing::debug!(text = %redact_for_logging(&final_text), "tool loop returning text without function calls");
            return Ok(ToolLoopOutcome {
                final_text,
                tool_results: all_results,
                usage,
                short_circuited: false,
                repeat_blocks,
                enumeration_locked: false,
                enumeration_attempts: session.consecutive_not_found,
            });
        }

        let mut function_responses = Vec::with_capacity(response.function_calls.len());
        let mut short_circuit_text: Option<String> = None;
        let mut enumeration_locked = false;

        for call in &response.function_calls {
            let ToolCall { call_id, tool_name, arguments } = call;

            // a. Precondition check.
            if let Some(tool) = catalog.get(tool_name) {
                let missing: Vec<String> = tool
                    .entry()
                    .preconditions
                    .required_slots
                    .iter()
                    .filter(|slot| !session.extracted_slots.contains_key(slot.as_str()))
                    .cloned()
                    .collect();
                if !missing.is_empty() {
                    let guidance = tool
                        .entry()
                        .preconditions
                        .guidance_per_language
                        .get(lang_key(language))
                        .cloned()
                        .unwrap_or_else(|| format!("missing: {}", missing.join(", ")));
                    let result = ToolResult::need_more_info(tool_name.clone(), guidance, missing);
                    function_responses.push(FunctionResponse { call_id: call_id.clone(), content: result.model_facing_content(), is_error: true });
                    all_results.push(result);
                    continue;
                }
            }

            // b. Repeat-guard.
            let hash = args_hash(arguments);
            if should_repeat_guard(session.last_tool_attempt.as_ref(), tool_name, &hash, now, repeat_window_ms, has_new_identifier_slot) {
                repeat_blocks += 1;
                TraceEvent::RepeatGuardTripped { tool_name: tool_name.clone(), args_hash: hash.clone() }.emit();
                let ask_for = session.last_tool_attempt.as_ref().and_then(|a| a.ask_for.clone()).unwrap_or_default();
                short_circuit_text = Some(ask_for_clarification(&ask_for, language));
                break;
            }

            tracing::debug!(tool = %tool_name, arguments = %redact_for_logging(&arguments.to_string()), "invoking tool");

            // c. Idempotency.
            let idem_key = IdempotencyKey::new(business_id, channel, message_id, tool_name.clone());
            let call_started = Utc::now();
            let (result, from_cache) = if let Some(cached) = idempotency.get(&idem_key, now) {
                (cached, true)
            } else {
                // d. Execute with retry.
                let executed = catalog.execute_with_retry(tool_name, arguments).await?;
                if executed.outcome == ToolOutcome::Ok {
                    idempotency.set(idem_key, executed.clone(), now);
                }
                (executed, false)
            };
            TraceEvent::ToolInvoked {
                tool_name: tool_name.clone(),
                outcome: format!("{:?}", result.outcome),
                retried: !from_cache && result.outcome == ToolOutcome::InfraError,
                duration_ms: (Utc::now() - call_started).num_milliseconds().max(0) as u64,
            }
            .emit();

            // e. Sanitize result.
            let (sanitized_data, missing_required) = match catalog.get(tool_name) {
                Some(tool) => {
                    let known_phones: Vec<String> = session.extracted_slots.get("phone").cloned().into_iter().collect();
                    let data = result.data.clone().unwrap_or(serde_json::Value::Null);
                    sanitize_result(&tool.entry().field_whitelist, &data, &known_phones)
                }
                None => (result.data.clone().unwrap_or(serde_json::Value::Null), Vec::new()),
            };
            let mut result = result;
            if result.outcome == ToolOutcome::Ok {
                result.data = Some(sanitized_data);
                if !missing_required.is_empty() {
                    tracing::warn!(tool = %tool_name, missing = ?missing_required, "required whitelist fields missing after sanitization");
                }
            }

            // f. Apply outcome policy: anchor/state events, repeat ledger.
            if use_state_events {
                if let Some(events) = &result.state_events {
                    apply_state_events(session, events, now);
                }
            }
            update_last_tool_attempt(session, tool_name, &hash, result.outcome, result.ask_for.clone(), now);
            match result.outcome {
                ToolOutcome::NotFound => {
                    session.consecutive_not_found += 1;
                    session.last_not_found_at = Some(now);
                }
                ToolOutcome::Ok => {
                    session.consecutive_not_found = 0;
                    session.last_not_found_at = None;
                }
                _ => {}
            }

            // g. Autoverify hook: a channel-identity proof (e.g. a verified
            // phone channel) may promote `VerificationRequired` to `Ok`
            // instead of forcing another identity-check round-trip.
            if result.outcome == ToolOutcome::VerificationRequired && channel_identity_verified {
                result.outcome = ToolOutcome::Ok;
                session.verification = VerificationState { status: VerificationStatus::Verified, pending_field: None, attempts: 0 };
                TraceEvent::ToolInvoked {
                    tool_name: format!("{tool_name}:autoverify"),
                    outcome: "Ok".to_string(),
                    retried: false,
                    duration_ms: 0,
                }
                .emit();
            }

            // Enumeration lock check, driven by the independent counter (§4.B).
            if let EnumerationCheck::Lock { lock_until } = check_enumeration_lock(
                session.consecutive_not_found,
                session.last_not_found_at,
                now,
                enum_threshold,
                enum_window_secs,
                enum_lock_duration_secs,
            ) {
                session.terminate("enumeration_lock", Some(lock_until));
                TraceEvent::EnumerationLockTripped { session_key: session.key.as_string(), lock_until: lock_until.to_rfc3339() }.emit();
                enumeration_locked = true;
                all_results.push(result);
                break;
            }

            // h. Short-circuit on terminal outcomes.
            if result.outcome.is_terminal() {
                short_circuit_text = Some(result.message.clone());
                all_results.push(result);
                break;
            }

            function_responses.push(FunctionResponse { call_id: call_id.clone(), content: result.model_facing_content(), is_error: result.outcome != ToolOutcome::Ok });
            all_results.push(result);
        }

        if enumeration_locked {
            let locked_text = match language {
                Language::Tr => "Bu oturum güvenlik nedeniyle geçici olarak kısıtlandı.".to_string(),
                Language::En => "This session has been temporarily restricted for security reasons.".to_string(),
            };
            return Ok(ToolLoopOutcome { final_text: locked_text, tool_results: all_results, usage, short_circuited: true, repeat_blocks, enumeration_locked: true, enumeration_attempts: session.consecutive_not_found });
        }

        if let Some(text) = short_circuit_text {
            return Ok(ToolLoopOutcome { final_text: text, tool_results: all_results, usage, short_circuited: true, repeat_blocks, enumeration_locked: false, enumeration_attempts: session.consecutive_not_found });
        }

        response = provider.reply(&req, &function_responses).await?;
        usage.input_tokens += response.usage.input_tokens;
        usage.output_tokens += response.usage.output_tokens;
    }

    // Iteration cap hit with function calls still pending (§4.G termination
    // invariants): finalize with whatever text came back, or a fallback.
    let final_text = if response.text.trim().is_empty() { localized_fallback(language).to_string() } else { response.text };
    Ok(ToolLoopOutcome { final_text, tool_results: all_results, usage, short_circuited: false, repeat_blocks, enumeration_locked: false, enumeration_attempts: session.consecutive_not_found })
}
