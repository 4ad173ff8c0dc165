//! Router (§4.E): decides among direct response, clarification short-circuit,
//! chatter, or the default LLM-with-tools path.

use convo_domain::{ActiveFlow, AnchorType, ClassificationResult, Config, FlowStatus, IntentType, Language, Session};

/// The four outputs the router can choose between for a turn.
#[derive(Debug, Clone)]
pub enum RouteDecision {
    /// No LLM call at all — e.g. `KbOnly` channel mode redirecting to
    /// curated help links.
    DirectResponse { text: String },
    /// Entity resolution flagged the turn as out-of-scope or too fuzzy to
    /// ground confidently; ask a clarifying question instead of guessing.
    ClarificationShortCircuit { text: String },
    /// Small talk: still goes to the LLM, but with an austere prompt and no
    /// tools exposed.
    Chatter,
    /// The default path: LLM with the gated tool set.
    LlmWithTools,
}

/// Confidence floor below which an `Unknown` classification is treated as
/// out-of-scope rather than handed to the LLM, when strict grounding is on.
const LOW_CONFIDENCE_THRESHOLD: f32 = 0.3;

pub fn route(classification: &ClassificationResult, config: &Config, language: Language, session: &Session) -> RouteDecision {
    if config.kb.kb_only {
        let lang_key = match language {
            Language::Tr => "tr",
            Language::En => "en",
        };
        let links = config.kb.support_links.get(lang_key);
        let body = links
            .map(|links| links.iter().map(|l| format!("{}: {}", l.label, l.url)).collect::<Vec<_>>().join("\n"))
            .unwrap_or_default();
        let text = match language {
            Language::Tr => format!("Bu kanaldan kişisel hesap sorgusu yapamıyoruz. Yardımcı olabilecek bağlantılar:\n{body}"),
            Language::En => format!("This channel can't look up personal account details. Here are some links that may help:\n{body}"),
        };
        return RouteDecision::DirectResponse { text };
    }

    if config.features.text_strict_grounding
        && classification.intent == IntentType::Unknown
        && classification.confidence < LOW_CONFIDENCE_THRESHOLD
    {
        let text = match language {
            Language::Tr => "Tam olarak ne ile yardımcı olabileceğimi anlayamadım, biraz daha detay verebilir misiniz?".to_string(),
            Language::En => "I'm not sure I understood — could you give me a bit more detail?".to_string(),
        };
        return RouteDecision::ClarificationShortCircuit { text };
    }

    // Dispute resolution: a complaint raised while a verified anchor is on
    // file doesn't need the LLM to adjudicate — it needs a human, now.
    if classification.intent == IntentType::Complaint && session.anchor.is_some() {
        let text = match language {
            Language::Tr => "Bu konuyu kayıtlı bilgilerinizle birlikte ilgili ekibimize ilettim, sizinle en kısa sürede iletişime geçecekler.".to_string(),
            Language::En => "I've passed this along to our team with your account details on file — they'll follow up with you shortly.".to_string(),
        };
        return RouteDecision::DirectResponse { text };
    }

    // Slot collection complete: a callback request that already has the one
    // slot it needs (a phone number) and hasn't been acknowledged yet closes
    // out without a round trip to the LLM.
    if session.active_flow == Some(ActiveFlow::CallbackRequest)
        && session.extracted_slots.contains_key("phone")
        && session.flow_status != FlowStatus::PostResult
    {
        let text = match language {
            Language::Tr => "Teşekkürler, geri arama talebiniz için gereken bilgileri aldım. En kısa sürede sizi arayacağız.".to_string(),
            Language::En => "Thanks, I have everything I need for your callback request — we'll reach out shortly.".to_string(),
        };
        return RouteDecision::DirectResponse { text };
    }

    if classification.intent == IntentType::Chatter {
        return RouteDecision::Chatter;
    }

    RouteDecision::LlmWithTools
}

#[cfg(test)]
mod tests {
    use super::*;
    use convo_domain::{Anchor, Channel, SessionKey};
    use std::collections::HashMap;

    fn classification(intent: IntentType, confidence: f32) -> ClassificationResult {
        ClassificationResult { intent, confidence, extracted_slots: HashMap::new(), suggested_flow: None, had_classifier_failure: false }
    }

    fn session() -> Session {
        Session::new("s1", SessionKey::new(Channel::Whatsapp, "biz1", "user1"), chrono::Utc::now())
    }

    #[test]
    fn kb_only_short_circuits_before_anything_else() {
        let mut config = Config::default();
        config.kb.kb_only = true;
        let decision = route(&classification(IntentType::Order, 0.9), &config, Language::En, &session());
        assert!(matches!(decision, RouteDecision::DirectResponse { .. }));
    }

    #[test]
    fn low_confidence_unknown_is_clarification() {
        let config = Config::default();
        let decision = route(&classification(IntentType::Unknown, 0.1), &config, Language::En, &session());
        assert!(matches!(decision, RouteDecision::ClarificationShortCircuit { .. }));
    }

    #[test]
    fn chatter_routes_to_chatter() {
        let config = Config::default();
        let decision = route(&classification(IntentType::Chatter, 0.8), &config, Language::En, &session());
        assert!(matches!(decision, RouteDecision::Chatter));
    }

    #[test]
    fn tool_required_intent_routes_to_llm_with_tools() {
        let config = Config::default();
        let decision = route(&classification(IntentType::Order, 0.8), &config, Language::En, &session());
        assert!(matches!(decision, RouteDecision::LlmWithTools));
    }

    #[test]
    fn complaint_with_anchor_routes_directly_to_dispute_resolution() {
        let config = Config::default();
        let mut s = session();
        s.anchor = Some(Anchor { anchor_type: AnchorType::Order, truth: serde_json::json!({"order": "ORD-1"}), set_at: chrono::Utc::now() });
        let decision = route(&classification(IntentType::Complaint, 0.9), &config, Language::En, &s);
        assert!(matches!(decision, RouteDecision::DirectResponse { .. }));
    }

    #[test]
    fn complaint_without_anchor_still_goes_to_llm_with_tools() {
        let config = Config::default();
        let decision = route(&classification(IntentType::Complaint, 0.9), &config, Language::En, &session());
        assert!(matches!(decision, RouteDecision::LlmWithTools));
    }

    #[test]
    fn callback_flow_with_phone_slot_short_circuits_before_post_result() {
        let config = Config::default();
        let mut s = session();
        s.active_flow = Some(ActiveFlow::CallbackRequest);
        s.extracted_slots.insert("phone".to_string(), "+905551112233".to_string());
        let decision = route(&classification(IntentType::Appointment, 0.8), &config, Language::En, &s);
        assert!(matches!(decision, RouteDecision::DirectResponse { .. }));
    }

    #[test]
    fn callback_flow_already_past_post_result_does_not_repeat_direct_response() {
        let config = Config::default();
        let mut s = session();
        s.active_flow = Some(ActiveFlow::CallbackRequest);
        s.extracted_slots.insert("phone".to_string(), "+905551112233".to_string());
        s.flow_status = FlowStatus::PostResult;
        let decision = route(&classification(IntentType::Appointment, 0.8), &config, Language::En, &s);
        assert!(matches!(decision, RouteDecision::LlmWithTools));
    }
}
