//! End-to-end scenarios driving `handle_turn` against the mock collaborators
//! (§4.N): each test reproduces one of the concrete, literal-input scenarios
//! the policy kernel and tool loop are meant to hold up under.

use std::collections::HashMap;
use std::sync::Arc;

use convo_classifier::RuleBasedClassifier;
use convo_domain::{Channel, GuardrailAction, Language, ResponseGrounding, TurnInput, Usage};
use convo_orchestrator::bootstrap::Orchestrator;
use convo_orchestrator::pipeline::handle_turn;
use convo_providers::MockProvider;
use convo_retrieval::InMemoryRetrieval;
use convo_tools::{mock_tools, ToolCatalog};

fn turn(business_id: &str, user_id: &str, text: &str, language: Language) -> TurnInput {
    TurnInput {
        channel: Channel::Whatsapp,
        business_id: business_id.to_string(),
        channel_user_id: user_id.to_string(),
        session_id: None,
        message_id: uuid_like(text),
        text: text.to_string(),
        language,
        timezone: "Europe/Istanbul".to_string(),
        metadata: HashMap::new(),
        dry_run: false,
    }
}

/// A deterministic, non-random stand-in for a message id — `Date.now()`-style
/// randomness isn't needed here, just uniqueness per distinct input text.
fn uuid_like(seed: &str) -> String {
    format!("m-{:x}", seed.bytes().fold(0u64, |acc, b| acc.wrapping_mul(131).wrapping_add(b as u64)))
}

fn setup(dir: &std::path::Path) -> (Orchestrator, Arc<MockProvider>) {
    let provider = Arc::new(MockProvider::new("mock"));
    let mut catalog = ToolCatalog::new();
    catalog.register(Arc::new(mock_tools::OrderLookupTool::default()));
    catalog.register(Arc::new(mock_tools::StockCheckTool::default()));
    catalog.register(Arc::new(mock_tools::CreateCallbackTool::default()));
    catalog.register(Arc::new(mock_tools::CustomerDataLookupTool::default()));

    let orchestrator = Orchestrator::new(
        convo_domain::Config::default(),
        dir,
        provider.clone(),
        Arc::new(RuleBasedClassifier),
        catalog,
        Arc::new(InMemoryRetrieval::default()),
    )
    .expect("orchestrator wires up from compiled defaults");

    (orchestrator, provider)
}

#[tokio::test]
async fn non_existent_order_never_fabricates_a_status() {
    let dir = tempfile::tempdir().unwrap();
    let (orchestrator, provider) = setup(dir.path());

    provider.push_function_call("c1", "order_lookup", serde_json::json!({"order_number": "ORD-999999999"}));

    let result = handle_turn(&orchestrator, turn("biz1", "user1", "ORD-999999999 siparişim ne durumda?", Language::Tr))
        .await
        .unwrap();

    let fabricated_words = ["kargoda", "hazırlanıyor", "teslim edildi", "onaylandı"];
    for word in fabricated_words {
        assert!(!result.reply.to_lowercase().contains(word), "reply fabricated a status word: {word}");
    }
    assert_eq!(result.metrics.tool_failures, 1);
    assert_eq!(result.metrics.tools_called, vec!["order_lookup".to_string()]);
    assert_eq!(result.debug.grounding, ResponseGrounding::Clarification);
}

#[tokio::test]
async fn pressure_after_not_found_still_avoids_fabrication() {
    let dir = tempfile::tempdir().unwrap();
    let (orchestrator, provider) = setup(dir.path());

    provider.push_function_call("c1", "order_lookup", serde_json::json!({"order_number": "ORD-999999999"}));
    let first = handle_turn(&orchestrator, turn("biz1", "user2", "ORD-999999999 siparişim ne durumda?", Language::Tr))
        .await
        .unwrap();
    assert_eq!(first.metrics.tool_failures, 1);

    // Same order number still on file in the session; the follow-up never
    // restates it, so there's no "new identifier slot" to lift the
    // repeat-guard (§4.B, §8 scenario 2).
    provider.push_function_call("c2", "order_lookup", serde_json::json!({"order_number": "ORD-999999999"}));
    let second = handle_turn(&orchestrator, turn("biz1", "user2", "Ama bu sipariş kesinlikle var", Language::Tr))
        .await
        .unwrap();

    assert!(second.metrics.tools_called.is_empty(), "repeat-guard should have blocked a second execution");
    assert_eq!(second.metrics.repeat_blocks, 1);
    let fabricated_words = ["kargoda", "hazırlanıyor", "teslim edildi", "onaylandı"];
    for word in fabricated_words {
        assert!(!second.reply.to_lowercase().contains(word));
    }
}

#[tokio::test]
async fn stock_follow_up_without_a_fresh_tool_result_never_reveals_a_quantity() {
    let dir = tempfile::tempdir().unwrap();
    let (orchestrator, provider) = setup(dir.path());

    provider.push_function_call("c1", "stock_check", serde_json::json!({"sku": "SKU-1"}));
    let first = handle_turn(&orchestrator, turn("biz1", "user3", "SKU-1 stok durumu nedir?", Language::Tr)).await.unwrap();
    assert_eq!(first.metrics.tool_successes, 1);

    // Two idle follow-ups drain the post-result window (§4.C: resets after 3).
    for _ in 0..2 {
        provider.push_response(convo_providers::LlmResponse { text: "Başka bir isteğiniz var mı?".into(), function_calls: vec![], usage: Usage::default() });
        handle_turn(&orchestrator, turn("biz1", "user3", "teşekkürler", Language::Tr)).await.unwrap();
    }

    // A hallucinating model answers with a quantity but calls no tool — the
    // tool-required policy must replace it rather than let the number out.
    provider.push_response(convo_providers::LlmResponse { text: "12 adet stokta var.".into(), function_calls: vec![], usage: Usage::default() });
    let follow_up = handle_turn(&orchestrator, turn("biz1", "user3", "kaç tane var?", Language::Tr)).await.unwrap();

    assert!(!follow_up.reply.contains("12"));
    assert_eq!(follow_up.debug.grounding, ResponseGrounding::Clarification);
}

#[tokio::test]
async fn verification_required_lookup_asks_for_identity_not_a_status() {
    let dir = tempfile::tempdir().unwrap();
    let (orchestrator, provider) = setup(dir.path());

    provider.push_function_call("c1", "customer_data_lookup", serde_json::json!({"phone": "05551234567"}));
    let result = handle_turn(&orchestrator, turn("biz1", "user4", "Hesabımda ne var, telefonum 05551234567", Language::Tr))
        .await
        .unwrap();

    assert!(result.reply.to_lowercase().contains("doğrulamam"), "expected an identity-check prompt, got: {}", result.reply);
    assert!(!result.reply.contains("ACC-"), "account id must never leak before verification");
    assert!(!result.reply.to_lowercase().contains("dönüş yap"), "no false promise of a human follow-up");
    assert_eq!(result.debug.grounding, ResponseGrounding::Clarification);
}

#[tokio::test]
async fn repeated_not_found_with_identical_args_executes_the_tool_only_once() {
    let dir = tempfile::tempdir().unwrap();
    let (orchestrator, provider) = setup(dir.path());

    provider.push_function_call("c1", "order_lookup", serde_json::json!({"order_number": "ORD-12345"}));
    let first = handle_turn(&orchestrator, turn("biz1", "user5", "ORD-12345 nerede?", Language::Tr)).await.unwrap();
    assert_eq!(first.metrics.tools_called, vec!["order_lookup".to_string()]);

    provider.push_function_call("c2", "order_lookup", serde_json::json!({"order_number": "ORD-12345"}));
    let second = handle_turn(&orchestrator, turn("biz1", "user5", "ORD-12345 nerede?", Language::Tr)).await.unwrap();

    assert!(second.metrics.tools_called.is_empty());
    assert_eq!(second.metrics.repeat_blocks, 1);
}

#[tokio::test]
async fn kb_only_mode_redirects_without_calling_any_tool() {
    let dir = tempfile::tempdir().unwrap();
    let (mut orchestrator, _provider) = setup(dir.path());
    let mut config = convo_domain::Config::default();
    config.kb.kb_only = true;
    orchestrator.config = Arc::new(config);

    let result = handle_turn(&orchestrator, turn("biz1", "user6", "Siparişimin durumu ne?", Language::En)).await.unwrap();

    assert!(result.metrics.tools_called.is_empty());
    assert_eq!(result.debug.grounding, ResponseGrounding::OutOfScope);
    assert!(result.reply.contains("support.example.com") || result.reply.contains("Destek Merkezi") || result.reply.contains("Help Center"));
    assert_ne!(result.debug.guardrail_action, GuardrailAction::Block);
}
