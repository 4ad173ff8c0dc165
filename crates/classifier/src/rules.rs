use async_trait::async_trait;
use convo_domain::{ActiveFlow, AnchorType, ClassificationResult, FlowStatus, IntentType, Result, Session};

use crate::slots::extract_slots;
use crate::trait_::{ClassifyInput, Classifier};

struct KeywordRule {
    keywords: &'static [&'static str],
    intent: IntentType,
    flow: Option<ActiveFlow>,
}

const RULES: &[KeywordRule] = &[
    KeywordRule { keywords: &["sipariş", "kargo", "order", "shipment"], intent: IntentType::Order, flow: Some(ActiveFlow::OrderStatus) },
    KeywordRule { keywords: &["kargo takip", "tracking", "nerede"], intent: IntentType::Tracking, flow: Some(ActiveFlow::TrackingInfo) },
    KeywordRule { keywords: &["stok", "stock", "kaç tane", "adet var"], intent: IntentType::Stock, flow: Some(ActiveFlow::StockCheck) },
    KeywordRule { keywords: &["ürün", "product", "özellik"], intent: IntentType::Pricing, flow: Some(ActiveFlow::ProductInfo) },
    KeywordRule { keywords: &["borç", "fatura", "billing", "debt"], intent: IntentType::Billing, flow: Some(ActiveFlow::DebtInquiry) },
    KeywordRule { keywords: &["randevu", "appointment"], intent: IntentType::Appointment, flow: None },
    KeywordRule { keywords: &["şikayet", "complaint", "memnun değilim"], intent: IntentType::Complaint, flow: None },
    KeywordRule { keywords: &["iade", "return"], intent: IntentType::Return, flow: None },
    KeywordRule { keywords: &["geri ödeme", "refund"], intent: IntentType::Refund, flow: None },
    KeywordRule { keywords: &["hesabım", "account", "müşteri bilgisi"], intent: IntentType::Account, flow: Some(ActiveFlow::AccountLookup) },
    KeywordRule { keywords: &["beni ara", "callback", "geri arama"], intent: IntentType::Appointment, flow: Some(ActiveFlow::CallbackRequest) },
    KeywordRule { keywords: &["merhaba", "selam", "teşekkür", "hello", "hi", "thanks"], intent: IntentType::Chatter, flow: None },
];

/// Deterministic rule/pattern classifier (§4.D): regex-based slot extraction
/// plus keyword-table intent matching, in Turkish and English. Bounded,
/// exhaustively testable, and free of network I/O — exactly what the spec
/// asks the reference classifier to be, with the `Classifier` trait left
/// open for an LLM- or embedding-based implementation.
#[derive(Debug, Default)]
pub struct RuleBasedClassifier;

impl RuleBasedClassifier {
    fn match_intent(text: &str, state: &Session) -> (IntentType, Option<ActiveFlow>, f32) {
        let lower = text.to_lowercase();
        for rule in RULES {
            if rule.keywords.iter().any(|k| lower.contains(k)) {
                return (rule.intent, rule.flow, 0.8);
            }
        }
        // State-dependent disambiguation (§4.D's input contract): a short,
        // keyword-free follow-up right after a stock lookup ("kaç tane var?"
        // is just one phrasing of this) is still a stock follow-up as long
        // as the anchor and post-result state say so.
        if let Some(anchor) = &state.anchor {
            if anchor.anchor_type == AnchorType::Stock && state.flow_status == FlowStatus::PostResult {
                return (IntentType::Stock, Some(ActiveFlow::StockCheck), 0.6);
            }
        }
        (IntentType::Unknown, None, 0.2)
    }
}

#[async_trait]
impl Classifier for RuleBasedClassifier {
    async fn classify(&self, input: ClassifyInput<'_>) -> Result<ClassificationResult> {
        let (intent, suggested_flow, confidence) = Self::match_intent(input.user_text, input.state);
        let extracted_slots = extract_slots(input.user_text);
        Ok(ClassificationResult {
            intent,
            confidence,
            extracted_slots,
            suggested_flow,
            had_classifier_failure: false,
        })
    }
}
