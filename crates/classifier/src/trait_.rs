use async_trait::async_trait;
use convo_domain::{Channel, ClassificationResult, Language, Result, Session};

/// Everything the classifier needs to decide an intent (§4.D): last
/// assistant content, user text, session state, language, and channel.
#[derive(Debug, Clone)]
pub struct ClassifyInput<'a> {
    pub last_assistant_content: Option<&'a str>,
    pub user_text: &'a str,
    pub state: &'a Session,
    pub language: Language,
    pub channel: Channel,
}

/// A swappable classification strategy (§4.D, §6). The reference
/// implementation (`RuleBasedClassifier`) never performs network I/O; an
/// LLM- or embedding-based implementation is free to, provided it still
/// respects the timeout enforced by [`classify_with_timeout`].
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, input: ClassifyInput<'_>) -> Result<ClassificationResult>;
}

/// Runs `classifier` under a bounded deadline; any timeout or error is
/// converted into the safe, low-confidence fallback rather than propagated
/// (§4.D, §5, §7 — the classifier must fail closed).
pub async fn classify_with_timeout(
    classifier: &dyn Classifier,
    input: ClassifyInput<'_>,
    timeout_ms: u64,
) -> ClassificationResult {
    match tokio::time::timeout(std::time::Duration::from_millis(timeout_ms), classifier.classify(input)).await {
        Ok(Ok(result)) => result,
        Ok(Err(err)) => {
            tracing::warn!(error = %err, "classifier returned an error, failing closed");
            ClassificationResult::safe_fallback()
        }
        Err(_) => {
            tracing::warn!(timeout_ms, "classifier timed out, failing closed");
            ClassificationResult::safe_fallback()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use convo_domain::{IntentType, SessionKey};

    fn test_session() -> Session {
        Session::new("s1", SessionKey::new(Channel::Whatsapp, "biz1", "user1"), chrono::Utc::now())
    }

    struct SlowClassifier;

    #[async_trait]
    impl Classifier for SlowClassifier {
        async fn classify(&self, _input: ClassifyInput<'_>) -> Result<ClassificationResult> {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            Ok(ClassificationResult {
                intent: IntentType::Order,
                confidence: 0.9,
                extracted_slots: Default::default(),
                suggested_flow: None,
                had_classifier_failure: false,
            })
        }
    }

    #[tokio::test]
    async fn timeout_yields_safe_fallback() {
        let session = test_session();
        let input = ClassifyInput {
            last_assistant_content: None,
            user_text: "merhaba",
            state: &session,
            language: Language::Tr,
            channel: Channel::Whatsapp,
        };
        let result = classify_with_timeout(&SlowClassifier, input, 5).await;
        assert!(result.had_classifier_failure);
        assert_eq!(result.confidence, 0.0);
    }

    #[tokio::test]
    async fn fast_classifier_returns_its_result() {
        let session = test_session();
        let input = ClassifyInput {
            last_assistant_content: None,
            user_text: "merhaba",
            state: &session,
            language: Language::Tr,
            channel: Channel::Whatsapp,
        };
        let result = classify_with_timeout(&SlowClassifier, input, 1_000).await;
        assert!(!result.had_classifier_failure);
        assert_eq!(result.intent, IntentType::Order);
    }
}
