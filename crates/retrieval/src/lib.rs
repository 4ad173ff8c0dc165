//! Narrow retrieval contract for the email draft pipeline (§4.J, §6).
//!
//! A real implementation is backed by a vector store and is an external
//! collaborator; this crate ships only the trait and an in-memory test
//! double, grounded on the shape of a memory-provider client that resolves
//! business facts by similarity search rather than exact lookup.

use async_trait::async_trait;
use convo_domain::{ClassificationResult, Result};
use serde::{Deserialize, Serialize};

/// A previously-sent email judged similar to the current thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarExample {
    pub id: String,
    pub text: String,
    pub score: f32,
}

/// A (customer message, agent reply) pair used for tone matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyPair {
    pub id: String,
    pub customer_message: String,
    pub agent_reply: String,
    pub score: f32,
}

/// A short reusable phrase template (e.g. a standard apology or closing).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snippet {
    pub id: String,
    pub text: String,
}

/// Retrieval collaborator consumed by the email draft pipeline (§6).
#[async_trait]
pub trait Retrieval: Send + Sync {
    async fn similar_examples(
        &self,
        business_id: &str,
        text: &str,
        classification: &ClassificationResult,
        k: usize,
    ) -> Result<Vec<SimilarExample>>;

    async fn similar_pairs(
        &self,
        business_id: &str,
        text: &str,
        classification: &ClassificationResult,
        k: usize,
    ) -> Result<Vec<ReplyPair>>;

    async fn select_snippets(
        &self,
        business_id: &str,
        classification: &ClassificationResult,
        k: usize,
    ) -> Result<Vec<Snippet>>;
}

/// In-memory test double, keyed by `business_id`, seeded by the caller.
#[derive(Debug, Default)]
pub struct InMemoryRetrieval {
    pub examples: Vec<SimilarExample>,
    pub pairs: Vec<ReplyPair>,
    pub snippets: Vec<Snippet>,
}

#[async_trait]
impl Retrieval for InMemoryRetrieval {
    async fn similar_examples(
        &self,
        _business_id: &str,
        _text: &str,
        _classification: &ClassificationResult,
        k: usize,
    ) -> Result<Vec<SimilarExample>> {
        Ok(self.examples.iter().take(k).cloned().collect())
    }

    async fn similar_pairs(
        &self,
        _business_id: &str,
        _text: &str,
        _classification: &ClassificationResult,
        k: usize,
    ) -> Result<Vec<ReplyPair>> {
        Ok(self.pairs.iter().take(k).cloned().collect())
    }

    async fn select_snippets(
        &self,
        _business_id: &str,
        _classification: &ClassificationResult,
        k: usize,
    ) -> Result<Vec<Snippet>> {
        Ok(self.snippets.iter().take(k).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use convo_domain::IntentType;

    fn classification() -> ClassificationResult {
        ClassificationResult {
            intent: IntentType::Order,
            confidence: 0.8,
            extracted_slots: Default::default(),
            suggested_flow: None,
            had_classifier_failure: false,
        }
    }

    #[tokio::test]
    async fn in_memory_retrieval_caps_at_k() {
        let retrieval = InMemoryRetrieval {
            examples: vec![
                SimilarExample { id: "1".into(), text: "a".into(), score: 0.9 },
                SimilarExample { id: "2".into(), text: "b".into(), score: 0.8 },
            ],
            pairs: vec![],
            snippets: vec![],
        };
        let got = retrieval.similar_examples("biz1", "text", &classification(), 1).await.unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].id, "1");
    }
}
