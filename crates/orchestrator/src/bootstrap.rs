//! Ambient: Config & Bootstrap (§4.K).
//!
//! Resolves the tool catalog, LLM provider, classifier, and policy
//! thresholds once at process start and wraps them in `Arc`s so every turn
//! shares the same read-only configuration (§5, §9). Nothing here mutates
//! after construction; per-turn mutation happens only on the `Session`
//! value a turn loads and saves.

use std::path::Path;
use std::sync::Arc;

use convo_classifier::{Classifier, RuleBasedClassifier};
use convo_domain::{Config, Result};
use convo_promptkit::EstimationCalibrator;
use convo_providers::{LlmProvider, MockProvider};
use convo_retrieval::{InMemoryRetrieval, Retrieval};
use convo_state::{IdempotencyCache, LifecycleManager, SessionStore, TranscriptWriter};
use convo_tools::{mock_tools, ToolCatalog};

/// Everything a turn needs, assembled once and shared across turns via `Arc`.
pub struct Orchestrator {
    pub config: Arc<Config>,
    pub sessions: SessionStore,
    pub transcripts: TranscriptWriter,
    pub idempotency: IdempotencyCache,
    pub lifecycle: LifecycleManager,
    pub tools: ToolCatalog,
    pub provider: Arc<dyn LlmProvider>,
    pub classifier: Arc<dyn Classifier>,
    pub retrieval: Arc<dyn Retrieval>,
    /// Shared across turns (§4.F): every prompt build records its estimate
    /// against the provider's actual token count so the rolling error can
    /// inform recalibration.
    pub calibrator: parking_lot::Mutex<EstimationCalibrator>,
}

impl Orchestrator {
    /// Wire real(ish) collaborators from a loaded `Config` plus a caller-supplied
    /// provider, classifier, catalog, and retrieval implementation.
    pub fn new(
        config: Config,
        state_dir: &Path,
        provider: Arc<dyn LlmProvider>,
        classifier: Arc<dyn Classifier>,
        tools: ToolCatalog,
        retrieval: Arc<dyn Retrieval>,
    ) -> Result<Self> {
        let config = Arc::new(config);
        let sessions = SessionStore::new(state_dir)?;
        let transcripts = TranscriptWriter::new(&state_dir.join("transcripts"));
        let idempotency = IdempotencyCache::new(chrono::Duration::hours(24));
        let lifecycle = LifecycleManager::new(config.lifecycle.clone());
        let calibrator = parking_lot::Mutex::new(EstimationCalibrator::new(50));

        Ok(Self { config, sessions, transcripts, idempotency, lifecycle, tools, provider, classifier, retrieval, calibrator })
    }

    /// Wire every collaborator as an in-memory mock (§4.N): a `MockProvider`,
    /// the rule-based classifier, the four fixture tools, and an empty
    /// retrieval double. This is what the CLI harness and integration tests
    /// drive `handle_turn` against, since §1 scopes every real collaborator
    /// out as external.
    pub fn mock(state_dir: &Path) -> Result<Self> {
        let mut catalog = ToolCatalog::new();
        catalog.register(Arc::new(mock_tools::OrderLookupTool::default()));
        catalog.register(Arc::new(mock_tools::StockCheckTool::default()));
        catalog.register(Arc::new(mock_tools::CreateCallbackTool::default()));
        catalog.register(Arc::new(mock_tools::CustomerDataLookupTool::default()));

        Self::new(
            Config::default(),
            state_dir,
            Arc::new(MockProvider::new("mock")),
            Arc::new(RuleBasedClassifier),
            catalog,
            Arc::new(InMemoryRetrieval::default()),
        )
    }
}
