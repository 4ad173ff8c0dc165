//! The LLM collaborator contract (§6) and its adapters.
//!
//! The orchestrator treats the language model as an external collaborator
//! behind a narrow, non-streaming interface: `send` for the first exchange
//! of a turn, `reply` once tool results come back. Everything provider-specific
//! (wire format, auth, retries) lives behind [`LlmProvider`]; the tool loop in
//! `convo-orchestrator` never sees an HTTP client.

pub mod mock;
pub mod openai_compat;
pub mod traits;

pub use mock::MockProvider;
pub use openai_compat::OpenAiCompatProvider;
pub use traits::{FunctionResponse, LlmProvider, LlmRequest, LlmResponse};
