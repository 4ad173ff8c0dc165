//! Pure policy functions over `convo_domain` types (§4.B).
//!
//! Every function here is side-effect-free: callers (the orchestrator's
//! tool loop and guardrail stages) own reading and writing `Session` state.
//! This keeps the policy kernel table-testable without mocking I/O.

pub mod action_claim;
pub mod enumeration;
pub mod fact_grounding;
pub mod gating;
pub mod pii;
pub mod repeat_guard;
pub mod tool_required;
pub mod verification;

pub use action_claim::{contains_action_claim, rewrite_action_claims};
pub use enumeration::{check_enumeration_lock, EnumerationCheck};
pub use fact_grounding::fact_grounding_directive;
pub use gating::gate_tools;
pub use pii::{redact_for_logging, redact_outbound_text};
pub use repeat_guard::{args_hash, should_repeat_guard};
pub use tool_required::{enforce_tool_required, ToolRequiredDecision};
pub use verification::{strip_false_promises, verification_question};
