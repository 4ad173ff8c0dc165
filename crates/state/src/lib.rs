//! Conversation state store (§3, §4.C, §6).
//!
//! Owns the per-session record exclusively: loading, lifecycle resets,
//! append-only transcripts, and the tool-call idempotency cache. Everything
//! here is synchronous — persistence is an external collaborator in the
//! full system, and this crate ships the in-process reference store that
//! makes the orchestrator runnable standalone.

pub mod idempotency;
pub mod lifecycle;
pub mod store;
pub mod transcript;

pub use idempotency::{IdempotencyCache, IdempotencyKey};
pub use lifecycle::{LifecycleManager, ResetReason};
pub use store::{LoadResult, SessionStore};
pub use transcript::TranscriptWriter;
