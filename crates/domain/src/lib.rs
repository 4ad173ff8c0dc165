pub mod classification;
pub mod config;
pub mod error;
pub mod message;
pub mod session;
pub mod tool;
pub mod trace;
pub mod turn;

pub use classification::{ClassificationResult, IntentType};
pub use config::{Config, LifecycleConfig};
pub use error::{Error, Result};
pub use message::{ContentPart, Message, MessageContent, Role, Usage};
pub use session::{
    ActiveFlow, Anchor, AnchorType, FlowStatus, LastToolAttempt, Session, SessionKey,
    VerificationState, VerificationStatus,
};
pub use tool::{
    normalize_outcome, FieldWhitelist, StateEvent, ToolCall, ToolCatalogEntry, ToolDefinition,
    ToolOutcome, ToolPrecondition, ToolResult,
};
pub use trace::TraceEvent;
pub use turn::{
    Channel, GuardrailAction, Language, MessageType, ResponseGrounding, TranscriptEntry,
    TranscriptMetadata, TranscriptRole, TurnDebug, TurnInput, TurnMetrics, TurnResult,
};
