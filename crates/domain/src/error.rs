/// Shared error taxonomy used across every orchestrator crate.
///
/// Tool- and classifier-layer failures are caught at their source and
/// converted into the typed result contracts (`ToolResult`,
/// `ClassificationResult`) instead of propagating as `Error` — see
/// `convo-policy` and `convo-classifier`. Only genuinely unrecoverable
/// conditions (config, persistence I/O) reach callers as `Error`.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config: {0}")]
    Config(String),

    #[error("provider {provider}: {message}")]
    Provider { provider: String, message: String },

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("classifier: {0}")]
    Classifier(String),

    #[error("tool: {0}")]
    ToolError(String),

    #[error("persist: {0}")]
    Persist(String),

    #[error("deadline exceeded: {0}")]
    DeadlineExceeded(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
