//! Error types for the Aura domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each external collaborator has its own error enum; the orchestration
//! layer (`aura-agent`) composes them into routing and dispatch errors.

use thiserror::Error;

/// Failures of the LLM Gateway (the `GatewayError` of the routing design).
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl ProviderError {
    /// Whether the gateway could not be reached at all (as opposed to
    /// rejecting the request).
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::NotConfigured(_) | Self::Timeout(_) | Self::Network(_)
        )
    }
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Tool timed out: {tool_name} after {timeout_secs}s")]
    Timeout { tool_name: String, timeout_secs: u64 },

    #[error("Capability '{0}' is not allowed for this role")]
    NotAllowed(String),

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}

/// Knowledge Store failures.
#[derive(Debug, Clone, Error)]
pub enum KnowledgeError {
    /// No backend configured, or the backend cannot be reached.
    #[error("Knowledge store unavailable: {0}")]
    Unavailable(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Embedding generation failed: {0}")]
    EmbeddingFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

/// Document ingestion failures. Reported to the caller as rejections and
/// never retried.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Unsupported document type: '{0}'")]
    UnsupportedDocumentType(String),

    #[error("No text could be extracted from '{0}'")]
    EmptyExtraction(String),

    #[error("Failed to extract text from '{file}': {reason}")]
    ExtractionFailed { file: String, reason: String },

    #[error(transparent)]
    Store(#[from] KnowledgeError),
}
