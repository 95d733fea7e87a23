//! Error types for the ZoneWatch domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all ZoneWatch operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors (LLM, embeddings, reranking) ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Index build / query errors ---
    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Agent reasoning errors ---
    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),

    // --- Speech errors ---
    #[error("Speech error: {0}")]
    Speech(#[from] SpeechError),

    // --- Single-shot flow errors ---
    #[error("Flow error: {0}")]
    Flow(#[from] FlowError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

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

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Zone document '{0}' is empty")]
    EmptyDocument(String),

    #[error("Invalid zone id '{0}'")]
    InvalidZoneId(String),

    #[error("Rejected upload '{name}': {reason}")]
    InvalidUpload { name: String, reason: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Embedding generation failed: {0}")]
    EmbeddingFailed(String),

    #[error("Summarization failed for zone '{zone_id}': {reason}")]
    SummarizationFailed { zone_id: String, reason: String },

    #[error("Corrupted index at {path}: {reason}")]
    Corrupted { path: String, reason: String },
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Tool timed out: {tool_name} after {timeout_secs}s")]
    Timeout { tool_name: String, timeout_secs: u64 },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("{agent} reached no answer within {limit} iterations")]
    MaxIterations { agent: String, limit: u32 },

    #[error("Services are not initialized")]
    NotInitialized,
}

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("Speech service not configured: {0}")]
    NotConfigured(String),

    #[error("Speech API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Audio device error: {0}")]
    Audio(String),

    #[error("Audio I/O is unavailable: rebuild with the `audio` feature")]
    AudioUnavailable,

    #[error("Speech file error: {0}")]
    Io(String),
}

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("Invalid flow input: {0}")]
    InvalidInput(String),

    #[error("Model output could not be used: {0}")]
    InvalidOutput(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn max_iterations_names_agent_and_limit() {
        let err = Error::Agent(AgentError::MaxIterations {
            agent: "dispatch".into(),
            limit: 10,
        });
        let text = err.to_string();
        assert!(text.contains("dispatch"));
        assert!(text.contains("10"));
    }

    #[test]
    fn index_error_converts_into_top_level() {
        let err: Error = IndexError::EmptyDocument("north".into()).into();
        assert!(matches!(err, Error::Index(IndexError::EmptyDocument(_))));
        assert!(err.to_string().contains("north"));
    }
}
