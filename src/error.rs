//! Typed errors shared by the selector, the service adapters and the pipelines.

use thiserror::Error;

/// Contract violations raised by the MMR selector.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SelectError {
    /// Empty candidate pool, misaligned labels or malformed embeddings.
    #[error("invalid selector input: {0}")]
    InvalidInput(String),
}

/// Failure reported by an external collaborator (embedding, sense lookup,
/// keyword extraction, tokenizer or generation service).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    #[error("{service} service unavailable: {message}")]
    Unavailable {
        service: &'static str,
        message: String,
    },
}

impl ServiceError {
    pub fn unavailable(service: &'static str, message: impl ToString) -> Self {
        Self::Unavailable {
            service,
            message: message.to_string(),
        }
    }

    /// Name of the collaborator that failed.
    pub fn service(&self) -> &'static str {
        match self {
            Self::Unavailable { service, .. } => service,
        }
    }
}

/// Hard failures of the summarization pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SummarizeError {
    /// Generation service unreachable or model artefacts missing.
    #[error("summarization model unavailable: {0}")]
    ModelUnavailable(String),
    /// Request parameters rejected before any service call.
    #[error("invalid summarization request: {0}")]
    InvalidRequest(String),
}

impl From<ServiceError> for SummarizeError {
    fn from(err: ServiceError) -> Self {
        Self::ModelUnavailable(err.to_string())
    }
}
