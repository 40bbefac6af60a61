//! Error types for the answering pipeline
//!
//! Failures with no safe local fallback (retrieval, rewrite, generation)
//! abort the run and carry their stage in the variant. Per-passage
//! classification failures and jargon parsing failures are recovered
//! locally by the pipeline and never surface here.

use thiserror::Error;

/// Main error type for the answering pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The similarity index could not serve the query
    #[error("retrieval failed: {0}")]
    Retrieval(String),

    /// The query reformulation call failed (no fallback question exists)
    #[error("query rewrite failed: {0}")]
    Rewrite(String),

    /// The final synthesis call failed (no partial answer is produced)
    #[error("answer synthesis failed: {0}")]
    Generation(String),

    /// HTTP transport errors from the capability adapters
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A capability returned a payload the adapter could not interpret
    #[error("unexpected model response: {0}")]
    InvalidResponse(String),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    /// Stage identifier for fatal pipeline failures, for caller-side display
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::Retrieval(_) => "retrieve",
            PipelineError::Rewrite(_) => "rewrite",
            PipelineError::Generation(_) => "generate",
            _ => "transport",
        }
    }
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PipelineError::Retrieval("index unavailable".to_string());
        assert!(err.to_string().contains("retrieval failed"));
        assert!(err.to_string().contains("index unavailable"));
    }

    #[test]
    fn test_stage_identifiers() {
        assert_eq!(PipelineError::Retrieval(String::new()).stage(), "retrieve");
        assert_eq!(PipelineError::Rewrite(String::new()).stage(), "rewrite");
        assert_eq!(PipelineError::Generation(String::new()).stage(), "generate");
        assert_eq!(
            PipelineError::InvalidResponse(String::new()).stage(),
            "transport"
        );
    }
}
