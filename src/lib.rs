//! FilingQA - Grounded Q&A over SEC filings
//!
//! A retrieval-augmented answering pipeline that refuses to make things up:
//!
//! - **Retrieve**: pull candidate passages from an external similarity index
//! - **Grade**: keep only passages relevant to the question
//! - **Rewrite**: reformulate the question when nothing relevant came back (at most 3 times)
//! - **ExplainJargon**: translate technical terms found in the kept passages
//! - **Generate**: synthesize an answer strictly from the kept passages, or
//!   return a fixed apology once the rewrite budget is spent

pub mod errors;
pub mod types;
pub mod config;

// External capabilities and their HTTP adapters
pub mod llm;
pub mod retrieval;

// The answering state machine
pub mod pipeline;

// Re-export commonly used types
pub use errors::{PipelineError, Result};
pub use pipeline::orchestrator::{Orchestrator, FALLBACK_ANSWER};
pub use types::{Document, DocumentMetadata, RunOutcome};
