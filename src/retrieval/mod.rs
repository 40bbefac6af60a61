//! Retrieval capability
//!
//! The index itself (chunking, embedding, persistence) lives behind an
//! external service; the pipeline only sees an ordered list of passages
//! for a query string.

mod http;

pub use http::HttpRetriever;

use crate::errors::Result;
use crate::types::Document;
use async_trait::async_trait;

/// Number of passages fetched per query
pub const TOP_K: usize = 4;

/// Similarity search seam to the filings index
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Fetch the top passages for a query, best match first
    async fn fetch(&self, query: &str) -> Result<Vec<Document>>;
}
