//! HTTP adapter for a retrieval sidecar
//!
//! Speaks a minimal wire protocol: POST /retrieve with the query and a
//! fixed top-k, returning passages in similarity order.

use crate::errors::{PipelineError, Result};
use crate::retrieval::{Retriever, TOP_K};
use crate::types::Document;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Retrieval sidecar client
#[derive(Debug, Clone)]
pub struct HttpRetriever {
    client: Client,
    base_url: String,
}

impl HttpRetriever {
    /// Create a new client for the given sidecar base URL
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(PipelineError::Http)?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    /// Get base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Retriever for HttpRetriever {
    async fn fetch(&self, query: &str) -> Result<Vec<Document>> {
        let url = format!("{}/retrieve", self.base_url);

        let request = RetrieveRequest {
            query: query.to_string(),
            top_k: TOP_K,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(PipelineError::Http)?;

        if !response.status().is_success() {
            return Err(PipelineError::Retrieval(format!(
                "sidecar returned HTTP {}",
                response.status()
            )));
        }

        let body: RetrieveResponse = response.json().await.map_err(PipelineError::Http)?;

        Ok(body.documents)
    }
}

#[derive(Debug, Serialize)]
struct RetrieveRequest {
    query: String,
    top_k: usize,
}

#[derive(Debug, Deserialize)]
struct RetrieveResponse {
    documents: Vec<Document>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let request = RetrieveRequest {
            query: "apple risk factors".to_string(),
            top_k: TOP_K,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["query"], "apple risk factors");
        assert_eq!(value["top_k"], 4);
    }

    #[test]
    fn test_response_parsing_preserves_order() {
        let json = r#"{
            "documents": [
                {"content": "first", "metadata": {"ticker": "AAPL", "year": "2023", "quarter": "Q4", "form_type": "10-K", "source": "a.txt"}},
                {"content": "second", "metadata": {"ticker": "AAPL", "year": "2023", "quarter": "Q4", "form_type": "10-K", "source": "a.txt"}}
            ]
        }"#;

        let body: RetrieveResponse = serde_json::from_str(json).unwrap();
        assert_eq!(body.documents.len(), 2);
        assert_eq!(body.documents[0].content, "first");
        assert_eq!(body.documents[1].content, "second");
    }
}
