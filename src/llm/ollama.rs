//! Ollama adapter for the language model capability
//!
//! Non-streaming requests against POST /api/generate. Relevance judgments
//! use Ollama's JSON mode and deserialize into a fixed verdict shape;
//! free-text completions return the response body verbatim.

use crate::errors::{PipelineError, Result};
use crate::llm::LanguageModel;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default Ollama API endpoint
pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// Default model
pub const DEFAULT_MODEL: &str = "qwen2.5:7b-instruct";

/// Request timeout; synthesis over four passages can take a while on CPU
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Sampling temperature for relevance verdicts
const CLASSIFY_TEMPERATURE: f64 = 0.0;

/// Sampling temperature for free-text completions
const COMPLETE_TEMPERATURE: f64 = 0.2;

/// Ollama-backed language model
#[derive(Debug, Clone)]
pub struct OllamaModel {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaModel {
    /// Create a new client with default settings
    pub fn new() -> Result<Self> {
        Self::with_config(DEFAULT_OLLAMA_URL, DEFAULT_MODEL)
    }

    /// Create a client with custom endpoint and model tag
    pub fn with_config(base_url: &str, model: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(PipelineError::Http)?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            model: model.to_string(),
        })
    }

    /// Check if Ollama is reachable
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/api/version", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    /// Get current model tag
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Get base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(PipelineError::Http)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(PipelineError::InvalidResponse(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let reply: GenerateResponse = response.json().await.map_err(PipelineError::Http)?;

        Ok(reply.response)
    }
}

#[async_trait]
impl LanguageModel for OllamaModel {
    async fn classify(&self, question: &str, passage: &str) -> Result<bool> {
        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: grading_prompt(question, passage),
            stream: false,
            format: Some("json".to_string()),
            options: GenerateOptions {
                temperature: CLASSIFY_TEMPERATURE,
            },
        };

        let raw = self.generate(&request).await?;

        let verdict: GradeVerdict = serde_json::from_str(raw.trim()).map_err(|e| {
            PipelineError::InvalidResponse(format!("bad relevance verdict {:?}: {}", raw, e))
        })?;

        Ok(verdict.is_relevant)
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            format: None,
            options: GenerateOptions {
                temperature: COMPLETE_TEMPERATURE,
            },
        };

        self.generate(&request).await
    }
}

/// Prompt packaging for the structured relevance call
///
/// Deliberately lenient: the goal is to filter out entirely unrelated
/// retrievals, not to run a stringent test.
fn grading_prompt(question: &str, passage: &str) -> String {
    format!(
        "You are a grader assessing the relevance of a retrieved document to a user question. \
         If the document contains keywords or semantic meaning related to the question, grade it \
         as relevant. It does not need to be a stringent test; the goal is to filter out entirely \
         unrelated retrievals.\n\n\
         Retrieved document:\n\n{passage}\n\n\
         User question: {question}\n\n\
         Reply with a JSON object: {{\"is_relevant\": true}} or {{\"is_relevant\": false}}."
    )
}

/// Ollama generate request
#[derive(Debug, Clone, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<String>,
    options: GenerateOptions,
}

#[derive(Debug, Clone, Serialize)]
struct GenerateOptions {
    temperature: f64,
}

/// Ollama generate response (non-streaming)
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Structured relevance verdict
#[derive(Debug, Deserialize)]
struct GradeVerdict {
    is_relevant: bool,
}
