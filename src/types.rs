//! Core data model: indexed passages and run results

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A passage retrieved from the filings index
///
/// Immutable once produced by the retriever; the pipeline only ever
/// replaces whole document lists, never mutates individual passages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Passage text
    pub content: String,

    /// Filing provenance
    pub metadata: DocumentMetadata,
}

/// Provenance of a passage, parsed at ingest time from the
/// `{ticker}_{year}_{quarter}_{form_type}` filing naming convention
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub ticker: String,
    pub year: String,
    pub quarter: String,
    pub form_type: String,

    /// Filing section, when the chunker could attribute one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,

    /// Source file or URL the passage came from
    pub source: String,
}

/// Result of one completed answering run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutcome {
    /// The synthesized answer, or the fixed apology when `exhausted`
    pub generation: String,

    /// Technical terms found in the context, each with a one-sentence
    /// plain-English definition
    pub jargon: BTreeMap<String, String>,

    /// Number of passages the answer was grounded on
    pub documents_used: usize,

    /// How many times the question was rewritten (0..=3)
    pub loop_count: u32,

    /// True when the rewrite budget ran out without any relevant passage;
    /// distinguishes the apology answer from real failures (which are `Err`)
    pub exhausted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_from_sidecar_json() {
        // Shape returned by the retrieval sidecar; section is optional
        let json = r#"{
            "content": "Revenue grew 12% year over year.",
            "metadata": {
                "ticker": "AAPL",
                "year": "2023",
                "quarter": "Q4",
                "form_type": "10-K",
                "source": "data/AAPL_2023_Q4_10-K.txt"
            }
        }"#;

        let doc: Document = serde_json::from_str(json).unwrap();
        assert_eq!(doc.metadata.ticker, "AAPL");
        assert_eq!(doc.metadata.form_type, "10-K");
        assert!(doc.metadata.section.is_none());
    }

    #[test]
    fn test_outcome_serializes_jargon_as_map() {
        let mut jargon = BTreeMap::new();
        jargon.insert("EBITDA".to_string(), "Profit before some costs.".to_string());

        let outcome = RunOutcome {
            generation: "answer".to_string(),
            jargon,
            documents_used: 2,
            loop_count: 0,
            exhausted: false,
        };

        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["jargon"]["EBITDA"], "Profit before some costs.");
        assert_eq!(value["documents_used"], 2);
    }
}
