//! Pipeline state machine
//!
//! State threading is explicit: every stage produces a `StagePatch`, the
//! driver applies it, and `next_stage` picks the successor from the patched
//! state alone. No stage ever mutates state directly, which keeps the
//! branching decision a pure function and the whole loop provably bounded.

use crate::types::Document;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maximum number of query rewrites before forcing the fallback answer
pub const MAX_REWRITES: u32 = 3;

/// Pipeline stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Fetch candidate passages for the current question
    Retrieve,

    /// Filter candidates down to relevant passages
    Grade,

    /// Reformulate the question for better retrieval
    Rewrite,

    /// Extract technical terms from the kept passages
    ExplainJargon,

    /// Synthesize the final answer (terminal work)
    Generate,

    /// Run complete; no further events are produced
    Terminal,
}

impl Stage {
    /// Check if this is the terminal stage
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Terminal)
    }

    /// Human-readable stage name
    pub fn display_name(&self) -> &'static str {
        match self {
            Stage::Retrieve => "Retrieving passages",
            Stage::Grade => "Grading relevance",
            Stage::Rewrite => "Rewriting query",
            Stage::ExplainJargon => "Explaining jargon",
            Stage::Generate => "Synthesizing answer",
            Stage::Terminal => "Done",
        }
    }
}

/// State owned by one in-flight run; discarded when the run completes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineState {
    /// Current question (replaced by each rewrite)
    pub question: String,

    /// Current working set of passages, fully replaced on every
    /// retrieve and grade step
    pub documents: Vec<Document>,

    /// Final answer; empty until the generate stage runs
    pub generation: String,

    /// Term -> one-sentence definition, populated at most once per run
    pub jargon: BTreeMap<String, String>,

    /// Number of rewrites performed so far
    pub loop_count: u32,
}

impl PipelineState {
    /// Fresh state for a new question
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            documents: Vec::new(),
            generation: String::new(),
            jargon: BTreeMap::new(),
            loop_count: 0,
        }
    }

    /// Apply a stage's resulting patch
    pub fn apply(&mut self, patch: StagePatch) {
        match patch {
            StagePatch::Retrieved { documents } => {
                self.documents = documents;
            }
            StagePatch::Graded { documents } => {
                self.documents = documents;
            }
            StagePatch::Rewritten { question } => {
                self.question = question;
                self.loop_count += 1;
            }
            StagePatch::JargonExplained { jargon } => {
                self.jargon = jargon;
            }
            StagePatch::Generated { generation } => {
                self.generation = generation;
            }
        }
    }
}

/// The partial state update a stage produces
///
/// Only the rewrite patch touches the loop counter, and it always
/// increments by exactly one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StagePatch {
    /// New candidate set from the index, in similarity order
    Retrieved { documents: Vec<Document> },

    /// Relevant subsequence of the candidates, original order preserved
    Graded { documents: Vec<Document> },

    /// Reformulated question
    Rewritten { question: String },

    /// Extracted glossary (possibly empty)
    JargonExplained { jargon: BTreeMap<String, String> },

    /// Final answer text
    Generated { generation: String },
}

/// Pure transition function: successor stage from the patched state
///
/// Evaluated after the stage's patch has been applied. The only branch
/// point is after grading:
/// - relevant passages survived -> explain jargon
/// - nothing survived, budget left -> rewrite
/// - nothing survived, budget spent -> generate (fallback path)
pub fn next_stage(stage: Stage, state: &PipelineState) -> Stage {
    match stage {
        Stage::Retrieve => Stage::Grade,
        Stage::Grade => {
            if !state.documents.is_empty() {
                Stage::ExplainJargon
            } else if state.loop_count < MAX_REWRITES {
                Stage::Rewrite
            } else {
                Stage::Generate
            }
        }
        Stage::Rewrite => Stage::Retrieve,
        Stage::ExplainJargon => Stage::Generate,
        Stage::Generate => Stage::Terminal,
        Stage::Terminal => Stage::Terminal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DocumentMetadata;

    fn doc(content: &str) -> Document {
        Document {
            content: content.to_string(),
            metadata: DocumentMetadata {
                ticker: "MSFT".to_string(),
                year: "2023".to_string(),
                quarter: "Q2".to_string(),
                form_type: "10-Q".to_string(),
                section: None,
                source: "MSFT_2023_Q2_10-Q.txt".to_string(),
            },
        }
    }

    #[test]
    fn test_retrieve_always_goes_to_grade() {
        let state = PipelineState::new("q");
        assert_eq!(next_stage(Stage::Retrieve, &state), Stage::Grade);
    }

    #[test]
    fn test_grade_with_survivors_goes_to_jargon() {
        let mut state = PipelineState::new("q");
        state.documents = vec![doc("relevant passage")];
        assert_eq!(next_stage(Stage::Grade, &state), Stage::ExplainJargon);
    }

    #[test]
    fn test_grade_empty_with_budget_goes_to_rewrite() {
        let mut state = PipelineState::new("q");
        for count in 0..MAX_REWRITES {
            state.loop_count = count;
            assert_eq!(next_stage(Stage::Grade, &state), Stage::Rewrite);
        }
    }

    #[test]
    fn test_grade_empty_without_budget_goes_to_generate() {
        let mut state = PipelineState::new("q");
        state.loop_count = MAX_REWRITES;
        assert_eq!(next_stage(Stage::Grade, &state), Stage::Generate);
    }

    #[test]
    fn test_linear_tail_of_the_machine() {
        let state = PipelineState::new("q");
        assert_eq!(next_stage(Stage::Rewrite, &state), Stage::Retrieve);
        assert_eq!(next_stage(Stage::ExplainJargon, &state), Stage::Generate);
        assert_eq!(next_stage(Stage::Generate, &state), Stage::Terminal);
        assert_eq!(next_stage(Stage::Terminal, &state), Stage::Terminal);
    }

    #[test]
    fn test_terminal_detection() {
        assert!(Stage::Terminal.is_terminal());
        assert!(!Stage::Generate.is_terminal());
    }

    #[test]
    fn test_retrieve_patch_replaces_documents() {
        let mut state = PipelineState::new("q");
        state.documents = vec![doc("stale")];

        state.apply(StagePatch::Retrieved {
            documents: vec![doc("fresh a"), doc("fresh b")],
        });

        assert_eq!(state.documents.len(), 2);
        assert_eq!(state.documents[0].content, "fresh a");
    }

    #[test]
    fn test_rewrite_patch_increments_loop_count_by_one() {
        let mut state = PipelineState::new("original");

        state.apply(StagePatch::Rewritten {
            question: "better question".to_string(),
        });

        assert_eq!(state.question, "better question");
        assert_eq!(state.loop_count, 1);

        state.apply(StagePatch::Rewritten {
            question: "even better".to_string(),
        });
        assert_eq!(state.loop_count, 2);
    }

    #[test]
    fn test_generation_empty_until_generated() {
        let mut state = PipelineState::new("q");
        assert!(state.generation.is_empty());

        state.apply(StagePatch::Generated {
            generation: "the answer".to_string(),
        });
        assert_eq!(state.generation, "the answer");
    }

    #[test]
    fn test_bounded_walk_terminates() {
        // Worst case walk: every grade comes back empty
        let mut state = PipelineState::new("q");
        let mut stage = Stage::Retrieve;
        let mut steps = 0;

        while !stage.is_terminal() {
            if stage == Stage::Rewrite {
                state.apply(StagePatch::Rewritten {
                    question: "again".to_string(),
                });
            }
            stage = next_stage(stage, &state);
            steps += 1;
            assert!(steps < 32, "state machine failed to terminate");
        }

        assert_eq!(state.loop_count, MAX_REWRITES);
    }
}
