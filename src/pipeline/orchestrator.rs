//! Pipeline orchestrator - drives the answering state machine
//!
//! Owns the two external capabilities and executes one stage at a time:
//! call out, build the patch, emit the progress event, apply, transition.
//! Stages with no safe fallback (retrieve, rewrite, generate) abort the
//! run; per-passage grading failures and jargon failures degrade locally.

use crate::errors::{PipelineError, Result};
use crate::llm::LanguageModel;
use crate::pipeline::events::{ProgressBus, StageEvent};
use crate::pipeline::jargon;
use crate::pipeline::prompts;
use crate::pipeline::state::{next_stage, PipelineState, Stage, StagePatch, MAX_REWRITES};
use crate::retrieval::Retriever;
use crate::types::{Document, RunOutcome};
use futures_util::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Fixed answer for the loop-exhaustion path; produced without a model call
pub const FALLBACK_ANSWER: &str = "I'm sorry, I couldn't find enough relevant information in \
     the SEC filings to answer your question accurately.";

/// Drives one question through the retrieve/grade/rewrite/generate loop
pub struct Orchestrator {
    retriever: Arc<dyn Retriever>,
    model: Arc<dyn LanguageModel>,
    events: ProgressBus,
}

impl Orchestrator {
    /// Create an orchestrator and the receiving end of its progress stream
    pub fn new(
        retriever: Arc<dyn Retriever>,
        model: Arc<dyn LanguageModel>,
    ) -> (Self, mpsc::Receiver<StageEvent>) {
        let (events, receiver) = ProgressBus::new();
        (
            Self {
                retriever,
                model,
                events,
            },
            receiver,
        )
    }

    /// Answer one question
    ///
    /// State is created here, threaded through the stages, and dropped when
    /// the outcome is assembled; nothing survives across runs. The caller
    /// is responsible for wrapping the whole call in a timeout if it needs
    /// one.
    pub async fn run(&self, question: &str) -> Result<RunOutcome> {
        let mut state = PipelineState::new(question);
        let mut stage = Stage::Retrieve;

        while !stage.is_terminal() {
            let patch = self.execute(stage, &state).await?;

            self.events.emit(StageEvent {
                stage,
                patch: patch.clone(),
            });

            state.apply(patch);
            stage = next_stage(stage, &state);
        }

        // Generate is only reachable with an empty document list on the
        // exhaustion path, so emptiness doubles as the outcome marker.
        let exhausted = state.documents.is_empty();

        Ok(RunOutcome {
            generation: state.generation,
            jargon: state.jargon,
            documents_used: state.documents.len(),
            loop_count: state.loop_count,
            exhausted,
        })
    }

    /// Run the work for one stage and produce its patch
    async fn execute(&self, stage: Stage, state: &PipelineState) -> Result<StagePatch> {
        match stage {
            Stage::Retrieve => self.retrieve(state).await,
            Stage::Grade => Ok(self.grade(state).await),
            Stage::Rewrite => self.rewrite(state).await,
            Stage::ExplainJargon => Ok(self.explain_jargon(state).await),
            Stage::Generate => self.generate(state).await,
            Stage::Terminal => unreachable!("terminal stage has no work"),
        }
    }

    /// Fetch a fresh candidate set for the current question
    ///
    /// Index unavailability has no local fallback: the run aborts.
    async fn retrieve(&self, state: &PipelineState) -> Result<StagePatch> {
        info!(question = %state.question, "retrieving passages");

        let documents = self
            .retriever
            .fetch(&state.question)
            .await
            .map_err(|e| match e {
                PipelineError::Retrieval(_) => e,
                other => PipelineError::Retrieval(other.to_string()),
            })?;

        info!(count = documents.len(), "retrieval complete");
        Ok(StagePatch::Retrieved { documents })
    }

    /// Classify every candidate independently; keep the relevant ones in
    /// retrieval order
    ///
    /// The per-passage checks run concurrently, but the ordered join means
    /// concurrency can never reorder the filtered list. A failed check
    /// drops only that passage.
    async fn grade(&self, state: &PipelineState) -> StagePatch {
        info!(candidates = state.documents.len(), "grading passage relevance");

        let checks = state.documents.iter().map(|doc| {
            let question = state.question.as_str();
            async move {
                match self.model.classify(question, &doc.content).await {
                    Ok(relevant) => relevant,
                    Err(e) => {
                        warn!(
                            source = %doc.metadata.source,
                            error = %e,
                            "relevance check failed; dropping passage"
                        );
                        false
                    }
                }
            }
        });

        let verdicts = join_all(checks).await;

        let documents: Vec<Document> = state
            .documents
            .iter()
            .zip(verdicts)
            .filter(|(_, relevant)| *relevant)
            .map(|(doc, _)| doc.clone())
            .collect();

        info!(kept = documents.len(), "grading complete");
        StagePatch::Graded { documents }
    }

    /// Reformulate the question for better retrieval
    ///
    /// Only entered when grading kept nothing and budget remains. There is
    /// no fallback question, so a failed completion aborts the run.
    async fn rewrite(&self, state: &PipelineState) -> Result<StagePatch> {
        info!(
            attempt = state.loop_count + 1,
            max = MAX_REWRITES,
            "no relevant passages; rewriting query"
        );

        let prompt = prompts::rewrite_question(&state.question);
        let reply = self
            .model
            .complete(&prompt)
            .await
            .map_err(|e| PipelineError::Rewrite(e.to_string()))?;

        let question = reply.trim().to_string();
        info!(rewritten = %question, "query rewritten");
        Ok(StagePatch::Rewritten { question })
    }

    /// Extract technical terms from the kept passages
    ///
    /// Both a failed model call and an unparseable reply degrade to an
    /// empty glossary; this stage cannot block answer synthesis.
    async fn explain_jargon(&self, state: &PipelineState) -> StagePatch {
        let context =
            prompts::assemble_context(state.documents.iter().map(|d| d.content.as_str()));
        let prompt = prompts::explain_jargon(&context);

        let jargon = match self.model.complete(&prompt).await {
            Ok(reply) => jargon::parse_jargon_reply(&reply),
            Err(e) => {
                warn!(error = %e, "jargon extraction failed; continuing without glossary");
                BTreeMap::new()
            }
        };

        info!(terms = jargon.len(), "jargon extraction complete");
        StagePatch::JargonExplained { jargon }
    }

    /// Synthesize the final answer, or return the fixed fallback once the
    /// rewrite budget is spent
    async fn generate(&self, state: &PipelineState) -> Result<StagePatch> {
        if state.documents.is_empty() && state.loop_count >= MAX_REWRITES {
            warn!("rewrite budget spent without relevant passages; returning fallback answer");
            return Ok(StagePatch::Generated {
                generation: FALLBACK_ANSWER.to_string(),
            });
        }

        info!(passages = state.documents.len(), "synthesizing grounded answer");

        let context =
            prompts::assemble_context(state.documents.iter().map(|d| d.content.as_str()));
        let prompt = prompts::grounded_answer(&state.question, &context, &state.jargon);

        let generation = self
            .model
            .complete(&prompt)
            .await
            .map_err(|e| PipelineError::Generation(e.to_string()))?;

        Ok(StagePatch::Generated { generation })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DocumentMetadata;
    use async_trait::async_trait;

    struct FixedRetriever {
        documents: Vec<Document>,
    }

    #[async_trait]
    impl Retriever for FixedRetriever {
        async fn fetch(&self, _query: &str) -> Result<Vec<Document>> {
            Ok(self.documents.clone())
        }
    }

    /// Marks passages relevant when they contain "revenue"; echoes a fixed
    /// completion
    struct KeywordModel;

    #[async_trait]
    impl LanguageModel for KeywordModel {
        async fn classify(&self, _question: &str, passage: &str) -> Result<bool> {
            Ok(passage.contains("revenue"))
        }

        async fn complete(&self, _prompt: &str) -> Result<String> {
            Ok("{\"Revenue\": \"Money a company takes in from sales.\"}".to_string())
        }
    }

    fn doc(content: &str) -> Document {
        Document {
            content: content.to_string(),
            metadata: DocumentMetadata {
                ticker: "AAPL".to_string(),
                year: "2023".to_string(),
                quarter: "Q4".to_string(),
                form_type: "10-K".to_string(),
                section: None,
                source: "AAPL_2023_Q4_10-K.txt".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_happy_path_grounds_on_relevant_passages() {
        let retriever = Arc::new(FixedRetriever {
            documents: vec![doc("revenue grew"), doc("weather report"), doc("revenue fell")],
        });
        let (orchestrator, _events) = Orchestrator::new(retriever, Arc::new(KeywordModel));

        let outcome = orchestrator.run("how did revenue do").await.unwrap();

        assert_eq!(outcome.documents_used, 2);
        assert_eq!(outcome.loop_count, 0);
        assert!(!outcome.exhausted);
        assert_eq!(outcome.jargon["Revenue"], "Money a company takes in from sales.");
    }

    #[test]
    fn test_fallback_answer_mentions_the_filings() {
        assert!(FALLBACK_ANSWER.contains("SEC filings"));
        assert!(FALLBACK_ANSWER.contains("couldn't find"));
    }
}
