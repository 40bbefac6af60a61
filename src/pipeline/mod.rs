//! The answering state machine
//!
//! An explicit, bounded finite-state machine:
//!
//! ```text
//! Retrieve -> Grade -> ExplainJargon -> Generate -> Terminal
//!                \-> Rewrite -> Retrieve        (while loop_count < 3)
//!                \-> Generate                   (budget spent, fallback)
//! ```
//!
//! Each stage's work is an async call against one of the two external
//! capabilities; the driver applies the resulting state patch, emits a
//! progress event, and consults the pure transition function for the
//! next stage.

pub mod events;
pub mod jargon;
pub mod orchestrator;
pub mod prompts;
pub mod state;

pub use events::{ProgressBus, StageEvent};
pub use orchestrator::{Orchestrator, FALLBACK_ANSWER};
pub use state::{next_stage, PipelineState, Stage, StagePatch, MAX_REWRITES};
