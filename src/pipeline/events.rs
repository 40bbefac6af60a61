//! Progress events for run observation
//!
//! The orchestrator emits one event per completed stage so a front end can
//! render the run incrementally. This is an observation channel, not a
//! scheduling mechanism: the run never blocks on a slow consumer, and no
//! events are produced after the terminal stage.

use crate::pipeline::state::{Stage, StagePatch};
use tokio::sync::mpsc;

/// Channel capacity; one run emits at most a dozen events
const CHANNEL_CAPACITY: usize = 64;

/// One completed stage and the state patch it produced
#[derive(Debug, Clone)]
pub struct StageEvent {
    pub stage: Stage,
    pub patch: StagePatch,
}

/// Sender half for stage events
pub struct ProgressBus {
    sender: mpsc::Sender<StageEvent>,
}

impl ProgressBus {
    /// Create a bus with its receiving end
    pub fn new() -> (Self, mpsc::Receiver<StageEvent>) {
        let (sender, receiver) = mpsc::channel(CHANNEL_CAPACITY);
        (ProgressBus { sender }, receiver)
    }

    /// Emit an event without blocking the run
    ///
    /// If the consumer has fallen behind the bounded channel, the event is
    /// dropped rather than stalling the pipeline.
    pub fn emit(&self, event: StageEvent) {
        let _ = self.sender.try_send(event);
    }
}

impl Clone for ProgressBus {
    fn clone(&self) -> Self {
        ProgressBus {
            sender: self.sender.clone(),
        }
    }
}
