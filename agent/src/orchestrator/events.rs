//! Step events emitted by the team engine
//!
//! One event per completed worker invocation; the session renders them as
//! the run progresses.

use serde::Serialize;
use tokio::sync::mpsc;

use super::state::{LogEntry, Next, Stage, TaskState};

/// Snapshot after a completed step
#[derive(Debug, Clone, Serialize)]
pub struct StepEvent {
    /// 1-based invocation number within the run
    pub step: usize,
    pub stage: Stage,
    pub next: Next,
    pub log_entry: LogEntry,
    pub state: TaskState,
}

/// Sender for step events
pub type StepSender = mpsc::UnboundedSender<StepEvent>;

/// Receiver for step events
pub type StepReceiver = mpsc::UnboundedReceiver<StepEvent>;

/// Create a new step event channel
pub fn step_channel() -> (StepSender, StepReceiver) {
    mpsc::unbounded_channel()
}
