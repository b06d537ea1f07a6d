//! Agent events for real-time visibility
//!
//! Emitted by the tool-calling loop and consumed by the CLI output, so the
//! user can watch tools run while a worker is busy.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

// ============================================================================
// Agent Events
// ============================================================================

/// Events emitted by an agent during execution
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// Agent is starting to process a message
    ProcessingStart {
        /// Which agent is working
        agent: String,
    },

    /// Tool execution is starting
    ToolStart {
        agent: String,
        name: String,
        arguments: serde_json::Value,
    },

    /// Tool execution completed
    ToolComplete {
        agent: String,
        name: String,
        /// Tool result (may be truncated for display)
        result: String,
        #[serde(with = "duration_millis")]
        duration: Duration,
        /// Whether the tool call failed
        is_error: bool,
    },

    /// Agent iteration (visibility into the tool-calling loop)
    Iteration {
        agent: String,
        number: usize,
        tool_calls: usize,
    },

    /// Final response ready
    ResponseComplete {
        agent: String,
        iterations: usize,
        #[serde(with = "duration_millis")]
        total_duration: Duration,
    },

    /// An error occurred
    Error { agent: String, message: String },
}

/// Serialize Duration as milliseconds
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

// ============================================================================
// Event Channel
// ============================================================================

/// Sender for agent events
pub type EventSender = mpsc::UnboundedSender<AgentEvent>;

/// Receiver for agent events
pub type EventReceiver = mpsc::UnboundedReceiver<AgentEvent>;

/// Create a new event channel
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

// ============================================================================
// Event Sender Helper
// ============================================================================

/// Longest tool result forwarded in an event
const MAX_EVENT_RESULT: usize = 500;

/// Helper for sending events tagged with the agent's name
#[derive(Clone)]
pub struct AgentEventSender {
    agent: String,
    sender: Option<EventSender>,
}

impl Default for AgentEventSender {
    fn default() -> Self {
        Self::none()
    }
}

impl AgentEventSender {
    /// Create with an actual sender
    pub fn new(agent: impl Into<String>, sender: EventSender) -> Self {
        Self {
            agent: agent.into(),
            sender: Some(sender),
        }
    }

    /// Create a no-op sender (events are discarded)
    pub fn none() -> Self {
        Self {
            agent: String::new(),
            sender: None,
        }
    }

    /// Check if events will be sent
    pub fn is_active(&self) -> bool {
        self.sender.is_some()
    }

    /// Send an event (silently dropped if no sender or receiver dropped)
    fn send(&self, event: AgentEvent) {
        if let Some(ref sender) = self.sender {
            let _ = sender.send(event);
        }
    }

    pub fn processing_start(&self) {
        self.send(AgentEvent::ProcessingStart {
            agent: self.agent.clone(),
        });
    }

    pub fn tool_start(&self, name: &str, arguments: &serde_json::Value) {
        self.send(AgentEvent::ToolStart {
            agent: self.agent.clone(),
            name: name.to_string(),
            arguments: arguments.clone(),
        });
    }

    pub fn tool_complete(&self, name: &str, result: &str, duration: Duration, is_error: bool) {
        self.send(AgentEvent::ToolComplete {
            agent: self.agent.clone(),
            name: name.to_string(),
            result: truncate(result, MAX_EVENT_RESULT),
            duration,
            is_error,
        });
    }

    pub fn iteration(&self, number: usize, tool_calls: usize) {
        self.send(AgentEvent::Iteration {
            agent: self.agent.clone(),
            number,
            tool_calls,
        });
    }

    pub fn response_complete(&self, iterations: usize, total_duration: Duration) {
        self.send(AgentEvent::ResponseComplete {
            agent: self.agent.clone(),
            iterations,
            total_duration,
        });
    }

    pub fn error(&self, message: &str) {
        self.send(AgentEvent::Error {
            agent: self.agent.clone(),
            message: message.to_string(),
        });
    }
}

/// Cut a string to at most `max` bytes on a char boundary, marking the cut
pub(crate) fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

// ============================================================================
// Tests
// ============================================================================
