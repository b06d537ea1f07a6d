//! Output abstraction for the CLI
//!
//! Agent and step events are converted to [`OutputEvent`]s and rendered by
//! an [`OutputWriter`]: colored for terminals, plain for pipes and CI.

use std::time::Duration;

use chrono::{DateTime, Local};

mod plain;
mod terminal;

pub use plain::PlainOutput;
pub use terminal::TerminalOutput;

use crate::agent::AgentEvent;
use crate::orchestrator::{Next, Stage, StepEvent};

// ============================================================================
// Output Events
// ============================================================================

/// Events that can be displayed to the user
#[derive(Debug, Clone)]
pub enum OutputEvent {
    /// Answer or other content
    Text(String),

    /// Tool execution started
    ToolStart {
        agent: String,
        name: String,
        arguments: serde_json::Value,
    },

    /// Tool execution completed
    ToolComplete {
        agent: String,
        name: String,
        result: String,
        duration: Duration,
        is_error: bool,
    },

    /// A team worker finished
    Step {
        step: usize,
        stage: Stage,
        next: Next,
        log_entry: String,
        at: DateTime<Local>,
    },

    /// A team run reached a terminal state
    Outcome { done: bool, summary: String },

    /// Status message (informational)
    Status(String),

    /// Error message
    Error(String),

    /// Warning message
    Warning(String),

    /// New line / separator
    NewLine,
}

impl OutputEvent {
    /// Displayable form of an agent event; progress chatter is dropped
    pub fn from_agent_event(event: AgentEvent) -> Option<Self> {
        match event {
            AgentEvent::ToolStart {
                agent,
                name,
                arguments,
            } => Some(OutputEvent::ToolStart {
                agent,
                name,
                arguments,
            }),
            AgentEvent::ToolComplete {
                agent,
                name,
                result,
                duration,
                is_error,
            } => Some(OutputEvent::ToolComplete {
                agent,
                name,
                result,
                duration,
                is_error,
            }),
            AgentEvent::Error { agent, message } => {
                Some(OutputEvent::Warning(format!("{}: {}", agent, message)))
            }
            AgentEvent::ProcessingStart { .. }
            | AgentEvent::Iteration { .. }
            | AgentEvent::ResponseComplete { .. } => None,
        }
    }
}

impl From<&StepEvent> for OutputEvent {
    fn from(event: &StepEvent) -> Self {
        OutputEvent::Step {
            step: event.step,
            stage: event.stage,
            next: event.next,
            log_entry: event.log_entry.message.clone(),
            at: event.log_entry.at.with_timezone(&Local),
        }
    }
}

// ============================================================================
// Output Writer Trait
// ============================================================================

/// Trait for writing output events
pub trait OutputWriter: Send + Sync {
    /// Write an output event
    fn write(&self, event: OutputEvent);

    /// Flush any buffered output
    fn flush(&self);

    /// Whether this writer supports colors/formatting
    fn supports_colors(&self) -> bool {
        false
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Create an output writer based on environment
pub fn default_output(verbose: bool) -> Box<dyn OutputWriter> {
    if atty::is(atty::Stream::Stdout) {
        Box::new(TerminalOutput::new().with_verbose(verbose))
    } else {
        Box::new(PlainOutput::new().with_verbose(verbose))
    }
}

/// Format tool arguments for display
fn format_args(args: &serde_json::Value) -> String {
    match args {
        serde_json::Value::Object(map) if map.is_empty() => String::new(),
        serde_json::Value::Null => String::new(),
        _ => {
            let json = serde_json::to_string(args).unwrap_or_default();
            crate::agent::events::truncate(&json, 77)
        }
    }
}

/// First line of a log entry, shortened unless verbose
fn log_preview(entry: &str, verbose: bool) -> String {
    if verbose {
        return entry.to_string();
    }
    let first_line = entry.lines().next().unwrap_or_default();
    let preview = crate::agent::events::truncate(first_line, 160);
    if preview.len() < entry.len() && !preview.ends_with("...") {
        format!("{}...", preview)
    } else {
        preview
    }
}

// ============================================================================
// Tests
// ============================================================================
