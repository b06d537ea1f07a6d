//! Task router
//!
//! One classification call decides whether a task goes to the single direct
//! agent or to the collaborative team. Anything other than a clean label,
//! including a failed call, falls back to [`Route::Direct`].

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::agent::events::truncate;
use crate::llm::{CompletionRequest, Llm, Message, Role};

/// History messages shown to the classifier
const HISTORY_WINDOW: usize = 10;

/// Longest history message shown to the classifier
const HISTORY_MESSAGE_CHARS: usize = 500;

pub const ROUTER_PROMPT: &str = r#"You are the task router of a software development assistant. Classify the user's latest request.

- Answer `direct` when one developer can handle it in a single pass: questions, explanations, small edits, running a command, looking something up in the codebase.
- Answer `collaborative` when it needs a planned, multi-step build: a new program or feature that should be designed, implemented, tested and reviewed.

Respond with exactly one word: direct or collaborative."#;

/// Execution path for a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    Direct,
    Collaborative,
}

impl Route {
    pub fn as_str(self) -> &'static str {
        match self {
            Route::Direct => "direct",
            Route::Collaborative => "collaborative",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a classifier answer; surrounding quotes, markdown and punctuation are ignored
pub fn parse_route(label: &str) -> Option<Route> {
    let cleaned = label
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, '"' | '\'' | '`' | '*' | '.' | '!'))
        .to_lowercase();
    match cleaned.as_str() {
        "direct" => Some(Route::Direct),
        "collaborative" => Some(Route::Collaborative),
        _ => None,
    }
}

/// Single-shot task classifier
#[derive(Clone)]
pub struct Router {
    llm: Arc<dyn Llm>,
}

impl Router {
    pub fn new(llm: Arc<dyn Llm>) -> Self {
        Self { llm }
    }

    /// Classify `task`; never fails
    pub async fn route(&self, task: &str, history: &[Message]) -> Route {
        if task.trim().is_empty() {
            return Route::Direct;
        }

        let request = CompletionRequest {
            system: ROUTER_PROMPT.to_string(),
            messages: vec![Message::user(classification_message(task, history))],
            tools: Vec::new(),
        };

        let label = match self.llm.complete(&request).await {
            Ok(completion) => completion.text,
            Err(e) => {
                tracing::warn!(error = %e, "Routing call failed, defaulting to direct");
                return Route::Direct;
            }
        };

        match parse_route(&label) {
            Some(route) => {
                tracing::info!(route = %route, "Task routed");
                route
            }
            None => {
                tracing::warn!(label = %truncate(&label, 80), "Unrecognized route label, defaulting to direct");
                Route::Direct
            }
        }
    }
}

fn classification_message(task: &str, history: &[Message]) -> String {
    let start = history.len().saturating_sub(HISTORY_WINDOW);
    let lines: Vec<String> = history[start..]
        .iter()
        .filter(|m| matches!(m.role, Role::User | Role::Assistant))
        .map(|m| {
            let speaker = if m.role == Role::User { "user" } else { "assistant" };
            format!("{}: {}", speaker, truncate(&m.content, HISTORY_MESSAGE_CHARS))
        })
        .collect();

    if lines.is_empty() {
        return format!("Request:\n{}", task);
    }
    format!(
        "Conversation so far:\n{}\n\nRequest:\n{}",
        lines.join("\n"),
        task
    )
}
