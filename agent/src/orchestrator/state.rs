//! Task state threaded through one team run

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::workers::WorkerResult;

/// A state of the team workflow that runs a worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Architect,
    Coder,
    Tester,
    Reviewer,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Architect => "Architect",
            Stage::Coder => "Coder",
            Stage::Tester => "Tester",
            Stage::Reviewer => "Reviewer",
        }
    }

    /// The worker role that runs in this state
    pub fn role(self) -> &'static str {
        match self {
            Stage::Architect => "planner",
            Stage::Coder => "implementer",
            Stage::Tester => "verifier",
            Stage::Reviewer => "reviewer",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the workflow goes after a stage completes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Next {
    Stage(Stage),
    Done,
}

impl fmt::Display for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Next::Stage(stage) => stage.fmt(f),
            Next::Done => f.write_str("Done"),
        }
    }
}

/// One record in the agent log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub stage: Stage,
    pub message: String,
    /// When the invocation completed
    pub at: DateTime<Utc>,
}

/// Shared record of a team run.
///
/// Only the orchestrator writes it, through [`TaskState::record`]; workers
/// see read views and return their results as values. Every field except
/// the log is last-write-wins; the log gains exactly one entry per
/// completed worker invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskState {
    task: String,
    plan: Option<String>,
    code: Option<String>,
    test_results: Option<String>,
    review_comments: Option<String>,
    agent_log: Vec<LogEntry>,
}

impl TaskState {
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            plan: None,
            code: None,
            test_results: None,
            review_comments: None,
            agent_log: Vec::new(),
        }
    }

    pub fn task(&self) -> &str {
        &self.task
    }

    pub fn plan(&self) -> Option<&str> {
        self.plan.as_deref()
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub fn test_results(&self) -> Option<&str> {
        self.test_results.as_deref()
    }

    pub fn review_comments(&self) -> Option<&str> {
        self.review_comments.as_deref()
    }

    pub fn agent_log(&self) -> &[LogEntry] {
        &self.agent_log
    }

    /// Completed worker invocations so far
    pub fn invocations(&self) -> usize {
        self.agent_log.len()
    }

    pub fn log_tail(&self) -> Option<&LogEntry> {
        self.agent_log.last()
    }

    /// Stages in visitation order
    pub fn visited(&self) -> Vec<Stage> {
        self.agent_log.iter().map(|entry| entry.stage).collect()
    }

    /// Store a worker's result in the field its stage owns and log it
    pub(crate) fn record(&mut self, stage: Stage, result: WorkerResult) {
        let slot = match stage {
            Stage::Architect => &mut self.plan,
            Stage::Coder => &mut self.code,
            Stage::Tester => &mut self.test_results,
            Stage::Reviewer => &mut self.review_comments,
        };
        *slot = Some(result.output);
        self.agent_log.push(LogEntry {
            stage,
            message: result.log_entry,
            at: Utc::now(),
        });
    }

    /// Log a call whose output was unusable; no field changes
    pub(crate) fn record_rejected(&mut self, stage: Stage, log_entry: String) {
        self.agent_log.push(LogEntry {
            stage,
            message: log_entry,
            at: Utc::now(),
        });
    }
}
