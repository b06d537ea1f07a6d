//! Worker roles and their inputs
//!
//! Each [`WorkerInput`] variant carries exactly the read view its role may
//! see. A [`Worker`] turns an input into a [`WorkerResult`]; it never
//! touches the task state.

use std::sync::Arc;

use async_trait::async_trait;

use super::prompts::{
    with_directives, IMPLEMENTER_PROMPT, PLANNER_PROMPT, REVIEWER_PROMPT, TESTER_PROMPT,
};
use super::state::Stage;
use crate::agent::{Agent, AgentError, EventSender};
use crate::llm::Llm;
use crate::tools::{ToolCatalog, ToolKind};

/// Why the implementer is being asked to revise its code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback<'a> {
    TestFailure(&'a str),
    Review(&'a str),
}

/// Input for one worker invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerInput<'a> {
    Plan {
        task: &'a str,
    },
    Implement {
        task: &'a str,
        plan: &'a str,
        feedback: Option<Feedback<'a>>,
    },
    Verify {
        task: &'a str,
        code: &'a str,
    },
    Review {
        task: &'a str,
        code: &'a str,
        test_results: &'a str,
    },
}

impl WorkerInput<'_> {
    pub fn stage(&self) -> Stage {
        match self {
            WorkerInput::Plan { .. } => Stage::Architect,
            WorkerInput::Implement { .. } => Stage::Coder,
            WorkerInput::Verify { .. } => Stage::Tester,
            WorkerInput::Review { .. } => Stage::Reviewer,
        }
    }

    /// The user message sent to the role's agent
    pub fn render(&self) -> String {
        match self {
            WorkerInput::Plan { task } => task.to_string(),
            WorkerInput::Implement {
                task,
                plan,
                feedback,
            } => {
                let mut message = format!(
                    "Task: {}\n\nHere is the plan:\n\n{}\n\nPlease write the code.",
                    task, plan
                );
                match feedback {
                    Some(Feedback::TestFailure(report)) => message.push_str(&format!(
                        "\n\nThe previous attempt failed its tests. Here is the test report:\n\n{}\n\nFix the code so the tests pass.",
                        report
                    )),
                    Some(Feedback::Review(comments)) => message.push_str(&format!(
                        "\n\nThe reviewer requested changes:\n\n{}\n\nUpdate the code to address every comment.",
                        comments
                    )),
                    None => {}
                }
                message
            }
            WorkerInput::Verify { task, code } => format!(
                "Task: {}\n\nHere is the code to test:\n\n{}\n\nPlease write a test file and run it.",
                task, code
            ),
            WorkerInput::Review {
                task,
                code,
                test_results,
            } => format!(
                "Task: {}\n\nHere is the code to review:\n\n{}\n\nAnd here are the test results:\n{}",
                task, code, test_results
            ),
        }
    }
}

/// Output of one worker invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerResult {
    pub output: String,
    pub log_entry: String,
}

impl WorkerResult {
    /// Result with the standard log entry for `stage`
    pub fn for_stage(stage: Stage, output: impl Into<String>) -> Self {
        let output = output.into();
        let log_entry = match stage {
            Stage::Architect => format!("Architect created a plan: {}", output),
            Stage::Coder => format!("Coder wrote the code: {}", output),
            Stage::Tester => format!("Tester ran tests. Results: {}", output),
            Stage::Reviewer => format!("Reviewer provided feedback: {}", output),
        };
        Self { output, log_entry }
    }
}

/// Errors raised by a worker invocation
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error("{0} produced no output")]
    EmptyOutput(Stage),
}

impl WorkerError {
    /// Transport and timeout failures are worth one more attempt
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Agent(e) => e.is_transient(),
            Self::EmptyOutput(_) => false,
        }
    }
}

/// Runs the role matching each input
#[async_trait]
pub trait Worker: Send + Sync {
    async fn invoke(&self, input: WorkerInput<'_>) -> Result<WorkerResult, WorkerError>;
}

/// Tools each role may use
pub fn grant_for(stage: Stage) -> &'static [ToolKind] {
    match stage {
        Stage::Architect => &[],
        Stage::Coder => &[
            ToolKind::ReadFile,
            ToolKind::WriteFile,
            ToolKind::ListDirectory,
            ToolKind::Shell,
        ],
        Stage::Tester => &[
            ToolKind::ReadFile,
            ToolKind::WriteFile,
            ToolKind::ListDirectory,
            ToolKind::Shell,
            ToolKind::Git,
            ToolKind::Docker,
            ToolKind::WebSearch,
            ToolKind::AskHuman,
        ],
        Stage::Reviewer => &[ToolKind::ReadFile, ToolKind::ListDirectory],
    }
}

/// LLM-backed workers, one agent per role
#[derive(Clone)]
pub struct LlmWorkers {
    planner: Agent,
    implementer: Agent,
    verifier: Agent,
    reviewer: Agent,
}

impl LlmWorkers {
    pub fn new(llm: Arc<dyn Llm>, catalog: &ToolCatalog, max_tool_iterations: usize) -> Self {
        let build = |stage: Stage, prompt: &str| {
            Agent::new(stage.role(), Arc::clone(&llm), prompt)
                .with_toolbox(catalog.grant(grant_for(stage)))
                .with_max_iterations(max_tool_iterations)
        };

        Self {
            planner: build(Stage::Architect, PLANNER_PROMPT),
            implementer: build(Stage::Coder, &with_directives(IMPLEMENTER_PROMPT)),
            verifier: build(Stage::Tester, &with_directives(TESTER_PROMPT)),
            reviewer: build(Stage::Reviewer, REVIEWER_PROMPT),
        }
    }

    /// Forward tool activity of every role
    pub fn with_event_sender(mut self, sender: EventSender) -> Self {
        self.planner = self.planner.with_event_sender(sender.clone());
        self.implementer = self.implementer.with_event_sender(sender.clone());
        self.verifier = self.verifier.with_event_sender(sender.clone());
        self.reviewer = self.reviewer.with_event_sender(sender);
        self
    }

    pub fn agent(&self, stage: Stage) -> &Agent {
        match stage {
            Stage::Architect => &self.planner,
            Stage::Coder => &self.implementer,
            Stage::Tester => &self.verifier,
            Stage::Reviewer => &self.reviewer,
        }
    }
}

#[async_trait]
impl Worker for LlmWorkers {
    async fn invoke(&self, input: WorkerInput<'_>) -> Result<WorkerResult, WorkerError> {
        let stage = input.stage();
        let agent = self.agent(stage);
        tracing::debug!(stage = %stage, tools = ?agent.toolbox(), "Invoking worker");

        let output = agent.run(&[], &input.render()).await?;
        Ok(WorkerResult::for_stage(stage, output))
    }
}
