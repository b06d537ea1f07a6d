//! Team workflow engine
//!
//! Drives the Architect → Coder → Tester → Reviewer state machine:
//! - one worker invocation per state, strictly sequential
//! - loop-backs to Coder on failing tests or requested changes
//! - a cap on total worker invocations per run
//! - cancellation checked on entry to every state

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::events::{StepEvent, StepSender};
use super::predicates::transition;
use super::state::{Next, Stage, TaskState};
use super::workers::{Feedback, Worker, WorkerError, WorkerInput, WorkerResult};
use crate::config::TeamSectionConfig;

/// Configuration for the team engine
#[derive(Debug, Clone, Copy)]
pub struct TeamConfig {
    /// Maximum worker invocations per run
    pub max_steps: usize,
    /// Retry a worker once after a transient failure
    pub retry_transient: bool,
}

impl Default for TeamConfig {
    fn default() -> Self {
        Self {
            max_steps: 10,
            retry_transient: true,
        }
    }
}

impl From<&TeamSectionConfig> for TeamConfig {
    fn from(config: &TeamSectionConfig) -> Self {
        Self {
            max_steps: config.max_steps,
            retry_transient: config.retry_transient,
        }
    }
}

/// Why a run failed
#[derive(Debug, thiserror::Error)]
pub enum TeamError {
    #[error("{stage} failed: {source}")]
    Worker {
        stage: Stage,
        #[source]
        source: WorkerError,
    },

    #[error("retry budget exhausted after {max} worker invocations")]
    RetryBudgetExhausted { max: usize },

    #[error("{stage} entered without {field}")]
    MissingPrecondition { stage: Stage, field: &'static str },
}

/// Terminal status of a run
#[derive(Debug)]
pub enum RunStatus {
    /// The reviewer accepted the code
    Done,
    /// The run stopped in `stage`
    Failed { stage: Stage, error: TeamError },
    /// Cancelled on entry to `at`
    Cancelled { at: Stage },
}

/// Result of a run: terminal status plus everything accumulated
#[derive(Debug)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub state: TaskState,
    /// Worker calls made, retried attempts included
    pub worker_calls: usize,
}

impl RunOutcome {
    pub fn is_done(&self) -> bool {
        matches!(self.status, RunStatus::Done)
    }

    /// Short text fold of the run for conversation history
    pub fn summary(&self) -> String {
        let steps = self.state.invocations();
        let visited = self
            .state
            .visited()
            .iter()
            .map(|stage| stage.as_str())
            .collect::<Vec<_>>()
            .join(" → ");

        match &self.status {
            RunStatus::Done => format!(
                "Team run completed in {} steps ({}). Latest implementation: {}",
                steps,
                visited,
                self.state.code().unwrap_or_default()
            ),
            RunStatus::Failed { stage, error } => {
                let mut summary = format!(
                    "Team run failed at {} after {} steps: {}",
                    stage, steps, error
                );
                if let Some(tail) = self.state.log_tail() {
                    summary.push_str(&format!("\nLast log entry: {}", tail.message));
                }
                summary
            }
            RunStatus::Cancelled { at } => format!(
                "Team run cancelled before {} after {} steps ({}).",
                at, steps, visited
            ),
        }
    }
}

/// Team workflow engine
pub struct TeamEngine {
    workers: Arc<dyn Worker>,
    config: TeamConfig,
}

impl TeamEngine {
    pub fn new(workers: Arc<dyn Worker>, config: TeamConfig) -> Self {
        Self { workers, config }
    }

    pub fn config(&self) -> &TeamConfig {
        &self.config
    }

    /// Run the workflow for `task` until Done, Failed or Cancelled
    pub async fn run(
        &self,
        task: &str,
        cancel: &CancellationToken,
        events: Option<&StepSender>,
    ) -> RunOutcome {
        let mut state = TaskState::new(task);
        let mut stage = Stage::Architect;
        let mut previous: Option<Stage> = None;
        let mut calls = 0;

        tracing::info!(max_steps = self.config.max_steps, "Team run started");

        loop {
            if cancel.is_cancelled() {
                tracing::info!(stage = %stage, steps = state.invocations(), "Team run cancelled");
                return RunOutcome {
                    status: RunStatus::Cancelled { at: stage },
                    state,
                    worker_calls: calls,
                };
            }

            if calls >= self.config.max_steps {
                tracing::warn!(
                    stage = %stage,
                    max = self.config.max_steps,
                    "Retry budget exhausted"
                );
                return fail(state, stage, self.budget_exhausted(), calls);
            }

            let result = match input_for(stage, previous, &state) {
                Ok(input) => self.invoke(input, &mut calls).await,
                Err(error) => {
                    tracing::error!(stage = %stage, error = %error, "Workflow precondition violated");
                    return fail(state, stage, error, calls);
                }
            };

            let result = match result {
                Ok(result) if output_required(stage) && result.output.trim().is_empty() => {
                    tracing::warn!(stage = %stage, "Worker returned no output");
                    state.record_rejected(stage, result.log_entry);
                    let error = TeamError::Worker {
                        stage,
                        source: WorkerError::EmptyOutput(stage),
                    };
                    return fail(state, stage, error, calls);
                }
                Ok(result) => result,
                Err(StepFailure::Budget) => {
                    tracing::warn!(stage = %stage, "Retry budget exhausted before retrying");
                    return fail(state, stage, self.budget_exhausted(), calls);
                }
                Err(StepFailure::Worker(source)) => {
                    tracing::warn!(stage = %stage, error = %source, "Worker failed");
                    return fail(state, stage, TeamError::Worker { stage, source }, calls);
                }
            };

            let next = transition(stage, &result.output);
            state.record(stage, result);

            tracing::info!(
                step = state.invocations(),
                stage = %stage,
                next = %next,
                "Step completed"
            );

            if let (Some(sender), Some(tail)) = (events, state.log_tail()) {
                let _ = sender.send(StepEvent {
                    step: state.invocations(),
                    stage,
                    next,
                    log_entry: tail.clone(),
                    state: state.clone(),
                });
            }

            match next {
                Next::Done => {
                    tracing::info!(steps = state.invocations(), "Team run done");
                    return RunOutcome {
                        status: RunStatus::Done,
                        state,
                        worker_calls: calls,
                    };
                }
                Next::Stage(following) => {
                    previous = Some(stage);
                    stage = following;
                }
            }
        }
    }

    /// Invoke the worker, retrying once on a transient failure.
    ///
    /// Every attempt counts against `max_steps`; a retry that would exceed it
    /// is not made.
    async fn invoke(
        &self,
        input: WorkerInput<'_>,
        calls: &mut usize,
    ) -> Result<WorkerResult, StepFailure> {
        *calls += 1;
        match self.workers.invoke(input).await {
            Err(e) if self.config.retry_transient && e.is_transient() => {
                if *calls >= self.config.max_steps {
                    tracing::warn!(stage = %input.stage(), error = %e, "Transient worker failure, no budget left to retry");
                    return Err(StepFailure::Budget);
                }
                tracing::warn!(stage = %input.stage(), error = %e, "Transient worker failure, retrying once");
                *calls += 1;
                self.workers.invoke(input).await.map_err(StepFailure::Worker)
            }
            other => other.map_err(StepFailure::Worker),
        }
    }

    fn budget_exhausted(&self) -> TeamError {
        TeamError::RetryBudgetExhausted {
            max: self.config.max_steps,
        }
    }
}

/// Why one state produced no result
enum StepFailure {
    Worker(WorkerError),
    Budget,
}

/// Stages whose output a later state requires; the reviewer may answer with nothing
fn output_required(stage: Stage) -> bool {
    !matches!(stage, Stage::Reviewer)
}

fn fail(state: TaskState, stage: Stage, error: TeamError, worker_calls: usize) -> RunOutcome {
    RunOutcome {
        status: RunStatus::Failed { stage, error },
        state,
        worker_calls,
    }
}

/// Build the read view for `stage`, entered from `previous`
fn input_for<'a>(
    stage: Stage,
    previous: Option<Stage>,
    state: &'a TaskState,
) -> Result<WorkerInput<'a>, TeamError> {
    let require = |value: Option<&'a str>, field: &'static str| {
        value.ok_or(TeamError::MissingPrecondition { stage, field })
    };
    let task = state.task();

    Ok(match stage {
        Stage::Architect => WorkerInput::Plan { task },
        Stage::Coder => {
            let feedback = match previous {
                Some(Stage::Tester) => Some(Feedback::TestFailure(require(
                    state.test_results(),
                    "test_results",
                )?)),
                Some(Stage::Reviewer) => Some(Feedback::Review(require(
                    state.review_comments(),
                    "review_comments",
                )?)),
                _ => None,
            };
            WorkerInput::Implement {
                task,
                plan: require(state.plan(), "plan")?,
                feedback,
            }
        }
        Stage::Tester => WorkerInput::Verify {
            task,
            code: require(state.code(), "code")?,
        },
        Stage::Reviewer => WorkerInput::Review {
            task,
            code: require(state.code(), "code")?,
            test_results: require(state.test_results(), "test_results")?,
        },
    })
}
