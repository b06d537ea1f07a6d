//! Multi-role team workflow
//!
//! This module provides:
//! - Task state shared by one run and the transition predicates over it
//! - Worker roles (planner, implementer, verifier, reviewer) with per-role inputs
//! - The engine that drives the state machine with a step cap and cancellation
//!
//! # Example
//!
//! ```rust,ignore
//! use devteam::orchestrator::{LlmWorkers, TeamConfig, TeamEngine};
//! use tokio_util::sync::CancellationToken;
//!
//! let workers = LlmWorkers::new(llm, &catalog, 10);
//! let engine = TeamEngine::new(Arc::new(workers), TeamConfig::default());
//!
//! let outcome = engine
//!     .run("write a function that adds two numbers and test it", &CancellationToken::new(), None)
//!     .await;
//! println!("{}", outcome.summary());
//! ```

pub mod engine;
pub mod events;
pub mod predicates;
pub mod prompts;
pub mod state;
pub mod workers;

pub use engine::{RunOutcome, RunStatus, TeamConfig, TeamEngine, TeamError};
pub use events::{step_channel, StepEvent, StepReceiver, StepSender};
pub use predicates::{reviewer_accepts, transition, verifier_signals_failure};
pub use state::{LogEntry, Next, Stage, TaskState};
pub use workers::{grant_for, Feedback, LlmWorkers, Worker, WorkerError, WorkerInput, WorkerResult};
