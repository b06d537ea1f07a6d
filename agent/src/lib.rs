//! Task router and multi-role development team orchestrator
//!
//! A session routes each incoming task either to a single tool-using agent
//! (the direct path) or to a team of role-bound workers (planner,
//! implementer, verifier, reviewer) driven by a bounded state machine.

pub mod agent;
pub mod cli;
pub mod config;
pub mod llm;
pub mod orchestrator;
pub mod output;
pub mod retrieval;
pub mod router;
pub mod session;
pub mod tools;
