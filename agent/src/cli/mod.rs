//! CLI module
//!
//! This module provides:
//! - CLI argument definitions (args)
//! - Single-task execution with live progress and Ctrl-C handling (task)
//! - REPL functionality (repl)

pub mod args;
pub mod repl;
pub mod task;

pub use args::{Cli, Commands};
pub use repl::{Repl, ReplCommand};
pub use task::{execute_task, spawn_event_printer};
