//! Plain text output for pipes and CI environments
//!
//! No colors or special formatting - just clean text output.

use std::io::{self, Write};

use super::{format_args, log_preview, OutputEvent, OutputWriter};

/// Plain text output writer (no colors)
pub struct PlainOutput {
    /// Whether to show verbose output
    verbose: bool,
}

impl Default for PlainOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl PlainOutput {
    /// Create a new plain output writer
    pub fn new() -> Self {
        Self { verbose: false }
    }

    /// Enable verbose output
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

impl OutputWriter for PlainOutput {
    fn write(&self, event: OutputEvent) {
        match event {
            OutputEvent::Text(text) => {
                println!("{}", text);
            }

            OutputEvent::ToolStart {
                agent,
                name,
                arguments,
            } => {
                let args_str = format_args(&arguments);
                if args_str.is_empty() {
                    eprintln!("  [{}] -> {}", agent, name);
                } else {
                    eprintln!("  [{}] -> {} {}", agent, name, args_str);
                }
            }

            OutputEvent::ToolComplete {
                agent,
                name,
                result,
                duration,
                is_error,
            } => {
                let status = if is_error { "FAIL" } else { "OK" };
                let time = format!("({}ms)", duration.as_millis());

                if self.verbose || is_error {
                    let preview = log_preview(&result, false);
                    eprintln!("  [{}] {} {} {} {}", agent, status, name, time, preview);
                } else {
                    eprintln!("  [{}] {} {} {}", agent, status, name, time);
                }
            }

            OutputEvent::Step {
                step,
                stage,
                next,
                log_entry,
                at,
            } => {
                println!("--- [{}] AGENT: {} ({}) ---", step, stage, at.format("%H:%M:%S"));
                println!("Log: {}", log_preview(&log_entry, self.verbose));
                println!("Next: {}", next);
            }

            OutputEvent::Outcome { done, summary } => {
                let status = if done { "DONE" } else { "STOPPED" };
                println!("{}: {}", status, summary);
            }

            OutputEvent::Status(msg) => {
                eprintln!("  {}", msg);
            }

            OutputEvent::Error(msg) => {
                eprintln!("Error: {}", msg);
            }

            OutputEvent::Warning(msg) => {
                eprintln!("Warning: {}", msg);
            }

            OutputEvent::NewLine => {
                println!();
            }
        }
    }

    fn flush(&self) {
        let _ = io::stdout().flush();
        let _ = io::stderr().flush();
    }
}
