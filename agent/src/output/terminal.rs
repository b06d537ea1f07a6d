//! Terminal output with colors and formatting
//!
//! Uses ANSI escape codes for colors and styling.

use std::io::{self, Write};

use super::{format_args, log_preview, OutputEvent, OutputWriter};
use crate::orchestrator::{Next, Stage};

// ANSI color codes
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const BLUE: &str = "\x1b[34m";
const MAGENTA: &str = "\x1b[35m";
const CYAN: &str = "\x1b[36m";
const GRAY: &str = "\x1b[90m";

/// Terminal output writer with colors and formatting
pub struct TerminalOutput {
    /// Whether to use colors (can be disabled)
    use_colors: bool,
    /// Whether verbose mode is enabled
    verbose: bool,
}

impl Default for TerminalOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalOutput {
    /// Create a new terminal output writer
    pub fn new() -> Self {
        Self {
            use_colors: true,
            verbose: false,
        }
    }

    /// Create without colors
    pub fn without_colors() -> Self {
        Self {
            use_colors: false,
            verbose: false,
        }
    }

    /// Enable verbose output
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Format with color if colors are enabled
    fn color(&self, code: &str, text: &str) -> String {
        if self.use_colors {
            format!("{}{}{}", code, text, RESET)
        } else {
            text.to_string()
        }
    }

    /// Format with multiple styles
    fn styled(&self, codes: &[&str], text: &str) -> String {
        if self.use_colors {
            let prefix: String = codes.iter().copied().collect();
            format!("{}{}{}", prefix, text, RESET)
        } else {
            text.to_string()
        }
    }

    fn stage_color(stage: Stage) -> &'static str {
        match stage {
            Stage::Architect => MAGENTA,
            Stage::Coder => BLUE,
            Stage::Tester => YELLOW,
            Stage::Reviewer => CYAN,
        }
    }
}

impl OutputWriter for TerminalOutput {
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
                let tool_name = self.styled(&[BOLD, CYAN], &name);
                let args_str = format_args(&arguments);
                let agent = self.color(GRAY, &format!("[{}]", agent));

                if args_str.is_empty() {
                    eprintln!("  {} {} {}", agent, self.color(GRAY, "→"), tool_name);
                } else {
                    eprintln!(
                        "  {} {} {} {}",
                        agent,
                        self.color(GRAY, "→"),
                        tool_name,
                        self.color(GRAY, &args_str)
                    );
                }
            }

            OutputEvent::ToolComplete {
                agent,
                name,
                result,
                duration,
                is_error,
            } => {
                let status = if is_error {
                    self.color(RED, "✗")
                } else {
                    self.color(GREEN, "✓")
                };
                let agent = self.color(GRAY, &format!("[{}]", agent));
                let time = self.color(GRAY, &format!("({}ms)", duration.as_millis()));

                // Show result preview in verbose mode or on error
                if self.verbose || is_error {
                    let preview = log_preview(&result, false);
                    let preview_styled = if is_error {
                        self.color(RED, &preview)
                    } else {
                        self.color(GRAY, &preview)
                    };
                    eprintln!("  {} {} {} {} {}", agent, status, name, time, preview_styled);
                } else {
                    eprintln!("  {} {} {} {}", agent, status, name, time);
                }
            }

            OutputEvent::Step {
                step,
                stage,
                next,
                log_entry,
                at,
            } => {
                let header = self.styled(
                    &[BOLD, Self::stage_color(stage)],
                    &format!("--- [{}] {} ---", step, stage),
                );
                let header = format!("{} {}", header, self.color(GRAY, &at.format("%H:%M:%S").to_string()));
                let next = match next {
                    Next::Done => self.color(GREEN, "Done"),
                    Next::Stage(Stage::Coder) if stage != Stage::Architect => {
                        self.color(YELLOW, "Coder (loop back)")
                    }
                    Next::Stage(following) => following.to_string(),
                };
                println!("{}", header);
                println!("{}", log_preview(&log_entry, self.verbose));
                println!("{} {}", self.color(GRAY, "next:"), next);
            }

            OutputEvent::Outcome { done, summary } => {
                if done {
                    println!("{} {}", self.styled(&[BOLD, GREEN], "✓"), summary);
                } else {
                    println!("{} {}", self.styled(&[BOLD, RED], "✗"), summary);
                }
            }

            OutputEvent::Status(msg) => {
                eprintln!("{}", self.color(GRAY, &format!("  {}", msg)));
            }

            OutputEvent::Error(msg) => {
                eprintln!(
                    "{} {}",
                    self.styled(&[BOLD, RED], "Error:"),
                    self.color(RED, &msg)
                );
            }

            OutputEvent::Warning(msg) => {
                eprintln!(
                    "{} {}",
                    self.styled(&[BOLD, YELLOW], "Warning:"),
                    self.color(YELLOW, &msg)
                );
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

    fn supports_colors(&self) -> bool {
        self.use_colors
    }
}
