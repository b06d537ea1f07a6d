//! Shell, git and docker tools
//!
//! All three run through one [`CommandRunner`]: the command line is checked
//! against the deny list, then executed by the configured shell inside the
//! workspace with a timeout and an output size cap.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use tokio::process::Command;

use super::{required_str, Tool, ToolError, ToolKind};
use crate::config::ToolsConfig;

/// Captured result of one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub truncated: bool,
}

impl CommandOutput {
    /// Text handed back to the model
    pub fn render(&self) -> String {
        let code = self
            .exit_code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "killed".to_string());
        let mut out = format!("exit code: {}\n", code);
        if !self.stdout.is_empty() {
            out.push_str("stdout:\n");
            out.push_str(&self.stdout);
            if !self.stdout.ends_with('\n') {
                out.push('\n');
            }
        }
        if !self.stderr.is_empty() {
            out.push_str("stderr:\n");
            out.push_str(&self.stderr);
            if !self.stderr.ends_with('\n') {
                out.push('\n');
            }
        }
        if self.truncated {
            out.push_str("[output truncated]\n");
        }
        out
    }
}

/// Guarded command execution inside the workspace
#[derive(Debug, Clone)]
pub struct CommandRunner {
    shell: String,
    cwd: PathBuf,
    timeout: Duration,
    max_output_bytes: usize,
    deny_patterns: Vec<Regex>,
}

impl CommandRunner {
    pub fn new(config: &ToolsConfig, cwd: PathBuf) -> Result<Self, ToolError> {
        let deny_patterns = config
            .deny_patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| {
                    ToolError::Unavailable(format!("invalid deny pattern '{}': {}", p, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            shell: config.shell.clone(),
            cwd,
            timeout: Duration::from_secs(config.command_timeout_secs),
            max_output_bytes: config.max_output_bytes,
            deny_patterns,
        })
    }

    /// Reject commands matching a deny pattern
    pub fn check(&self, command: &str) -> Result<(), ToolError> {
        for pattern in &self.deny_patterns {
            if pattern.is_match(command) {
                return Err(ToolError::CommandDenied(format!(
                    "matches deny pattern {}",
                    pattern.as_str()
                )));
            }
        }
        Ok(())
    }

    pub async fn run(&self, command: &str) -> Result<CommandOutput, ToolError> {
        self.check(command)?;

        tracing::debug!(command = %command, cwd = %self.cwd.display(), "Running command");

        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c")
            .arg(command)
            .current_dir(&self.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(result) => result?,
            Err(_) => return Err(ToolError::Timeout(self.timeout.as_secs())),
        };

        let (stdout, stdout_truncated) = truncate_output(&output.stdout, self.max_output_bytes);
        let (stderr, stderr_truncated) = truncate_output(&output.stderr, self.max_output_bytes);

        Ok(CommandOutput {
            exit_code: output.status.code(),
            stdout,
            stderr,
            truncated: stdout_truncated || stderr_truncated,
        })
    }
}

/// Truncate output to max bytes; a split UTF-8 sequence is replaced lossily
fn truncate_output(output: &[u8], max_bytes: usize) -> (String, bool) {
    if output.len() <= max_bytes {
        (String::from_utf8_lossy(output).into_owned(), false)
    } else {
        (String::from_utf8_lossy(&output[..max_bytes]).into_owned(), true)
    }
}

/// A command-line tool; git and docker prefix their program name
pub struct CommandTool {
    kind: ToolKind,
    runner: CommandRunner,
}

impl CommandTool {
    pub fn shell(runner: CommandRunner) -> Self {
        Self {
            kind: ToolKind::Shell,
            runner,
        }
    }

    pub fn git(runner: CommandRunner) -> Self {
        Self {
            kind: ToolKind::Git,
            runner,
        }
    }

    pub fn docker(runner: CommandRunner) -> Self {
        Self {
            kind: ToolKind::Docker,
            runner,
        }
    }

    fn program(&self) -> Option<&'static str> {
        match self.kind {
            ToolKind::Git => Some("git"),
            ToolKind::Docker => Some("docker"),
            _ => None,
        }
    }

    /// Full command line for the requested arguments
    fn command_line(&self, command: &str) -> String {
        let command = command.trim();
        match self.program() {
            Some(program) => {
                let already_prefixed = command
                    .strip_prefix(program)
                    .is_some_and(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace));
                if already_prefixed {
                    command.to_string()
                } else {
                    format!("{} {}", program, command)
                }
            }
            None => command.to_string(),
        }
    }
}

#[async_trait]
impl Tool for CommandTool {
    fn kind(&self) -> ToolKind {
        self.kind
    }

    async fn invoke(&self, input: &Value) -> Result<String, ToolError> {
        let command = required_str(input, "command")?;
        if command.trim().is_empty() {
            return Err(ToolError::InvalidArguments("command is empty".to_string()));
        }
        let output = self.runner.run(&self.command_line(command)).await?;
        Ok(output.render())
    }
}
