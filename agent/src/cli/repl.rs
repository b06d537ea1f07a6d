//! REPL (Read-Eval-Print Loop) for interactive CLI
//!
//! Every line is a task for the session, except for a few built-in
//! commands: `help`, `history`, `reindex`, and `exit`/`quit`.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::Result;

use super::task::execute_task;
use crate::agent::events::truncate;
use crate::llm::Role;
use crate::output::{OutputEvent, OutputWriter};
use crate::session::Session;

const HELP: &str = "Commands:
  help      show this message
  history   show the conversation so far
  reindex   rebuild the workspace index for codebase questions
  exit      leave (also: quit, Ctrl-D)
Anything else is routed as a task. Ctrl-C stops the active run.";

/// Built-in REPL commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplCommand {
    Help,
    History,
    Reindex,
    Exit,
}

impl ReplCommand {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "help" | "/help" => Some(ReplCommand::Help),
            "history" | "/history" => Some(ReplCommand::History),
            "reindex" | "/reindex" => Some(ReplCommand::Reindex),
            "exit" | "quit" | "/exit" | "/quit" => Some(ReplCommand::Exit),
            _ => None,
        }
    }
}

/// Interactive REPL
pub struct Repl<'a> {
    session: &'a mut Session,
    output: Arc<dyn OutputWriter>,
}

impl<'a> Repl<'a> {
    /// Create a new REPL
    pub fn new(session: &'a mut Session, output: Arc<dyn OutputWriter>) -> Self {
        Self { session, output }
    }

    /// Run the REPL loop
    pub async fn run(&mut self) -> Result<()> {
        self.output.write(OutputEvent::Status(format!(
            "Workspace: {}. Type 'help' for commands, 'exit' to leave.",
            self.session.workspace().display()
        )));
        self.output.write(OutputEvent::NewLine);

        let stdin = io::stdin();
        let mut stdout = io::stdout();

        loop {
            print!("> ");
            stdout.flush()?;

            let mut input = String::new();
            if stdin.lock().read_line(&mut input)? == 0 {
                break;
            }
            let input = input.trim();

            if input.is_empty() {
                continue;
            }

            match ReplCommand::parse(input) {
                Some(ReplCommand::Exit) => break,
                Some(ReplCommand::Help) => {
                    self.output.write(OutputEvent::Text(HELP.to_string()));
                    self.output.write(OutputEvent::NewLine);
                }
                Some(ReplCommand::History) => self.show_history(),
                Some(ReplCommand::Reindex) => self.reindex().await,
                None => {
                    // Errors are already printed; the session stays usable
                    let _ = execute_task(self.session, Arc::clone(&self.output), input, None).await;
                }
            }
        }

        Ok(())
    }

    fn show_history(&self) {
        let history = self.session.history();
        if history.is_empty() {
            self.output
                .write(OutputEvent::Status("No history yet".to_string()));
            return;
        }
        for message in history {
            let speaker = if message.role == Role::User { "you" } else { "devteam" };
            self.output.write(OutputEvent::Text(format!(
                "{}: {}",
                speaker,
                truncate(&message.content, 200)
            )));
        }
        self.output.write(OutputEvent::NewLine);
    }

    async fn reindex(&self) {
        self.output
            .write(OutputEvent::Status("Indexing workspace...".to_string()));
        match self.session.reindex().await {
            Ok(stats) => self.output.write(OutputEvent::Status(format!(
                "Indexed {} files ({} chunks)",
                stats.files, stats.chunks
            ))),
            Err(e) => self
                .output
                .write(OutputEvent::Error(format!("Indexing failed: {}", e))),
        }
    }
}
