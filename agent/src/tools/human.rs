//! Ask the user a clarifying question

use std::io::{BufRead, Write};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::{required_str, Tool, ToolError, ToolKind};

/// Blocking function that poses a question and returns the answer
pub type Responder = Arc<dyn Fn(&str) -> std::io::Result<String> + Send + Sync>;

pub struct AskHumanTool {
    responder: Responder,
}

impl AskHumanTool {
    /// Ask on stderr, read the answer from stdin
    pub fn stdio() -> Self {
        Self::with_responder(Arc::new(ask_on_terminal))
    }

    pub fn with_responder(responder: Responder) -> Self {
        Self { responder }
    }
}

fn ask_on_terminal(question: &str) -> std::io::Result<String> {
    let mut stderr = std::io::stderr();
    writeln!(stderr, "\n[agent asks] {}", question)?;
    write!(stderr, "your answer> ")?;
    stderr.flush()?;

    let mut answer = String::new();
    let read = std::io::stdin().lock().read_line(&mut answer)?;
    if read == 0 {
        return Err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "stdin closed",
        ));
    }
    Ok(answer.trim_end().to_string())
}

#[async_trait]
impl Tool for AskHumanTool {
    fn kind(&self) -> ToolKind {
        ToolKind::AskHuman
    }

    async fn invoke(&self, input: &Value) -> Result<String, ToolError> {
        let question = required_str(input, "question")?.to_string();
        let responder = Arc::clone(&self.responder);

        let answer = tokio::task::spawn_blocking(move || responder(&question))
            .await
            .map_err(|e| ToolError::Unavailable(format!("question task failed: {}", e)))?
            .map_err(|e| ToolError::Unavailable(format!("no answer from user: {}", e)))?;

        if answer.trim().is_empty() {
            return Ok("The user gave no answer. Proceed with your best judgement.".to_string());
        }
        Ok(answer)
    }
}
