//! Questions about the workspace, answered from the retrieval index

use async_trait::async_trait;
use serde_json::Value;

use super::{required_str, Tool, ToolError, ToolKind};
use crate::retrieval::{CodeIndex, SharedIndex, Snippet};

const NOT_INDEXED: &str = "Vector store not available. The workspace might be empty or has not been indexed yet. Try using the 'ls' command to see files first.";
const NO_MATCHES: &str = "I couldn't find any relevant code snippets for your question.";

pub struct CodebaseQaTool {
    index: SharedIndex,
    top_k: usize,
}

impl CodebaseQaTool {
    pub fn new(index: SharedIndex, top_k: usize) -> Self {
        Self { index, top_k }
    }
}

fn render_snippets(snippets: &[Snippet]) -> String {
    let context = snippets
        .iter()
        .map(|s| format!("File: {}\n{}", s.source, s.content))
        .collect::<Vec<_>>()
        .join("\n---\n");
    format!("Here are the most relevant code snippets I found:\n\n{}", context)
}

#[async_trait]
impl Tool for CodebaseQaTool {
    fn kind(&self) -> ToolKind {
        ToolKind::CodebaseQa
    }

    async fn invoke(&self, input: &Value) -> Result<String, ToolError> {
        let query = required_str(input, "query")?;

        let index = self.index.read().await;
        if !index.is_ready() {
            return Ok(NOT_INDEXED.to_string());
        }

        let snippets = index.query(query, self.top_k).await?;
        if snippets.is_empty() {
            return Ok(NO_MATCHES.to_string());
        }
        Ok(render_snippets(&snippets))
    }
}
