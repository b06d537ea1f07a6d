//! Agent module - LLM with tool-calling capabilities
//!
//! This implements the "tool-using agent loop" where:
//! 1. The caller sends a message
//! 2. The LLM receives it along with the granted tools
//! 3. The LLM decides whether to call tools or respond directly
//! 4. If tools are called, results are fed back to the LLM
//! 5. The loop continues until the LLM responds without tool calls

use std::sync::Arc;
use std::time::Instant;

use crate::llm::{CompletionRequest, Llm, LlmError, Message};
use crate::tools::{ToolError, Toolbox};

// Agent event emission for real-time visibility
pub mod events;
pub use events::{event_channel, AgentEvent, AgentEventSender, EventReceiver, EventSender};

/// Default bound on tool-calling iterations
pub const MAX_ITERATIONS: usize = 10;

/// Errors that end an agent run
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("tool {name} failed: {source}")]
    Tool {
        name: String,
        #[source]
        source: ToolError,
    },
}

impl AgentError {
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Llm(e) => e.is_transient(),
            Self::Tool { source, .. } => source.is_transient(),
        }
    }
}

/// An LLM with a system prompt and a fixed set of tools
#[derive(Clone)]
pub struct Agent {
    name: String,
    llm: Arc<dyn Llm>,
    system_prompt: String,
    toolbox: Toolbox,
    max_iterations: usize,
    event_sender: AgentEventSender,
}

impl Agent {
    /// Create a new agent with no tools
    pub fn new(name: &str, llm: Arc<dyn Llm>, system_prompt: &str) -> Self {
        Self {
            name: name.to_string(),
            llm,
            system_prompt: system_prompt.to_string(),
            toolbox: Toolbox::empty(),
            max_iterations: MAX_ITERATIONS,
            event_sender: AgentEventSender::none(),
        }
    }

    /// Grant tools
    pub fn with_toolbox(mut self, toolbox: Toolbox) -> Self {
        self.toolbox = toolbox;
        self
    }

    /// Bound the tool-calling loop
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    /// Set event sender for real-time event visibility
    pub fn with_event_sender(mut self, sender: EventSender) -> Self {
        self.event_sender = AgentEventSender::new(self.name.clone(), sender);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn toolbox(&self) -> &Toolbox {
        &self.toolbox
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Run one message through the agent, handling tool calls.
    ///
    /// `history` is prior conversation and is not modified.
    pub async fn run(&self, history: &[Message], user_message: &str) -> Result<String, AgentError> {
        let total_start = Instant::now();
        self.event_sender.processing_start();

        let mut messages: Vec<Message> = Vec::with_capacity(history.len() + 1);
        messages.extend_from_slice(history);
        messages.push(Message::user(user_message));

        let tools = self.toolbox.definitions();
        let mut last_text = String::new();

        for iteration in 1..=self.max_iterations {
            tracing::debug!(agent = %self.name, iteration, "Agent iteration");

            let request = CompletionRequest {
                system: self.system_prompt.clone(),
                messages: messages.clone(),
                tools: tools.clone(),
            };

            let completion = match self.llm.complete(&request).await {
                Ok(completion) => completion,
                Err(e) => {
                    self.event_sender.error(&e.to_string());
                    return Err(e.into());
                }
            };
            self.event_sender
                .iteration(iteration, completion.tool_calls.len());

            if completion.tool_calls.is_empty() {
                tracing::info!(
                    agent = %self.name,
                    iterations = iteration,
                    "Agent responding without tool calls"
                );
                self.event_sender
                    .response_complete(iteration, total_start.elapsed());
                return Ok(completion.text);
            }

            tracing::info!(
                agent = %self.name,
                tool_calls = completion.tool_calls.len(),
                "Agent making tool call(s)"
            );

            if !completion.text.trim().is_empty() {
                last_text = completion.text.clone();
            }
            messages.push(Message::assistant_with_calls(
                completion.text,
                completion.tool_calls.clone(),
            ));

            for tool_call in &completion.tool_calls {
                let name = &tool_call.function.name;
                let arguments = &tool_call.function.arguments;
                self.event_sender.tool_start(name, arguments);

                let tool_start = Instant::now();
                let (result, is_error) = match self.toolbox.invoke(name, arguments).await {
                    Ok(output) => (output, false),
                    Err(e) if e.is_recoverable() => {
                        tracing::debug!(agent = %self.name, tool = %name, error = %e, "Tool error returned to model");
                        (format!("Error calling tool {}: {}", name, e), true)
                    }
                    Err(e) => {
                        tracing::warn!(agent = %self.name, tool = %name, error = %e, "Tool failed");
                        self.event_sender.error(&e.to_string());
                        return Err(AgentError::Tool {
                            name: name.clone(),
                            source: e,
                        });
                    }
                };

                self.event_sender
                    .tool_complete(name, &result, tool_start.elapsed(), is_error);
                messages.push(Message::tool(result));
            }
        }

        let warning = format!(
            "Agent reached maximum iterations ({}) without completing",
            self.max_iterations
        );
        tracing::warn!(agent = %self.name, "{}", warning);
        self.event_sender.error(&warning);

        if last_text.is_empty() {
            Ok(warning)
        } else {
            Ok(last_text)
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::llm::{Completion, Role, ToolCall};
    use crate::tools::tests::EchoTool;
    use crate::tools::{ToolCatalog, ToolKind};

    /// Replays scripted completions and records every request
    pub(crate) struct ScriptedLlm {
        replies: Mutex<VecDeque<Result<Completion, LlmError>>>,
        pub(crate) requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedLlm {
        pub(crate) fn new(replies: Vec<Result<Completion, LlmError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Llm for ScriptedLlm {
        async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LlmError> {
            self.requests.lock().unwrap().push(request.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Completion::text("done")))
        }

        fn model(&self) -> &str {
            "scripted"
        }
    }

    fn calls(name: &str) -> Completion {
        Completion {
            text: String::new(),
            tool_calls: vec![ToolCall::new(name, json!({"file_path": "a.py"}))],
        }
    }

    #[tokio::test]
    async fn test_plain_answer() {
        let llm = Arc::new(ScriptedLlm::new(vec![Ok(Completion::text("hello"))]));
        let agent = Agent::new("direct", llm.clone(), "be brief");

        let history = vec![Message::user("earlier"), Message::assistant("reply")];
        let answer = agent.run(&history, "hi").await.unwrap();
        assert_eq!(answer, "hello");

        let requests = llm.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].system, "be brief");
        assert_eq!(requests[0].messages.len(), 3);
        assert!(requests[0].tools.is_empty());
    }

    #[tokio::test]
    async fn test_tool_results_are_fed_back() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            Ok(calls("read_file")),
            Ok(Completion::text("file read")),
        ]));
        let catalog = ToolCatalog::new().with(Arc::new(EchoTool(ToolKind::ReadFile)));
        let (tx, mut rx) = event_channel();
        let agent = Agent::new("coder", llm.clone(), "")
            .with_toolbox(catalog.grant(&[ToolKind::ReadFile]))
            .with_event_sender(tx);

        assert_eq!(agent.run(&[], "go").await.unwrap(), "file read");

        let requests = llm.requests.lock().unwrap();
        assert_eq!(requests[0].tools.len(), 1);
        let second = &requests[1].messages;
        assert_eq!(second[1].role, Role::Assistant);
        assert_eq!(second[2].role, Role::Tool);
        assert!(second[2].content.starts_with("read_file:"));

        let mut saw_tool_complete = false;
        while let Ok(event) = rx.try_recv() {
            if let AgentEvent::ToolComplete { name, is_error, .. } = event {
                assert_eq!(name, "read_file");
                assert!(!is_error);
                saw_tool_complete = true;
            }
        }
        assert!(saw_tool_complete);
    }

    #[tokio::test]
    async fn test_ungranted_tool_is_reported_to_model() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            Ok(calls("shell")),
            Ok(Completion::text("ok, no shell")),
        ]));
        let agent = Agent::new("reviewer", llm.clone(), "");

        assert_eq!(agent.run(&[], "go").await.unwrap(), "ok, no shell");
        let requests = llm.requests.lock().unwrap();
        let tool_message = &requests[1].messages[2];
        assert!(tool_message.content.contains("not available"));
    }

    #[tokio::test]
    async fn test_iteration_limit_returns_last_text() {
        let mut looping = calls("read_file");
        looping.text = "still working".to_string();
        let llm = Arc::new(ScriptedLlm::new(vec![
            Ok(looping.clone()),
            Ok(looping.clone()),
            Ok(looping),
        ]));
        let catalog = ToolCatalog::new().with(Arc::new(EchoTool(ToolKind::ReadFile)));
        let agent = Agent::new("coder", llm.clone(), "")
            .with_toolbox(catalog.grant(&[ToolKind::ReadFile]))
            .with_max_iterations(2);

        assert_eq!(agent.run(&[], "go").await.unwrap(), "still working");
        assert_eq!(llm.requests.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_llm_error_propagates() {
        let llm = Arc::new(ScriptedLlm::new(vec![Err(LlmError::Api {
            status: 503,
            body: "busy".into(),
        })]));
        let agent = Agent::new("planner", llm, "");
        let err = agent.run(&[], "go").await.unwrap_err();
        assert!(err.is_transient());
    }
}
