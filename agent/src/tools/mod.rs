//! Tool capabilities available to workers
//!
//! Tools form a closed set keyed by [`ToolKind`]. A [`ToolCatalog`] holds every
//! tool the session could offer; each worker receives a [`Toolbox`] resolved
//! once from the catalog for the kinds it is granted. A model asking for a tool
//! outside its grant gets an error result back, never the tool.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::llm::{ToolDefinition, ToolFunction};
use crate::retrieval::IndexError;

mod codebase;
mod command;
mod files;
mod human;
mod web_search;

pub use codebase::CodebaseQaTool;
pub use command::{CommandRunner, CommandTool};
pub use files::{ListDirectoryTool, ReadFileTool, Sandbox, WriteFileTool};
pub use human::AskHumanTool;
pub use web_search::WebSearchTool;

/// Identity of a tool capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    ReadFile,
    WriteFile,
    ListDirectory,
    Shell,
    Git,
    Docker,
    AskHuman,
    WebSearch,
    CodebaseQa,
}

impl ToolKind {
    pub const ALL: [ToolKind; 9] = [
        ToolKind::ReadFile,
        ToolKind::WriteFile,
        ToolKind::ListDirectory,
        ToolKind::Shell,
        ToolKind::Git,
        ToolKind::Docker,
        ToolKind::AskHuman,
        ToolKind::WebSearch,
        ToolKind::CodebaseQa,
    ];

    /// Stable name the model uses to address the tool
    pub fn name(self) -> &'static str {
        match self {
            ToolKind::ReadFile => "read_file",
            ToolKind::WriteFile => "write_file",
            ToolKind::ListDirectory => "list_directory",
            ToolKind::Shell => "shell",
            ToolKind::Git => "git_tool",
            ToolKind::Docker => "docker_tool",
            ToolKind::AskHuman => "ask_human_for_clarification",
            ToolKind::WebSearch => "web_search",
            ToolKind::CodebaseQa => "codebase_qa_tool",
        }
    }

    /// Look a tool up by its wire name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn description(self) -> &'static str {
        match self {
            ToolKind::ReadFile => "Read a file from the workspace. Paths are relative to the workspace root.",
            ToolKind::WriteFile => "Write text to a file in the workspace, creating parent directories and replacing any existing content.",
            ToolKind::ListDirectory => "List the entries of a workspace directory. Directories end with '/'.",
            ToolKind::Shell => "Run a shell command in the workspace and return its exit code, stdout and stderr.",
            ToolKind::Git => "Run a git command in the workspace (e.g. `status`, `add <file>`, `commit -m '<message>'`, `branch`).",
            ToolKind::Docker => "Run a docker command in the workspace (e.g. `build -t <tag> .`, `run <image>`, `ps`). Requires a running Docker engine.",
            ToolKind::AskHuman => "Ask the human user a clarifying question. Use it when the request is ambiguous or you are stuck after several attempts. Input is the exact question.",
            ToolKind::WebSearch => "Search the web for real-time information such as new libraries, APIs or error messages.",
            ToolKind::CodebaseQa => "Ask a question about the current codebase. Performs a semantic search over workspace files and returns the most relevant snippets.",
        }
    }

    /// JSON schema of the tool's arguments
    pub fn parameters(self) -> Value {
        let (key, description) = match self {
            ToolKind::ReadFile => ("file_path", "Path of the file to read"),
            ToolKind::WriteFile => {
                return json!({
                    "type": "object",
                    "properties": {
                        "file_path": {"type": "string", "description": "Path of the file to write"},
                        "text": {"type": "string", "description": "Full file content"}
                    },
                    "required": ["file_path", "text"]
                })
            }
            ToolKind::ListDirectory => {
                return json!({
                    "type": "object",
                    "properties": {
                        "dir_path": {"type": "string", "description": "Directory to list (default: workspace root)"}
                    }
                })
            }
            ToolKind::Shell => ("command", "Command line to run"),
            ToolKind::Git => ("command", "git arguments, with or without the leading `git`"),
            ToolKind::Docker => ("command", "docker arguments, with or without the leading `docker`"),
            ToolKind::AskHuman => ("question", "Question for the user"),
            ToolKind::WebSearch => ("query", "Search query"),
            ToolKind::CodebaseQa => ("query", "A clear and specific question about the codebase"),
        };

        json!({
            "type": "object",
            "properties": {
                key: {"type": "string", "description": description}
            },
            "required": [key]
        })
    }

    /// Definition advertised to the model
    pub fn definition(self) -> ToolDefinition {
        ToolDefinition {
            tool_type: "function".to_string(),
            function: ToolFunction {
                name: self.name().to_string(),
                description: self.description().to_string(),
                parameters: self.parameters(),
            },
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors raised by tool capabilities
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    Unknown(String),

    #[error("tool {0} is not available to this worker")]
    NotGranted(ToolKind),

    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("path {0} is outside the workspace")]
    OutsideWorkspace(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("command denied: {0}")]
    CommandDenied(String),

    #[error("command timed out after {0}s")]
    Timeout(u64),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("codebase index error: {0}")]
    Index(#[from] IndexError),

    #[error("{0}")]
    Unavailable(String),
}

impl ToolError {
    /// Errors caused by the model's request; reported back so it can correct itself
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Unknown(_)
                | Self::NotGranted(_)
                | Self::InvalidArguments(_)
                | Self::OutsideWorkspace(_)
                | Self::NotFound(_)
                | Self::CommandDenied(_)
                | Self::Timeout(_)
        )
    }

    /// Failures that may succeed on a second attempt
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Index(IndexError::Embed(e)) => e.is_transient(),
            _ => false,
        }
    }
}

/// A named, side-effecting capability invocable by a worker
#[async_trait]
pub trait Tool: Send + Sync {
    fn kind(&self) -> ToolKind;

    async fn invoke(&self, input: &Value) -> Result<String, ToolError>;
}

/// Read a required string argument
pub(crate) fn required_str<'a>(input: &'a Value, key: &str) -> Result<&'a str, ToolError> {
    input
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::InvalidArguments(format!("missing string argument '{}'", key)))
}

/// Every tool the session can hand out
#[derive(Clone, Default)]
pub struct ToolCatalog {
    tools: HashMap<ToolKind, Arc<dyn Tool>>,
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any previous tool of the same kind
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.kind(), tool);
    }

    pub fn with(mut self, tool: Arc<dyn Tool>) -> Self {
        self.register(tool);
        self
    }

    pub fn contains(&self, kind: ToolKind) -> bool {
        self.tools.contains_key(&kind)
    }

    /// Resolve a grant into a toolbox; kinds missing from the catalog are skipped
    pub fn grant(&self, kinds: &[ToolKind]) -> Toolbox {
        let mut tools: Vec<Arc<dyn Tool>> = Vec::with_capacity(kinds.len());
        for kind in kinds {
            match self.tools.get(kind) {
                Some(tool) => tools.push(Arc::clone(tool)),
                None => tracing::debug!(tool = %kind, "Tool not configured, not granted"),
            }
        }
        tools.sort_by_key(|tool| tool.kind());
        tools.dedup_by_key(|tool| tool.kind());
        Toolbox { tools }
    }
}

/// The tools granted to one worker
#[derive(Clone, Default)]
pub struct Toolbox {
    tools: Vec<Arc<dyn Tool>>,
}

impl Toolbox {
    /// A toolbox with no capabilities
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn kinds(&self) -> Vec<ToolKind> {
        self.tools.iter().map(|tool| tool.kind()).collect()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|tool| tool.kind().definition()).collect()
    }

    /// Dispatch a tool call requested by the model
    pub async fn invoke(&self, name: &str, input: &Value) -> Result<String, ToolError> {
        let kind = ToolKind::from_name(name).ok_or_else(|| ToolError::Unknown(name.to_string()))?;
        let tool = self
            .tools
            .iter()
            .find(|tool| tool.kind() == kind)
            .ok_or(ToolError::NotGranted(kind))?;
        tool.invoke(input).await
    }
}

impl fmt::Debug for Toolbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.kinds()).finish()
    }
}
