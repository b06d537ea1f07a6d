//! Configuration loading
//!
//! Settings live in `.devteam.toml`. The file is looked up by walking up from
//! the current directory, then in the global config directory; missing files
//! and missing keys fall back to defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Name of the configuration file
pub const CONFIG_FILE: &str = ".devteam.toml";

/// Find a config file by walking up the directory tree, then checking global config.
///
/// Search order:
/// 1. Current directory and parent directories (walking up to root)
/// 2. Global config at ~/.config/devteam/
fn find_config_file(filename: &str) -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let candidate = current.join(filename);
        if candidate.exists() {
            return Some(candidate);
        }

        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => break,
        }
    }

    let global_path = dirs::config_dir()?.join("devteam").join(filename);
    global_path.exists().then_some(global_path)
}

/// Top-level configuration (from .devteam.toml)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    #[serde(default)]
    pub team: TeamSectionConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

/// LLM configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_ollama_url")]
    pub url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

/// Workspace the agents operate in
#[derive(Debug, Clone, Deserialize)]
pub struct WorkspaceConfig {
    #[serde(default = "default_workspace_root")]
    pub root: String,
    /// Extensions indexed for codebase questions
    #[serde(default = "default_file_types")]
    pub file_types: Vec<String>,
}

/// Team workflow section
#[derive(Debug, Clone, Deserialize)]
pub struct TeamSectionConfig {
    /// Maximum worker invocations per collaborative run
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    /// Retry a worker once after a transient failure
    #[serde(default = "default_true")]
    pub retry_transient: bool,
    /// Maximum tool-calling rounds inside one worker invocation
    #[serde(default = "default_max_tool_iterations")]
    pub max_tool_iterations: usize,
}

/// Command and file tool section
#[derive(Debug, Clone, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_shell")]
    pub shell: String,
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,
    /// Regex patterns for commands that are never run
    #[serde(default = "default_deny_patterns")]
    pub deny_patterns: Vec<String>,
}

/// Web search section
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchConfig {
    /// SearXNG instance; web search is unavailable when unset
    pub searxng_url: Option<String>,
    #[serde(default = "default_search_limit")]
    pub limit: usize,
}

/// Retrieval index section
#[derive(Debug, Clone, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

// Default value functions
fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "qwen3-coder:30b".to_string()
}

fn default_embedding_model() -> String {
    "nomic-embed-text".to_string()
}

fn default_llm_timeout() -> u64 {
    300
}

fn default_workspace_root() -> String {
    "./ai_workspace".to_string()
}

fn default_file_types() -> Vec<String> {
    [
        ".py", ".md", ".txt", ".json", ".yml", ".yaml", ".csv", ".jsx", ".ts", ".tsx", ".rs",
        ".java", ".c", ".cc", ".cpp", ".h", ".htmx", ".vb", ".go", ".sh", ".bash", ".zsh", ".rb",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_max_steps() -> usize {
    10
}

fn default_true() -> bool {
    true
}

fn default_max_tool_iterations() -> usize {
    10
}

fn default_shell() -> String {
    "/bin/bash".to_string()
}

fn default_command_timeout() -> u64 {
    120
}

fn default_max_output_bytes() -> usize {
    64 * 1024
}

fn default_deny_patterns() -> Vec<String> {
    vec![
        r"rm\s+(-[a-zA-Z]*f[a-zA-Z]*\s+)?/\s*$".to_string(),
        r"rm\s+(-[a-zA-Z]*f[a-zA-Z]*\s+)?/\s".to_string(),
        r"mkfs(\.|\s)".to_string(),
        r":\(\)\s*\{\s*:\|:&\s*\};:".to_string(),
    ]
}

fn default_search_limit() -> usize {
    3
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    100
}

fn default_top_k() -> usize {
    5
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            url: default_ollama_url(),
            model: default_model(),
            embedding_model: default_embedding_model(),
            temperature: 0.0,
            timeout_secs: default_llm_timeout(),
        }
    }
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: default_workspace_root(),
            file_types: default_file_types(),
        }
    }
}

impl Default for TeamSectionConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            retry_transient: true,
            max_tool_iterations: default_max_tool_iterations(),
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            shell: default_shell(),
            command_timeout_secs: default_command_timeout(),
            max_output_bytes: default_max_output_bytes(),
            deny_patterns: default_deny_patterns(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            top_k: default_top_k(),
        }
    }
}

impl WorkspaceConfig {
    /// Absolute workspace root with `~` and environment variables expanded
    pub fn resolved_root(&self) -> Result<PathBuf> {
        let expanded = shellexpand::full(&self.root)
            .with_context(|| format!("Failed to expand workspace path {}", self.root))?;
        let path = PathBuf::from(expanded.as_ref());
        if path.is_absolute() {
            return Ok(path);
        }
        let cwd = std::env::current_dir().context("Failed to read current directory")?;
        Ok(cwd.join(path))
    }
}

impl AppConfig {
    /// Load config from .devteam.toml
    ///
    /// Search order:
    /// 1. Walk up directory tree from cwd looking for .devteam.toml
    /// 2. Check ~/.config/devteam/.devteam.toml (global fallback)
    /// 3. Fall back to defaults
    pub fn load() -> Result<Self> {
        if let Some(config_path) = find_config_file(CONFIG_FILE) {
            tracing::debug!("Loading config from: {}", config_path.display());
            return Self::load_from_path(&config_path);
        }

        tracing::debug!("No {} found, using defaults", CONFIG_FILE);
        Ok(Self::default())
    }

    /// Load from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Parse from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
