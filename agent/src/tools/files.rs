//! Workspace file tools
//!
//! Every path is resolved against the workspace root and lexically
//! normalized; anything that would land outside the root is refused.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;

use super::{required_str, Tool, ToolError, ToolKind};

/// Path confinement for the workspace
#[derive(Debug, Clone)]
pub struct Sandbox {
    root: PathBuf,
}

impl Sandbox {
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            root: normalize(root).unwrap_or_else(|| root.to_path_buf()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a model-supplied path to an absolute path inside the root
    pub fn resolve(&self, path: &str) -> Result<PathBuf, ToolError> {
        if path.contains('\0') {
            return Err(ToolError::InvalidArguments(
                "path contains null byte".to_string(),
            ));
        }

        let requested = Path::new(path);
        let joined = if requested.is_absolute() {
            requested.to_path_buf()
        } else {
            self.root.join(requested)
        };

        match normalize(&joined) {
            Some(resolved) if resolved.starts_with(&self.root) => Ok(resolved),
            _ => Err(ToolError::OutsideWorkspace(path.to_string())),
        }
    }

    /// Path relative to the root, for messages
    fn display(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

/// Lexically resolve `.` and `..`; `None` when `..` climbs past the root
fn normalize(path: &Path) -> Option<PathBuf> {
    let mut resolved = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                if !resolved.pop() {
                    return None;
                }
            }
            Component::CurDir => {}
            other => resolved.push(other),
        }
    }
    Some(resolved)
}

fn not_found_or_io(err: std::io::Error, path: &str) -> ToolError {
    match err.kind() {
        std::io::ErrorKind::NotFound => ToolError::NotFound(path.to_string()),
        std::io::ErrorKind::InvalidData => {
            ToolError::InvalidArguments(format!("{} is not a UTF-8 text file", path))
        }
        _ => ToolError::Io(err),
    }
}

pub struct ReadFileTool {
    sandbox: Sandbox,
}

impl ReadFileTool {
    pub fn new(sandbox: Sandbox) -> Self {
        Self { sandbox }
    }
}

#[async_trait]
impl Tool for ReadFileTool {
    fn kind(&self) -> ToolKind {
        ToolKind::ReadFile
    }

    async fn invoke(&self, input: &Value) -> Result<String, ToolError> {
        let file_path = required_str(input, "file_path")?;
        let path = self.sandbox.resolve(file_path)?;
        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|e| not_found_or_io(e, file_path))?;
        if metadata.is_dir() {
            return Err(ToolError::InvalidArguments(format!(
                "{} is a directory, use list_directory",
                file_path
            )));
        }
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| not_found_or_io(e, file_path))
    }
}

pub struct WriteFileTool {
    sandbox: Sandbox,
}

impl WriteFileTool {
    pub fn new(sandbox: Sandbox) -> Self {
        Self { sandbox }
    }
}

#[async_trait]
impl Tool for WriteFileTool {
    fn kind(&self) -> ToolKind {
        ToolKind::WriteFile
    }

    async fn invoke(&self, input: &Value) -> Result<String, ToolError> {
        let file_path = required_str(input, "file_path")?;
        let text = required_str(input, "text")?;
        let path = self.sandbox.resolve(file_path)?;
        if path == self.sandbox.root() {
            return Err(ToolError::InvalidArguments(
                "file_path must name a file".to_string(),
            ));
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, text).await?;

        tracing::debug!(path = %path.display(), bytes = text.len(), "Wrote file");
        Ok(format!(
            "File written successfully to {}.",
            self.sandbox.display(&path)
        ))
    }
}

pub struct ListDirectoryTool {
    sandbox: Sandbox,
}

impl ListDirectoryTool {
    pub fn new(sandbox: Sandbox) -> Self {
        Self { sandbox }
    }
}

#[async_trait]
impl Tool for ListDirectoryTool {
    fn kind(&self) -> ToolKind {
        ToolKind::ListDirectory
    }

    async fn invoke(&self, input: &Value) -> Result<String, ToolError> {
        let dir_path = input
            .get("dir_path")
            .and_then(Value::as_str)
            .filter(|p| !p.trim().is_empty())
            .unwrap_or(".");
        let path = self.sandbox.resolve(dir_path)?;

        let mut reader = tokio::fs::read_dir(&path)
            .await
            .map_err(|e| not_found_or_io(e, dir_path))?;

        let mut entries = Vec::new();
        while let Some(entry) = reader.next_entry().await? {
            let mut name = entry.file_name().to_string_lossy().into_owned();
            if entry.file_type().await?.is_dir() {
                name.push('/');
            }
            entries.push(name);
        }
        entries.sort();

        if entries.is_empty() {
            return Ok(format!("No files found in directory {}", dir_path));
        }
        Ok(entries.join("\n"))
    }
}
