//! Semantic index over workspace files
//!
//! Files matching the configured extensions are chunked, embedded through the
//! [`Llm`] backend and kept in memory. Questions are embedded the same way and
//! answered with the closest chunks by cosine similarity.

mod chunker;

pub use chunker::Chunker;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::config::{RetrievalConfig, WorkspaceConfig};
use crate::llm::{Llm, LlmError};

/// Chunks embedded per request
const EMBED_BATCH: usize = 32;

/// Errors raised while building or querying the index
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("invalid file pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("embedding failed: {0}")]
    Embed(#[from] LlmError),

    #[error("expected {expected} embeddings, got {got}")]
    EmbeddingCount { expected: usize, got: usize },
}

/// A chunk returned for a query
#[derive(Debug, Clone, PartialEq)]
pub struct Snippet {
    /// Path relative to the workspace root
    pub source: String,
    pub content: String,
    pub score: f32,
}

/// Outcome of a rebuild
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub files: usize,
    pub chunks: usize,
}

/// Searchable view of the workspace
#[async_trait]
pub trait CodeIndex: Send + Sync {
    /// Re-scan the workspace, replacing the previous index
    async fn rebuild(&mut self) -> Result<IndexStats, IndexError>;

    /// Whether an index exists to query
    fn is_ready(&self) -> bool;

    /// The `k` most relevant chunks; empty when nothing is indexed
    async fn query(&self, question: &str, k: usize) -> Result<Vec<Snippet>, IndexError>;
}

/// Index shared between the session and the codebase tool
pub type SharedIndex = Arc<RwLock<dyn CodeIndex>>;

#[derive(Debug, Clone)]
struct Entry {
    source: String,
    content: String,
    embedding: Vec<f32>,
}

/// In-memory embedding index
pub struct VectorIndex {
    llm: Arc<dyn Llm>,
    root: PathBuf,
    file_types: Vec<String>,
    chunker: Chunker,
    entries: Option<Vec<Entry>>,
}

impl VectorIndex {
    pub fn new(
        llm: Arc<dyn Llm>,
        root: PathBuf,
        workspace: &WorkspaceConfig,
        retrieval: &RetrievalConfig,
    ) -> Self {
        Self {
            llm,
            root,
            file_types: workspace.file_types.clone(),
            chunker: Chunker::new(retrieval.chunk_size, retrieval.chunk_overlap),
            entries: None,
        }
    }

    pub fn shared(self) -> SharedIndex {
        Arc::new(RwLock::new(self))
    }

    /// Workspace files with an indexed extension, deduplicated and sorted
    fn discover(&self) -> Result<Vec<PathBuf>, IndexError> {
        let root = glob::Pattern::escape(&self.root.to_string_lossy());
        let mut files = Vec::new();

        for ext in &self.file_types {
            let pattern = format!("{}/**/*{}", root, ext);
            for entry in glob::glob(&pattern)? {
                match entry {
                    Ok(path) if path.is_file() => files.push(path),
                    Ok(_) => {}
                    Err(e) => tracing::warn!(error = %e, "Skipping unreadable path"),
                }
            }
        }

        files.sort();
        files.dedup();
        Ok(files)
    }

    fn relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

#[async_trait]
impl CodeIndex for VectorIndex {
    async fn rebuild(&mut self) -> Result<IndexStats, IndexError> {
        let files = self.discover()?;

        let mut pending: Vec<(String, String)> = Vec::new();
        let mut indexed_files = 0;
        for path in &files {
            let text = match tokio::fs::read_to_string(path).await {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping file");
                    continue;
                }
            };
            let source = self.relative(path);
            let chunks = self.chunker.split(&text);
            if !chunks.is_empty() {
                indexed_files += 1;
            }
            pending.extend(chunks.into_iter().map(|chunk| (source.clone(), chunk)));
        }

        if pending.is_empty() {
            tracing::info!(root = %self.root.display(), "No files to index");
            self.entries = None;
            return Ok(IndexStats::default());
        }

        let mut entries = Vec::with_capacity(pending.len());
        for batch in pending.chunks(EMBED_BATCH) {
            let inputs: Vec<String> = batch.iter().map(|(_, content)| content.clone()).collect();
            let embeddings = self.llm.embed(&inputs).await?;
            if embeddings.len() != batch.len() {
                return Err(IndexError::EmbeddingCount {
                    expected: batch.len(),
                    got: embeddings.len(),
                });
            }
            for ((source, content), embedding) in batch.iter().zip(embeddings) {
                entries.push(Entry {
                    source: source.clone(),
                    content: content.clone(),
                    embedding,
                });
            }
        }

        let stats = IndexStats {
            files: indexed_files,
            chunks: entries.len(),
        };
        tracing::info!(files = stats.files, chunks = stats.chunks, "Workspace indexed");
        self.entries = Some(entries);
        Ok(stats)
    }

    fn is_ready(&self) -> bool {
        self.entries.is_some()
    }

    async fn query(&self, question: &str, k: usize) -> Result<Vec<Snippet>, IndexError> {
        let Some(entries) = &self.entries else {
            return Ok(Vec::new());
        };
        if k == 0 {
            return Ok(Vec::new());
        }

        let query = self.llm.embed(&[question.to_string()]).await?;
        let Some(query) = query.first() else {
            return Ok(Vec::new());
        };

        let mut scored: Vec<Snippet> = entries
            .iter()
            .map(|entry| Snippet {
                source: entry.source.clone(),
                content: entry.content.clone(),
                score: cosine_similarity(query, &entry.embedding),
            })
            .collect();
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);
        Ok(scored)
    }
}

/// Cosine similarity; zero for mismatched or zero-length vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
