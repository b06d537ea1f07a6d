//! Session: routes each task and keeps the conversation history
//!
//! A session owns every long-lived component, built once from the resolved
//! configuration: the router, the direct agent, the team engine and the
//! workspace index. At most one run is active at a time.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use crate::agent::{Agent, AgentError, EventSender};
use crate::config::AppConfig;
use crate::llm::{Llm, Message, OllamaClient};
use crate::orchestrator::prompts::direct_prompt;
use crate::orchestrator::{LlmWorkers, RunOutcome, StepSender, TeamConfig, TeamEngine};
use crate::retrieval::{CodeIndex, IndexError, IndexStats, SharedIndex, VectorIndex};
use crate::router::{Route, Router};
use crate::tools::{
    AskHumanTool, CodebaseQaTool, CommandRunner, CommandTool, ListDirectoryTool, ReadFileTool,
    Sandbox, ToolCatalog, ToolKind, WebSearchTool, WriteFileTool,
};

/// Result of one routed task
#[derive(Debug)]
pub enum SessionOutcome {
    /// Answer from the direct agent
    Direct(String),
    /// Terminal outcome of a team run
    Team(RunOutcome),
}

impl SessionOutcome {
    pub fn route(&self) -> Route {
        match self {
            SessionOutcome::Direct(_) => Route::Direct,
            SessionOutcome::Team(_) => Route::Collaborative,
        }
    }
}

pub struct Session {
    router: Router,
    direct: Agent,
    team: TeamEngine,
    index: SharedIndex,
    workspace: PathBuf,
    history: Vec<Message>,
}

impl Session {
    /// Assemble a session from its components
    pub fn new(
        router: Router,
        direct: Agent,
        team: TeamEngine,
        index: SharedIndex,
        workspace: PathBuf,
    ) -> Self {
        Self {
            router,
            direct,
            team,
            index,
            workspace,
            history: Vec::new(),
        }
    }

    /// Build a session backed by Ollama, creating the workspace if needed
    pub fn from_config(config: &AppConfig, agent_events: Option<EventSender>) -> Result<Self> {
        let workspace = config.workspace.resolved_root()?;
        std::fs::create_dir_all(&workspace)
            .with_context(|| format!("Failed to create workspace {}", workspace.display()))?;

        let llm: Arc<dyn Llm> = Arc::new(
            OllamaClient::new(&config.llm.url, &config.llm.model)
                .with_embedding_model(&config.llm.embedding_model)
                .with_temperature(config.llm.temperature)
                .with_timeout(Duration::from_secs(config.llm.timeout_secs)),
        );

        let index = VectorIndex::new(
            Arc::clone(&llm),
            workspace.clone(),
            &config.workspace,
            &config.retrieval,
        )
        .shared();
        let catalog = build_catalog(config, &workspace, Arc::clone(&index))?;

        let mut workers = LlmWorkers::new(
            Arc::clone(&llm),
            &catalog,
            config.team.max_tool_iterations,
        );
        let mut direct = Agent::new("direct", Arc::clone(&llm), &direct_prompt(&workspace))
            .with_toolbox(catalog.grant(&ToolKind::ALL))
            .with_max_iterations(config.team.max_tool_iterations);
        if let Some(sender) = agent_events {
            workers = workers.with_event_sender(sender.clone());
            direct = direct.with_event_sender(sender);
        }

        tracing::info!(
            model = %config.llm.model,
            workspace = %workspace.display(),
            tools = ?direct.toolbox(),
            "Session ready"
        );

        let team = TeamEngine::new(Arc::new(workers), TeamConfig::from(&config.team));
        Ok(Self::new(Router::new(llm), direct, team, index, workspace))
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Classify a task against the current history
    pub async fn route(&self, task: &str) -> Route {
        self.router.route(task, &self.history).await
    }

    /// Route `task`, run it on the chosen path and record it in history
    pub async fn route_and_run(
        &mut self,
        task: &str,
        cancel: &CancellationToken,
        steps: Option<&StepSender>,
    ) -> Result<SessionOutcome, AgentError> {
        let route = self.route(task).await;
        self.run_route(route, task, cancel, steps).await
    }

    /// Run `task` on a given path
    pub async fn run_route(
        &mut self,
        route: Route,
        task: &str,
        cancel: &CancellationToken,
        steps: Option<&StepSender>,
    ) -> Result<SessionOutcome, AgentError> {
        match route {
            Route::Direct => self.run_direct(task).await.map(SessionOutcome::Direct),
            Route::Collaborative => Ok(SessionOutcome::Team(
                self.run_team(task, cancel, steps).await,
            )),
        }
    }

    /// Answer with the direct agent
    pub async fn run_direct(&mut self, task: &str) -> Result<String, AgentError> {
        let answer = self.direct.run(&self.history, task).await?;
        self.remember(task, answer.clone());
        Ok(answer)
    }

    /// Run the team workflow; its summary goes into history
    pub async fn run_team(
        &mut self,
        task: &str,
        cancel: &CancellationToken,
        steps: Option<&StepSender>,
    ) -> RunOutcome {
        let outcome = self.team.run(task, cancel, steps).await;
        self.remember(task, outcome.summary());
        outcome
    }

    /// Rebuild the workspace index
    pub async fn reindex(&self) -> Result<IndexStats, IndexError> {
        self.index.write().await.rebuild().await
    }

    fn remember(&mut self, task: &str, answer: String) {
        self.history.push(Message::user(task));
        self.history.push(Message::assistant(answer));
    }
}

/// Register every tool the configuration enables
pub fn build_catalog(
    config: &AppConfig,
    workspace: &Path,
    index: SharedIndex,
) -> Result<ToolCatalog> {
    let sandbox = Sandbox::new(workspace);
    let runner = CommandRunner::new(&config.tools, workspace.to_path_buf())
        .context("Invalid [tools] configuration")?;

    let mut catalog = ToolCatalog::new()
        .with(Arc::new(ReadFileTool::new(sandbox.clone())))
        .with(Arc::new(WriteFileTool::new(sandbox.clone())))
        .with(Arc::new(ListDirectoryTool::new(sandbox)))
        .with(Arc::new(CommandTool::shell(runner.clone())))
        .with(Arc::new(CommandTool::git(runner.clone())))
        .with(Arc::new(CommandTool::docker(runner)))
        .with(Arc::new(AskHumanTool::stdio()))
        .with(Arc::new(CodebaseQaTool::new(index, config.retrieval.top_k)));

    match &config.search.searxng_url {
        Some(url) => catalog.register(Arc::new(WebSearchTool::new(url, config.search.limit))),
        None => tracing::debug!("No searxng_url configured, web search disabled"),
    }

    Ok(catalog)
}
