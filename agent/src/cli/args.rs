//! CLI argument definitions
//!
//! Contains the main CLI struct and Commands enum for clap parsing.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::config::AppConfig;
use crate::router::Route;

#[derive(Parser, Debug)]
#[command(name = "devteam")]
#[command(about = "Route development tasks to a single agent or a planner/implementer/verifier/reviewer team")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Ollama server URL (default: from .devteam.toml or http://localhost:11434)
    #[arg(long, env = "OLLAMA_URL", global = true)]
    pub ollama_url: Option<String>,

    /// Model to use (default: from .devteam.toml)
    #[arg(short = 'm', long, env = "OLLAMA_MODEL", global = true)]
    pub model: Option<String>,

    /// Workspace directory the tools operate in
    #[arg(short = 'w', long, global = true)]
    pub workspace: Option<String>,

    /// Explicit config file instead of the .devteam.toml lookup
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v info, -vv debug, -vvv trace). Default is warn.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Interactive session (default)
    Chat,
    /// Run a single task and exit
    Run {
        /// Task description
        task: String,
        /// Skip routing and use the team workflow
        #[arg(long, conflicts_with = "direct")]
        team: bool,
        /// Skip routing and answer with the direct agent
        #[arg(long)]
        direct: bool,
    },
    /// Show how a task would be routed without running it
    Route {
        /// Task description
        task: String,
    },
    /// Build the workspace index for codebase questions
    Index,
}

impl Commands {
    /// Route forced by `run --team` or `run --direct`
    pub fn forced_route(&self) -> Option<Route> {
        match self {
            Commands::Run { team: true, .. } => Some(Route::Collaborative),
            Commands::Run { direct: true, .. } => Some(Route::Direct),
            _ => None,
        }
    }
}

impl Cli {
    /// Apply command-line overrides on top of the loaded configuration
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(url) = &self.ollama_url {
            config.llm.url = url.clone();
        }
        if let Some(model) = &self.model {
            config.llm.model = model.clone();
        }
        if let Some(workspace) = &self.workspace {
            config.workspace.root = workspace.clone();
        }
    }
}
