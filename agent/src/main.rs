use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use devteam::agent::event_channel;
use devteam::cli::{execute_task, spawn_event_printer, Cli, Commands, Repl};
use devteam::config::AppConfig;
use devteam::output::{default_output, OutputEvent, OutputWriter};
use devteam::session::{Session, SessionOutcome};

/// Initialize tracing with the given verbosity level
///
/// - 0: warn (default)
/// - 1: info (-v)
/// - 2: debug (-vv)
/// - 3+: trace (-vvv)
fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    // Allow RUST_LOG to override if set
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string()));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI first to get verbosity before initializing tracing
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    cli.apply_overrides(&mut config);

    let output: Arc<dyn OutputWriter> = Arc::from(default_output(cli.verbose >= 1));
    let (events, event_rx) = event_channel();
    let printer = spawn_event_printer(event_rx, Arc::clone(&output));
    let mut session = Session::from_config(&config, Some(events))?;

    let command = cli.command.unwrap_or(Commands::Chat);
    let succeeded = match &command {
        Commands::Chat => {
            Repl::new(&mut session, Arc::clone(&output)).run().await?;
            true
        }
        Commands::Run { task, .. } => {
            match execute_task(&mut session, Arc::clone(&output), task, command.forced_route())
                .await
            {
                Ok(Some(SessionOutcome::Team(run))) => run.is_done(),
                Ok(Some(SessionOutcome::Direct(_))) => true,
                Ok(None) | Err(_) => false,
            }
        }
        Commands::Route { task } => {
            let route = session.route(task).await;
            output.write(OutputEvent::Text(route.to_string()));
            true
        }
        Commands::Index => match session.reindex().await {
            Ok(stats) => {
                output.write(OutputEvent::Status(format!(
                    "Indexed {} files ({} chunks) in {}",
                    stats.files,
                    stats.chunks,
                    session.workspace().display()
                )));
                true
            }
            Err(e) => {
                output.write(OutputEvent::Error(format!("Indexing failed: {}", e)));
                false
            }
        },
    };
    output.flush();

    // Closing the session closes the agent event channel
    drop(session);
    let _ = printer.await;

    if !succeeded {
        std::process::exit(1);
    }
    Ok(())
}
