//! Running one task from the CLI
//!
//! Wires a session run to the terminal: step and agent events are printed
//! as they arrive and Ctrl-C cancels the active run.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::agent::{AgentError, EventReceiver};
use crate::orchestrator::step_channel;
use crate::output::{OutputEvent, OutputWriter};
use crate::router::Route;
use crate::session::{Session, SessionOutcome};

/// Print agent events (tool activity) until the channel closes
pub fn spawn_event_printer(
    mut events: EventReceiver,
    output: Arc<dyn OutputWriter>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if let Some(event) = OutputEvent::from_agent_event(event) {
                output.write(event);
                output.flush();
            }
        }
    })
}

/// Cancel `cancel` on the first Ctrl-C
fn spawn_interrupt_watcher(
    cancel: CancellationToken,
    output: Arc<dyn OutputWriter>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            output.write(OutputEvent::Warning(
                "Interrupted, stopping after the current step".to_string(),
            ));
            cancel.cancel();
        }
    })
}

/// Route (unless forced) and run `task`, printing progress and the result
///
/// Returns `Ok(None)` when a direct answer was interrupted.
pub async fn execute_task(
    session: &mut Session,
    output: Arc<dyn OutputWriter>,
    task: &str,
    forced: Option<Route>,
) -> Result<Option<SessionOutcome>, AgentError> {
    let cancel = CancellationToken::new();
    let watcher = spawn_interrupt_watcher(cancel.clone(), Arc::clone(&output));

    let (steps, mut step_events) = step_channel();
    let step_output = Arc::clone(&output);
    let printer = tokio::spawn(async move {
        while let Some(event) = step_events.recv().await {
            step_output.write(OutputEvent::from(&event));
            step_output.flush();
        }
    });

    let route = match forced {
        Some(route) => route,
        None => session.route(task).await,
    };
    output.write(OutputEvent::Status(format!("Route: {}", route)));

    // The team engine observes the token itself; a direct answer is abandoned
    let result = tokio::select! {
        result = session.run_route(route, task, &cancel, Some(&steps)) => Some(result),
        _ = cancel.cancelled(), if route == Route::Direct => None,
    };

    drop(steps);
    let _ = printer.await;
    watcher.abort();

    match result {
        Some(Ok(outcome)) => {
            match &outcome {
                SessionOutcome::Direct(answer) => {
                    output.write(OutputEvent::NewLine);
                    output.write(OutputEvent::Text(answer.clone()));
                }
                SessionOutcome::Team(run) => {
                    output.write(OutputEvent::Outcome {
                        done: run.is_done(),
                        summary: run.summary(),
                    });
                }
            }
            output.write(OutputEvent::NewLine);
            output.flush();
            Ok(Some(outcome))
        }
        Some(Err(e)) => {
            output.write(OutputEvent::Error(e.to_string()));
            output.flush();
            Err(e)
        }
        None => {
            output.write(OutputEvent::Warning("Direct answer cancelled".to_string()));
            output.flush();
            Ok(None)
        }
    }
}
