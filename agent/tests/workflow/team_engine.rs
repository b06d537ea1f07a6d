//! Team engine: state machine paths, step cap, cancellation, retries

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use devteam::llm::LlmError;
use devteam::orchestrator::{
    step_channel, Next, RunOutcome, RunStatus, Stage, TeamConfig, TeamEngine, TeamError,
    WorkerError,
};

use crate::common::{transient_error, ScriptedWorker};

use Stage::{Architect, Coder, Reviewer, Tester};

const TASK: &str = "write a function that adds two numbers and test it";

async fn run(worker: &Arc<ScriptedWorker>) -> RunOutcome {
    run_with(worker, TeamConfig::default(), &CancellationToken::new()).await
}

async fn run_with(
    worker: &Arc<ScriptedWorker>,
    config: TeamConfig,
    cancel: &CancellationToken,
) -> RunOutcome {
    let engine = TeamEngine::new(worker.clone(), config);
    let outcome = engine.run(TASK, cancel, None).await;
    assert_eq!(
        outcome.state.agent_log().len(),
        outcome.state.invocations(),
        "log must hold one entry per completed invocation"
    );
    assert_eq!(outcome.worker_calls, worker.calls.lock().unwrap().len());
    outcome
}

// =============================================================================
// Transitions
// =============================================================================

#[tokio::test]
async fn test_happy_path_runs_each_role_once() {
    let worker = Arc::new(ScriptedWorker::new());
    let outcome = run(&worker).await;

    assert!(outcome.is_done());
    assert_eq!(worker.stages(), vec![Architect, Coder, Tester, Reviewer]);

    let state = &outcome.state;
    assert_eq!(state.task(), TASK);
    assert_eq!(state.invocations(), 4);
    assert_eq!(state.plan(), Some("1. write add(a, b)\n2. test it"));
    assert_eq!(state.code(), Some("def add(a, b):\n    return a + b"));
    assert_eq!(state.test_results(), Some("Ran 2 tests. OK"));
    assert_eq!(state.review_comments(), Some("Looks clean. LGTM"));

    let log: Vec<&str> = state.agent_log().iter().map(|e| e.message.as_str()).collect();
    assert!(log[0].starts_with("Architect created a plan: "));
    assert!(log[1].starts_with("Coder wrote the code: "));
    assert_eq!(log[2], "Tester ran tests. Results: Ran 2 tests. OK");
    assert_eq!(log[3], "Reviewer provided feedback: Looks clean. LGTM");
}

#[tokio::test]
async fn test_failing_tests_loop_back_with_report() {
    let worker = Arc::new(
        ScriptedWorker::new().script(Tester, &["AssertionError: add(2, 2) returned 5"]),
    );
    let outcome = run(&worker).await;

    assert!(outcome.is_done());
    assert_eq!(
        worker.stages(),
        vec![Architect, Coder, Tester, Coder, Tester, Reviewer]
    );

    let coder_calls = worker.calls_for(Coder);
    assert_eq!(coder_calls[0].feedback, None);
    assert_eq!(
        coder_calls[1].feedback.as_deref(),
        Some("tests: AssertionError: add(2, 2) returned 5")
    );
    // The plan is written once and reused on every revision
    assert_eq!(coder_calls[0].plan, coder_calls[1].plan);
    assert_eq!(worker.calls_for(Architect).len(), 1);
    assert!(coder_calls[1].message.contains("returned 5"));

    assert_eq!(outcome.state.test_results(), Some("Ran 2 tests. OK"));
}

#[tokio::test]
async fn test_review_changes_loop_back_with_comments() {
    let worker = Arc::new(
        ScriptedWorker::new().script(Reviewer, &["Rename `add` to `sum` and add a docstring."]),
    );
    let outcome = run(&worker).await;

    assert!(outcome.is_done());
    assert_eq!(
        worker.stages(),
        vec![Architect, Coder, Tester, Reviewer, Coder, Tester, Reviewer]
    );
    let coder_calls = worker.calls_for(Coder);
    assert_eq!(
        coder_calls[1].feedback.as_deref(),
        Some("review: Rename `add` to `sum` and add a docstring.")
    );
    assert_eq!(outcome.state.review_comments(), Some("Looks clean. LGTM"));
    assert_eq!(outcome.state.invocations(), 7);
}

#[tokio::test]
async fn test_fail_fix_pass_approve_walkthrough() {
    let worker = Arc::new(
        ScriptedWorker::new()
            .script(Tester, &["1 failed, 1 error"])
            .always(Tester, "All tests passed")
            .always(Reviewer, "LGTM"),
    );
    let engine = TeamEngine::new(worker.clone(), TeamConfig::default());
    let (sender, mut receiver) = step_channel();
    let outcome = engine.run(TASK, &CancellationToken::new(), Some(&sender)).await;
    drop(sender);

    let mut path = Vec::new();
    while let Some(event) = receiver.recv().await {
        path.push((event.stage, event.next));
    }
    assert_eq!(
        path,
        vec![
            (Architect, Next::Stage(Coder)),
            (Coder, Next::Stage(Tester)),
            (Tester, Next::Stage(Coder)),
            (Coder, Next::Stage(Tester)),
            (Tester, Next::Stage(Reviewer)),
            (Reviewer, Next::Done),
        ]
    );
    assert!(outcome.is_done());
    assert_eq!(outcome.worker_calls, 6);
    assert_eq!(
        worker.calls_for(Coder)[1].feedback.as_deref(),
        Some("tests: 1 failed, 1 error")
    );
    assert_eq!(outcome.state.test_results(), Some("All tests passed"));
    assert_eq!(
        outcome.state.log_tail().map(|e| e.message.as_str()),
        Some("Reviewer provided feedback: LGTM")
    );
}

#[tokio::test]
async fn test_rename_request_goes_back_to_coder() {
    let worker = Arc::new(
        ScriptedWorker::new()
            .script(Reviewer, &["Please rename variable x"])
            .always(Tester, "All tests passed"),
    );
    let outcome = run(&worker).await;

    assert!(outcome.is_done());
    assert_eq!(
        worker.stages(),
        vec![Architect, Coder, Tester, Reviewer, Coder, Tester, Reviewer]
    );
    assert_eq!(
        worker.calls_for(Coder)[1].feedback.as_deref(),
        Some("review: Please rename variable x")
    );
}

#[tokio::test]
async fn test_verdicts_are_case_insensitive() {
    let worker = Arc::new(
        ScriptedWorker::new()
            .script(Tester, &["1 test FAILED"])
            .always(Reviewer, "lgtm!"),
    );
    let outcome = run(&worker).await;

    assert!(outcome.is_done());
    assert_eq!(worker.calls_for(Coder).len(), 2);
}

// =============================================================================
// Step cap
// =============================================================================

#[tokio::test]
async fn test_tester_that_always_fails_hits_the_cap() {
    let worker = Arc::new(ScriptedWorker::new().always(Tester, "Error: add is not defined"));
    let outcome = run(&worker).await;

    assert_eq!(outcome.state.invocations(), 10);
    assert_eq!(worker.calls.lock().unwrap().len(), 10);
    assert_eq!(
        worker.stages(),
        vec![Architect, Coder, Tester, Coder, Tester, Coder, Tester, Coder, Tester, Coder]
    );
    match &outcome.status {
        RunStatus::Failed {
            stage,
            error: TeamError::RetryBudgetExhausted { max },
        } => {
            assert_eq!(*stage, Tester);
            assert_eq!(*max, 10);
        }
        other => panic!("Expected retry budget failure, got {:?}", other),
    }
    // Accumulated work survives the failure
    assert!(outcome.state.code().is_some());
    assert!(outcome.summary().contains("retry budget exhausted"));
}

#[tokio::test]
async fn test_reviewer_that_never_accepts_hits_the_cap() {
    let worker = Arc::new(ScriptedWorker::new().always(Reviewer, "Needs more work."));
    let config = TeamConfig {
        max_steps: 6,
        ..TeamConfig::default()
    };
    let outcome = run_with(&worker, config, &CancellationToken::new()).await;

    assert_eq!(outcome.state.invocations(), 6);
    assert!(matches!(
        outcome.status,
        RunStatus::Failed {
            error: TeamError::RetryBudgetExhausted { max: 6 },
            ..
        }
    ));
}

#[tokio::test]
async fn test_transient_retry_counts_against_the_cap() {
    let worker = Arc::new(
        ScriptedWorker::new()
            .always(Tester, "FAIL: assertion error")
            .fail_once(Coder, transient_error()),
    );
    let outcome = run(&worker).await;

    let calls = worker.calls.lock().unwrap().len();
    assert!(calls <= 10, "made {} worker calls", calls);
    assert_eq!(calls, 10);
    assert_eq!(outcome.worker_calls, 10);
    // The retried attempt is a call but not a log entry
    assert_eq!(outcome.state.invocations(), 9);
    assert!(matches!(
        outcome.status,
        RunStatus::Failed {
            stage: Coder,
            error: TeamError::RetryBudgetExhausted { max: 10 },
        }
    ));
}

#[tokio::test]
async fn test_no_retry_once_the_cap_is_reached() {
    // The fifth coder call is the tenth worker call and fails transiently
    let worker = Arc::new(
        ScriptedWorker::new()
            .always(Tester, "FAIL: assertion error")
            .script(Coder, &["v1", "v2", "v3", "v4"])
            .fail_once(Coder, transient_error()),
    );
    let outcome = run(&worker).await;

    assert_eq!(worker.calls.lock().unwrap().len(), 10);
    assert_eq!(worker.calls_for(Coder).len(), 5);
    assert_eq!(outcome.state.invocations(), 9);
    assert!(matches!(
        outcome.status,
        RunStatus::Failed {
            stage: Coder,
            error: TeamError::RetryBudgetExhausted { max: 10 },
        }
    ));
    assert_eq!(outcome.state.code(), Some("v4"));
}

// =============================================================================
// Cancellation
// =============================================================================

#[tokio::test]
async fn test_cancel_during_coder_stops_before_tester() {
    let cancel = CancellationToken::new();
    let worker = Arc::new(ScriptedWorker::new().cancel_during(Coder, cancel.clone()));
    let outcome = run_with(&worker, TeamConfig::default(), &cancel).await;

    assert!(matches!(outcome.status, RunStatus::Cancelled { at: Tester }));
    assert_eq!(worker.stages(), vec![Architect, Coder]);
    // The in-flight step completes and is kept
    assert!(outcome.state.plan().is_some());
    assert!(outcome.state.code().is_some());
    assert_eq!(outcome.state.test_results(), None);
    assert_eq!(outcome.state.invocations(), 2);
}

#[tokio::test]
async fn test_cancel_before_start() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let worker = Arc::new(ScriptedWorker::new());
    let outcome = run_with(&worker, TeamConfig::default(), &cancel).await;

    assert!(matches!(outcome.status, RunStatus::Cancelled { at: Architect }));
    assert!(worker.stages().is_empty());
    assert_eq!(outcome.state.plan(), None);
}

// =============================================================================
// Worker failures
// =============================================================================

#[tokio::test]
async fn test_transient_failure_is_retried_once() {
    let worker = Arc::new(ScriptedWorker::new().fail_once(Coder, transient_error()));
    let outcome = run(&worker).await;

    assert!(outcome.is_done());
    assert_eq!(worker.calls_for(Coder).len(), 2);
    // The failed attempt leaves no trace in the state
    assert_eq!(outcome.state.invocations(), 4);
}

#[tokio::test]
async fn test_second_transient_failure_fails_the_run() {
    let worker = Arc::new(
        ScriptedWorker::new()
            .fail_once(Tester, transient_error())
            .fail_once(Tester, transient_error()),
    );
    let outcome = run(&worker).await;

    match &outcome.status {
        RunStatus::Failed {
            stage: Tester,
            error: TeamError::Worker { stage, .. },
        } => assert_eq!(*stage, Tester),
        other => panic!("Expected worker failure, got {:?}", other),
    }
    assert_eq!(outcome.state.invocations(), 2);
    assert!(outcome.state.code().is_some());
}

#[tokio::test]
async fn test_retry_can_be_disabled() {
    let worker = Arc::new(ScriptedWorker::new().fail_once(Architect, transient_error()));
    let config = TeamConfig {
        retry_transient: false,
        ..TeamConfig::default()
    };
    let outcome = run_with(&worker, config, &CancellationToken::new()).await;

    assert!(matches!(
        outcome.status,
        RunStatus::Failed {
            stage: Architect,
            ..
        }
    ));
    assert_eq!(worker.calls.lock().unwrap().len(), 1);
    assert_eq!(outcome.state.invocations(), 0);
}

#[tokio::test]
async fn test_permanent_failure_is_not_retried() {
    let error = WorkerError::Agent(LlmError::Decode("not json".to_string()).into());
    let worker = Arc::new(ScriptedWorker::new().fail_once(Coder, error));
    let outcome = run(&worker).await;

    assert!(matches!(outcome.status, RunStatus::Failed { stage: Coder, .. }));
    assert_eq!(worker.calls_for(Coder).len(), 1);
    assert_eq!(outcome.state.invocations(), 1);
}

#[tokio::test]
async fn test_empty_output_fails_the_run() {
    let worker = Arc::new(ScriptedWorker::new().script(Coder, &["   "]));
    let outcome = run(&worker).await;

    match &outcome.status {
        RunStatus::Failed {
            stage: Coder,
            error:
                TeamError::Worker {
                    source: WorkerError::EmptyOutput(Coder),
                    ..
                },
        } => {}
        other => panic!("Expected empty output failure, got {:?}", other),
    }
    assert_eq!(outcome.state.code(), None);
    // The rejected call is still logged
    assert_eq!(worker.calls.lock().unwrap().len(), 2);
    assert_eq!(outcome.state.invocations(), 2);
    assert_eq!(outcome.state.visited(), vec![Architect, Coder]);
}

#[tokio::test]
async fn test_empty_review_sends_work_back_to_coder() {
    let worker = Arc::new(ScriptedWorker::new().script(Reviewer, &[""]));
    let outcome = run(&worker).await;

    assert!(outcome.is_done());
    assert_eq!(
        worker.stages(),
        vec![Architect, Coder, Tester, Reviewer, Coder, Tester, Reviewer]
    );
    assert_eq!(outcome.state.invocations(), worker.calls.lock().unwrap().len());
    assert_eq!(
        outcome.state.agent_log()[3].message,
        "Reviewer provided feedback: "
    );
    assert_eq!(
        worker.calls_for(Coder)[1].feedback.as_deref(),
        Some("review: ")
    );
}

// =============================================================================
// Step events
// =============================================================================

#[tokio::test]
async fn test_step_events_follow_the_run() {
    let worker = Arc::new(ScriptedWorker::new().script(Tester, &["1 failed"]));
    let engine = TeamEngine::new(worker.clone(), TeamConfig::default());
    let (sender, mut receiver) = step_channel();

    let outcome = engine.run(TASK, &CancellationToken::new(), Some(&sender)).await;
    drop(sender);

    let mut events = Vec::new();
    while let Some(event) = receiver.recv().await {
        events.push(event);
    }

    assert_eq!(events.len(), outcome.state.invocations());
    for (i, event) in events.iter().enumerate() {
        assert_eq!(event.step, i + 1);
        assert_eq!(event.state.invocations(), i + 1);
        assert_eq!(event.state.log_tail(), Some(&event.log_entry));
    }
    assert_eq!(events[2].stage, Tester);
    assert_eq!(events[2].next, Next::Stage(Coder));
    assert_eq!(events.last().map(|e| e.next), Some(Next::Done));
}
