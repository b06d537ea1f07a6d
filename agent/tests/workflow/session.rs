//! Session: routing plus history across tasks

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use devteam::agent::Agent;
use devteam::config::{RetrievalConfig, WorkspaceConfig};
use devteam::llm::{Llm, LlmError, Role};
use devteam::orchestrator::{TeamConfig, TeamEngine};
use devteam::retrieval::VectorIndex;
use devteam::router::{Route, Router};
use devteam::session::{Session, SessionOutcome};

use crate::common::{ScriptedLlm, ScriptedWorker};

struct Fixture {
    session: Session,
    router_llm: Arc<ScriptedLlm>,
    worker: Arc<ScriptedWorker>,
    _dir: tempfile::TempDir,
}

fn fixture(router_replies: &[&str], direct_llm: ScriptedLlm) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let router_llm = Arc::new(ScriptedLlm::texts(router_replies));
    let direct_llm: Arc<dyn Llm> = Arc::new(direct_llm);
    let worker = Arc::new(ScriptedWorker::new());

    let index = VectorIndex::new(
        Arc::clone(&direct_llm),
        dir.path().to_path_buf(),
        &WorkspaceConfig::default(),
        &RetrievalConfig::default(),
    )
    .shared();
    let session = Session::new(
        Router::new(router_llm.clone()),
        Agent::new("direct", direct_llm, "You are Dev-GPT."),
        TeamEngine::new(worker.clone(), TeamConfig::default()),
        index,
        dir.path().to_path_buf(),
    );

    Fixture {
        session,
        router_llm,
        worker,
        _dir: dir,
    }
}

#[tokio::test]
async fn test_direct_then_collaborative() {
    let mut fx = fixture(&["direct", "collaborative"], ScriptedLlm::texts(&["2 + 2 = 4"]));
    let cancel = CancellationToken::new();

    let first = fx
        .session
        .route_and_run("what is 2 + 2?", &cancel, None)
        .await
        .unwrap();
    match &first {
        SessionOutcome::Direct(answer) => assert_eq!(answer, "2 + 2 = 4"),
        other => panic!("Expected direct answer, got {:?}", other),
    }
    assert!(fx.worker.stages().is_empty());
    assert_eq!(fx.session.history().len(), 2);

    let second = fx
        .session
        .route_and_run("write add.py and test it", &cancel, None)
        .await
        .unwrap();
    assert_eq!(second.route(), Route::Collaborative);
    match &second {
        SessionOutcome::Team(outcome) => assert!(outcome.is_done()),
        other => panic!("Expected team outcome, got {:?}", other),
    }
    assert_eq!(fx.worker.stages().len(), 4);

    let history = fx.session.history();
    assert_eq!(history.len(), 4);
    assert_eq!(history[2].role, Role::User);
    assert_eq!(history[2].content, "write add.py and test it");
    assert!(history[3].content.starts_with("Team run completed in 4 steps"));

    // The second classification saw the first exchange
    let requests = fx.router_llm.requests.lock().unwrap();
    assert_eq!(requests.len(), 2);
    assert!(requests[1].messages[0].content.contains("what is 2 + 2?"));
}

#[tokio::test]
async fn test_unclear_route_answers_directly() {
    let mut fx = fixture(&["not sure"], ScriptedLlm::texts(&["Here you go."]));
    let outcome = fx
        .session
        .route_and_run("build me something", &CancellationToken::new(), None)
        .await
        .unwrap();

    assert_eq!(outcome.route(), Route::Direct);
    assert!(fx.worker.stages().is_empty());
}

#[tokio::test]
async fn test_forced_team_route_skips_the_router() {
    let mut fx = fixture(&[], ScriptedLlm::texts(&[]));
    let outcome = fx
        .session
        .run_route(Route::Collaborative, "write add.py", &CancellationToken::new(), None)
        .await
        .unwrap();

    assert_eq!(outcome.route(), Route::Collaborative);
    assert!(fx.router_llm.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_cancelled_team_run_is_still_recorded() {
    let mut fx = fixture(&["collaborative"], ScriptedLlm::texts(&[]));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let outcome = fx
        .session
        .route_and_run("write add.py", &cancel, None)
        .await
        .unwrap();
    match outcome {
        SessionOutcome::Team(run) => assert!(!run.is_done()),
        other => panic!("Expected team outcome, got {:?}", other),
    }
    let history = fx.session.history();
    assert_eq!(history.len(), 2);
    assert!(history[1].content.contains("cancelled"));
}

#[tokio::test]
async fn test_direct_failure_leaves_history_untouched() {
    let failing = ScriptedLlm::new(vec![Err(LlmError::Api {
        status: 400,
        body: "model not found".to_string(),
    })]);
    let mut fx = fixture(&["direct"], failing);

    let result = fx
        .session
        .route_and_run("hello", &CancellationToken::new(), None)
        .await;
    assert!(result.is_err());
    assert!(fx.session.history().is_empty());
}

#[tokio::test]
async fn test_reindex_empty_workspace() {
    let fx = fixture(&[], ScriptedLlm::texts(&[]));
    let stats = fx.session.reindex().await.unwrap();
    assert_eq!(stats.files, 0);
    assert_eq!(stats.chunks, 0);
}
