//! Router: classification and fallback to the direct path

use std::sync::Arc;

use devteam::llm::{LlmError, Message};
use devteam::router::{Route, Router};

use crate::common::ScriptedLlm;

async fn route_with(reply: &str) -> Route {
    let llm = Arc::new(ScriptedLlm::texts(&[reply]));
    Router::new(llm).route("build a todo app with tests", &[]).await
}

#[tokio::test]
async fn test_clean_labels() {
    assert_eq!(route_with("collaborative").await, Route::Collaborative);
    assert_eq!(route_with("direct").await, Route::Direct);
    assert_eq!(route_with("  Collaborative\n").await, Route::Collaborative);
    assert_eq!(route_with("`DIRECT`").await, Route::Direct);
}

#[tokio::test]
async fn test_malformed_labels_default_to_direct() {
    assert_eq!(route_with("").await, Route::Direct);
    assert_eq!(route_with("team").await, Route::Direct);
    assert_eq!(
        route_with("I would say collaborative because it is big").await,
        Route::Direct
    );
}

#[tokio::test]
async fn test_model_failure_defaults_to_direct() {
    let llm = Arc::new(ScriptedLlm::new(vec![Err(LlmError::Api {
        status: 500,
        body: "boom".to_string(),
    })]));
    let route = Router::new(llm.clone()).route("build a web server", &[]).await;

    assert_eq!(route, Route::Direct);
    assert_eq!(llm.requests.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_blank_task_skips_the_model() {
    let llm = Arc::new(ScriptedLlm::texts(&["collaborative"]));
    let route = Router::new(llm.clone()).route("   ", &[]).await;

    assert_eq!(route, Route::Direct);
    assert!(llm.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_history_is_shown_to_the_classifier() {
    let llm = Arc::new(ScriptedLlm::texts(&["direct"]));
    let history = vec![
        Message::user("write add.py"),
        Message::assistant("Team run completed in 4 steps"),
    ];
    Router::new(llm.clone()).route("now explain it", &history).await;

    let requests = llm.requests.lock().unwrap();
    assert!(requests[0].tools.is_empty());
    let prompt = &requests[0].messages[0].content;
    assert!(prompt.contains("user: write add.py"));
    assert!(prompt.contains("assistant: Team run completed"));
    assert!(prompt.ends_with("now explain it"));
}
