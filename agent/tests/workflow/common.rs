//! Scripted test doubles

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use devteam::llm::{Completion, CompletionRequest, Llm, LlmError};
use devteam::orchestrator::{Feedback, Stage, Worker, WorkerError, WorkerInput, WorkerResult};

/// What a worker was asked to do
#[derive(Debug, Clone)]
pub struct Call {
    pub stage: Stage,
    pub message: String,
    pub plan: Option<String>,
    pub feedback: Option<String>,
}

/// Worker that replays per-stage outputs
///
/// Once a stage's script is used up, its fallback output is returned.
pub struct ScriptedWorker {
    scripts: Mutex<HashMap<Stage, VecDeque<Result<String, WorkerError>>>>,
    fallback: HashMap<Stage, String>,
    cancel_on: Option<(Stage, CancellationToken)>,
    pub calls: Mutex<Vec<Call>>,
}

impl ScriptedWorker {
    /// Happy-path outputs: plan, code, passing tests, approval
    pub fn new() -> Self {
        let fallback = HashMap::from([
            (Stage::Architect, "1. write add(a, b)\n2. test it".to_string()),
            (Stage::Coder, "def add(a, b):\n    return a + b".to_string()),
            (Stage::Tester, "Ran 2 tests. OK".to_string()),
            (Stage::Reviewer, "Looks clean. LGTM".to_string()),
        ]);
        Self {
            scripts: Mutex::new(HashMap::new()),
            fallback,
            cancel_on: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue outputs for `stage`, consumed before the fallback
    pub fn script(self, stage: Stage, outputs: &[&str]) -> Self {
        {
            let mut scripts = self.scripts.lock().unwrap();
            let queue = scripts.entry(stage).or_default();
            queue.extend(outputs.iter().map(|o| Ok(o.to_string())));
        }
        self
    }

    /// Queue an error for the next invocation of `stage`
    pub fn fail_once(self, stage: Stage, error: WorkerError) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(stage)
            .or_default()
            .push_back(Err(error));
        self
    }

    /// Replace the fallback output for `stage`
    pub fn always(mut self, stage: Stage, output: &str) -> Self {
        self.fallback.insert(stage, output.to_string());
        self
    }

    /// Cancel `token` while `stage` is running
    pub fn cancel_during(mut self, stage: Stage, token: CancellationToken) -> Self {
        self.cancel_on = Some((stage, token));
        self
    }

    pub fn stages(&self) -> Vec<Stage> {
        self.calls.lock().unwrap().iter().map(|c| c.stage).collect()
    }

    pub fn calls_for(&self, stage: Stage) -> Vec<Call> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.stage == stage)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Worker for ScriptedWorker {
    async fn invoke(&self, input: WorkerInput<'_>) -> Result<WorkerResult, WorkerError> {
        let stage = input.stage();
        let (plan, feedback) = match input {
            WorkerInput::Implement { plan, feedback, .. } => (
                Some(plan.to_string()),
                feedback.map(|f| match f {
                    Feedback::TestFailure(report) => format!("tests: {}", report),
                    Feedback::Review(comments) => format!("review: {}", comments),
                }),
            ),
            _ => (None, None),
        };
        self.calls.lock().unwrap().push(Call {
            stage,
            message: input.render(),
            plan,
            feedback,
        });

        if let Some((cancel_stage, token)) = &self.cancel_on {
            if *cancel_stage == stage {
                token.cancel();
            }
        }

        let scripted = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&stage)
            .and_then(|queue| queue.pop_front());
        let output = match scripted {
            Some(result) => result?,
            None => self.fallback[&stage].clone(),
        };
        Ok(WorkerResult::for_stage(stage, output))
    }
}

/// Model that replays completions and records requests
///
/// Returns "done" once the script is used up.
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<Result<Completion, LlmError>>>,
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedLlm {
    pub fn new(replies: Vec<Result<Completion, LlmError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn texts(replies: &[&str]) -> Self {
        Self::new(replies.iter().map(|r| Ok(Completion::text(*r))).collect())
    }
}

#[async_trait]
impl Llm for ScriptedLlm {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Completion::text("done")))
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

/// A server error the engine treats as transient
pub fn transient_error() -> WorkerError {
    WorkerError::Agent(
        LlmError::Api {
            status: 503,
            body: "model loading".to_string(),
        }
        .into(),
    )
}
