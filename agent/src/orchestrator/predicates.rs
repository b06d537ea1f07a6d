//! Transition predicates over worker output
//!
//! Both checks are case-insensitive substring tests: a report that merely
//! mentions "error handling" counts as a failure, and "LGTM" inside a longer
//! review counts as acceptance.

use super::state::{Next, Stage};

/// Whether a verifier report means the tests did not pass
pub fn verifier_signals_failure(report: &str) -> bool {
    let report = report.to_lowercase();
    report.contains("error") || report.contains("fail")
}

/// Whether a review accepts the code
pub fn reviewer_accepts(review: &str) -> bool {
    review.to_lowercase().contains("lgtm")
}

/// Next state after `stage` produced `output`
pub fn transition(stage: Stage, output: &str) -> Next {
    match stage {
        Stage::Architect => Next::Stage(Stage::Coder),
        Stage::Coder => Next::Stage(Stage::Tester),
        Stage::Tester if verifier_signals_failure(output) => Next::Stage(Stage::Coder),
        Stage::Tester => Next::Stage(Stage::Reviewer),
        Stage::Reviewer if reviewer_accepts(output) => Next::Done,
        Stage::Reviewer => Next::Stage(Stage::Coder),
    }
}
