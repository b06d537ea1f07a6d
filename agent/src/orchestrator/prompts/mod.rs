//! System prompts for the team roles and the direct executor
//!
//! Each role has a prompt that defines its responsibilities and the shape of
//! its answer. The implementer and verifier also carry the shared
//! self-correction directives.

mod direct;
mod implementer;
mod planner;
mod reviewer;
mod tester;

pub use direct::direct_prompt;
pub use implementer::IMPLEMENTER_PROMPT;
pub use planner::PLANNER_PROMPT;
pub use reviewer::REVIEWER_PROMPT;
pub use tester::TESTER_PROMPT;

/// Directives appended to roles that run code and may hit errors
pub const SELF_CORRECTION_DIRECTIVES: &str = r#"## Core Directives
1. **Never give up**: you are persistent and resourceful. When something fails, analyze it and try to fix it.
2. **Self-correction loop**:
   a. When a tool returns an error (for example from running code), read the error message first.
   b. If it is a simple syntax error or a mistake you made, correct your approach and try again.
   c. If the error is unfamiliar or complex, use `web_search` (when available) to research it.
   d. After researching, update your approach and re-run the corrected steps.
3. **Ask for help when truly stuck**: after several failed attempts, or on a system-level problem you cannot solve (missing compiler, permissions), use `ask_human_for_clarification` (when available). State the problem and what you already tried.
"#;

/// Append the self-correction directives to a role prompt
pub fn with_directives(prompt: &str) -> String {
    format!("{}\n{}", prompt, SELF_CORRECTION_DIRECTIVES)
}
