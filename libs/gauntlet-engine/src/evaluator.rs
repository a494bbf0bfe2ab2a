/// Verdict Evaluator - output comparison
///
/// **Normalization Rules:**
/// - Trim leading whitespace: YES
/// - Trim trailing whitespace: YES
/// - Collapse internal whitespace: NO
/// - Case sensitivity: YES (exact match required)
/// - Floating-point tolerance: NO
///
/// Many judges ignore all whitespace differences; this one deliberately does
/// not. A trailing space inside a line is a wrong answer.
use gauntlet_common::types::{CaseVerdict, ExecutionResult, Fixture};

pub const REASON_WRONG_ANSWER: &str = "Wrong answer";
pub const REASON_COMPILE: &str = "Compilation failed";
pub const REASON_RUNTIME: &str = "Runtime error";
pub const REASON_TLE: &str = "TLE: Time Limit Exceeded";

fn normalize_output(output: &str) -> &str {
    output.trim()
}

/// Exact comparison after trimming both sides
pub fn evaluate(actual: &str, expected: &str) -> bool {
    normalize_output(actual) == normalize_output(expected)
}

/// Turn one fixture's execution result into a `CaseVerdict`.
///
/// Expected and actual output are attached only when the outputs differ.
pub fn judge_case(fixture: &Fixture, result: &ExecutionResult) -> CaseVerdict {
    match result {
        ExecutionResult::Success { stdout } => {
            if evaluate(stdout, &fixture.expected_output) {
                CaseVerdict::passed(&fixture.name)
            } else {
                CaseVerdict::failed(&fixture.name, REASON_WRONG_ANSWER)
                    .with_outputs(normalize_output(&fixture.expected_output), normalize_output(stdout))
            }
        }
        ExecutionResult::CompileFailure { diagnostics } => {
            CaseVerdict::failed(&fixture.name, REASON_COMPILE).with_details(diagnostics.as_str())
        }
        ExecutionResult::RuntimeFailure { stderr, exit_code } => {
            CaseVerdict::failed(&fixture.name, format!("{} (exit code {})", REASON_RUNTIME, exit_code))
                .with_details(stderr.as_str())
        }
        ExecutionResult::TimeExceeded => CaseVerdict::failed(&fixture.name, REASON_TLE),
    }
}
