use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// A single compile-and-run attempt.
///
/// Fields are private so a request cannot change between compilation and
/// execution once it has been handed to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    source_code: String,
    input: String,
    time_limit_ms: u64,
}

impl ExecutionRequest {
    pub fn new(source_code: impl Into<String>, input: impl Into<String>, time_limit_ms: u64) -> Self {
        Self {
            source_code: source_code.into(),
            input: input.into(),
            time_limit_ms,
        }
    }

    pub fn source_code(&self) -> &str {
        &self.source_code
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn time_limit_ms(&self) -> u64 {
        self.time_limit_ms
    }

    pub fn time_limit(&self) -> Duration {
        Duration::from_millis(self.time_limit_ms)
    }
}

/// Outcome of one attempt. Exactly one variant, so output and error can
/// never be reported together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExecutionResult {
    Success { stdout: String },
    CompileFailure { diagnostics: String },
    RuntimeFailure { stderr: String, exit_code: i32 },
    TimeExceeded,
}

impl ExecutionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionResult::Success { .. })
    }

    /// Short label used in logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            ExecutionResult::Success { .. } => "success",
            ExecutionResult::CompileFailure { .. } => "compile_failure",
            ExecutionResult::RuntimeFailure { .. } => "runtime_failure",
            ExecutionResult::TimeExceeded => "time_exceeded",
        }
    }
}

/// One input / expected-output pair for a problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixture {
    pub name: String,
    pub input: String,
    /// Already trimmed at load time
    pub expected_output: String,
}

impl Fixture {
    pub fn new(name: impl Into<String>, input: impl Into<String>, expected_output: &str) -> Self {
        Self {
            name: name.into(),
            input: input.into(),
            expected_output: expected_output.trim().to_string(),
        }
    }
}

/// Per-fixture verdict. Expected/actual output are only carried on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseVerdict {
    pub fixture_name: String,
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl CaseVerdict {
    pub fn passed(fixture_name: impl Into<String>) -> Self {
        Self {
            fixture_name: fixture_name.into(),
            passed: true,
            expected_output: None,
            actual_output: None,
            failure_reason: None,
            details: None,
        }
    }

    pub fn failed(fixture_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            fixture_name: fixture_name.into(),
            passed: false,
            expected_output: None,
            actual_output: None,
            failure_reason: Some(reason.into()),
            details: None,
        }
    }

    pub fn with_outputs(mut self, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        self.expected_output = Some(expected.into());
        self.actual_output = Some(actual.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteVerdict {
    pub all_passed: bool,
    #[serde(rename = "results")]
    pub case_verdicts: Vec<CaseVerdict>,
}

impl SuiteVerdict {
    pub fn from_cases(case_verdicts: Vec<CaseVerdict>) -> Self {
        Self {
            all_passed: case_verdicts.iter().all(|c| c.passed),
            case_verdicts,
        }
    }
}

/// How the suite runner reacts to a failing fixture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunPolicy {
    /// Stop at the first failing fixture; later fixtures are not reported.
    #[default]
    FailFast,
    /// Execute and report every fixture.
    RunAll,
}

impl fmt::Display for RunPolicy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RunPolicy::FailFast => write!(f, "fail-fast"),
            RunPolicy::RunAll => write!(f, "run-all"),
        }
    }
}

impl FromStr for RunPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fail-fast" | "failfast" | "fail_fast" => Ok(RunPolicy::FailFast),
            "run-all" | "runall" | "run_all" => Ok(RunPolicy::RunAll),
            other => Err(format!("unknown suite policy '{}'", other)),
        }
    }
}

/// Listing entry derived from a stored question record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionSummary {
    pub id: serde_json::Value,
    pub title: serde_json::Value,
    pub difficulty: serde_json::Value,
}

impl QuestionSummary {
    pub fn from_record(record: &serde_json::Value) -> Self {
        let field = |name: &str| record.get(name).cloned().unwrap_or(serde_json::Value::Null);
        Self {
            id: field("id"),
            title: field("title"),
            difficulty: field("difficulty"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_trims_expected_output() {
        let fixture = Fixture::new("case1", "3\n1 2 3\n", "  6\n");
        assert_eq!(fixture.expected_output, "6");
        assert_eq!(fixture.input, "3\n1 2 3\n");
    }

    #[test]
    fn test_execution_result_serialization() {
        let json = serde_json::to_value(ExecutionResult::RuntimeFailure {
            stderr: "boom".to_string(),
            exit_code: 3,
        })
        .unwrap();
        assert_eq!(json["status"], "runtime_failure");
        assert_eq!(json["exit_code"], 3);

        let json = serde_json::to_value(ExecutionResult::TimeExceeded).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "time_exceeded" }));
    }

    #[test]
    fn test_passed_verdict_withholds_outputs() {
        let json = serde_json::to_value(CaseVerdict::passed("case1")).unwrap();
        assert_eq!(json, serde_json::json!({ "fixtureName": "case1", "passed": true }));
    }

    #[test]
    fn test_failed_verdict_carries_outputs() {
        let verdict = CaseVerdict::failed("case2", "Wrong answer").with_outputs("6", "7");
        let json = serde_json::to_value(&verdict).unwrap();
        assert_eq!(json["expectedOutput"], "6");
        assert_eq!(json["actualOutput"], "7");
        assert_eq!(json["failureReason"], "Wrong answer");
        assert!(json.get("details").is_none());
    }

    #[test]
    fn test_suite_verdict_all_passed() {
        let suite = SuiteVerdict::from_cases(vec![CaseVerdict::passed("a"), CaseVerdict::passed("b")]);
        assert!(suite.all_passed);

        let suite = SuiteVerdict::from_cases(vec![
            CaseVerdict::passed("a"),
            CaseVerdict::failed("b", "Wrong answer"),
        ]);
        assert!(!suite.all_passed);

        let json = serde_json::to_value(&suite).unwrap();
        assert_eq!(json["allPassed"], false);
        assert_eq!(json["results"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_empty_suite_passes() {
        assert!(SuiteVerdict::from_cases(Vec::new()).all_passed);
    }

    #[test]
    fn test_run_policy_parsing() {
        assert_eq!("fail-fast".parse::<RunPolicy>().unwrap(), RunPolicy::FailFast);
        assert_eq!("RUN-ALL".parse::<RunPolicy>().unwrap(), RunPolicy::RunAll);
        assert_eq!("run_all".parse::<RunPolicy>().unwrap(), RunPolicy::RunAll);
        assert!("sometimes".parse::<RunPolicy>().is_err());
        assert_eq!(RunPolicy::default(), RunPolicy::FailFast);
        assert_eq!(
            serde_json::from_str::<RunPolicy>("\"run-all\"").unwrap(),
            RunPolicy::RunAll
        );
    }

    #[test]
    fn test_question_summary_from_record() {
        let record = serde_json::json!({
            "id": 3,
            "title": "Sum",
            "difficulty": "easy",
            "statement": "long text"
        });
        let summary = QuestionSummary::from_record(&record);
        assert_eq!(summary.id, 3);
        assert_eq!(summary.title, "Sum");
        assert_eq!(summary.difficulty, "easy");
    }

    #[test]
    fn test_request_accessors() {
        let request = ExecutionRequest::new("int main(){}", "1 2", 1500);
        assert_eq!(request.source_code(), "int main(){}");
        assert_eq!(request.input(), "1 2");
        assert_eq!(request.time_limit(), Duration::from_millis(1500));
    }
}
