// Test-Suite Runner: one compile per request, one supervised run per fixture

use crate::compiler::CompileOutcome;
use crate::error::{EngineError, Result};
use crate::evaluator;
use crate::executor::Judge;
use gauntlet_common::types::{CaseVerdict, ExecutionResult, Fixture, RunPolicy, SuiteVerdict};
use std::time::Duration;
use tracing::{debug, info};

/// Run `source_code` against `fixtures` in order.
///
/// - The source is compiled once; every fixture reuses the artifact.
/// - `FailFast` stops after the first failing fixture and omits the rest.
/// - `RunAll` reports every fixture.
/// - A compile failure fails each fixture that would have run: only the
///   first under `FailFast`, all of them under `RunAll`.
/// - An empty fixture set passes without compiling anything.
#[tracing::instrument(skip_all, fields(fixtures = fixtures.len(), policy = %policy))]
pub async fn run_suite(
    judge: &Judge,
    source_code: &str,
    fixtures: &[Fixture],
    policy: RunPolicy,
    time_limit: Duration,
) -> Result<SuiteVerdict> {
    if source_code.trim().is_empty() {
        return Err(EngineError::InvalidInput("Code is required".to_string()));
    }
    if fixtures.is_empty() {
        info!("No fixtures to run");
        return Ok(SuiteVerdict::from_cases(Vec::new()));
    }

    let _permit = judge.admit().await?;
    let submission = judge.compile(source_code, time_limit).await?;

    if let CompileOutcome::Failed(_) = submission.outcome() {
        info!("Compilation failed; no fixture will be executed");
    }

    let mut verdicts = Vec::with_capacity(fixtures.len());
    let mut infra_error = None;

    for (idx, fixture) in fixtures.iter().enumerate() {
        debug!(case = idx + 1, fixture = %fixture.name, "Running fixture");

        let result = match judge.run(&submission, &fixture.input, time_limit).await {
            Ok(result) => result,
            Err(e) => {
                infra_error = Some(e);
                break;
            }
        };
        let verdict = evaluator::judge_case(fixture, &result);
        log_case(idx, &verdict, &result);

        let failed = !verdict.passed;
        verdicts.push(verdict);
        if failed && policy == RunPolicy::FailFast {
            break;
        }
    }

    judge.release(submission);

    if let Some(e) = infra_error {
        return Err(e);
    }

    let suite = SuiteVerdict::from_cases(verdicts);
    info!(
        all_passed = suite.all_passed,
        reported = suite.case_verdicts.len(),
        passed = suite.case_verdicts.iter().filter(|c| c.passed).count(),
        "Suite finished"
    );
    Ok(suite)
}

fn log_case(idx: usize, verdict: &CaseVerdict, result: &ExecutionResult) {
    if verdict.passed {
        debug!(case = idx + 1, fixture = %verdict.fixture_name, "Output matched");
    } else {
        info!(
            case = idx + 1,
            fixture = %verdict.fixture_name,
            verdict = result.label(),
            reason = verdict.failure_reason.as_deref().unwrap_or_default(),
            "Fixture failed"
        );
    }
}
