// HTTP route handlers for the Gauntlet API

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use gauntlet_common::types::{ExecutionRequest, ExecutionResult, RunPolicy, SuiteVerdict};
use gauntlet_engine::{run_suite, EngineError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};

use crate::display::truncate_for_display;
use crate::error::ApiError;
use crate::metrics;
use crate::AppState;

/// Upper bound on a per-request `timeLimitMs` override
pub const MAX_TIME_LIMIT_MS: u64 = 10_000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteRequest {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub input: Option<String>,
    #[serde(default)]
    pub time_limit_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct ExecuteResponse {
    pub output: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRequest {
    #[serde(default)]
    pub code: Option<String>,
    /// Accepted as a string or a number
    #[serde(default)]
    pub question_id: Option<Value>,
    #[serde(default)]
    pub policy: Option<String>,
    #[serde(default)]
    pub time_limit_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct MisuseReport {
    #[serde(default)]
    pub name: Option<String>,
}

fn effective_time_limit(state: &AppState, requested: Option<u64>) -> Duration {
    let ms = match requested {
        Some(ms) => ms.clamp(1, MAX_TIME_LIMIT_MS),
        None => state.config.time_limit_ms,
    };
    Duration::from_millis(ms)
}

fn question_id_text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// POST /execute - compile and run one program against one input
pub async fn execute(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ExecuteRequest>,
) -> Result<Response, ApiError> {
    let code = match payload.code {
        Some(code) if !code.trim().is_empty() => code,
        _ => return Err(ApiError::bad_request("No C++ code provided")),
    };
    let time_limit = effective_time_limit(&state, payload.time_limit_ms);
    let request = ExecutionRequest::new(
        code,
        payload.input.unwrap_or_default(),
        time_limit.as_millis() as u64,
    );

    let started = Instant::now();
    let outcome = state.judge.execute(&request).await;
    let verdict = outcome.as_ref().map(|r| r.label()).unwrap_or("error");
    metrics::record_submission("execute", verdict, started.elapsed());

    let result = outcome?;
    info!(verdict = result.label(), elapsed_ms = started.elapsed().as_millis() as u64, "Execute finished");
    Ok(execution_response(result, state.config.execute_output_limit))
}

fn execution_response(result: ExecutionResult, limit: usize) -> Response {
    match result {
        ExecutionResult::Success { stdout } => Json(ExecuteResponse {
            output: truncate_for_display(&stdout, limit),
        })
        .into_response(),
        ExecutionResult::CompileFailure { diagnostics } => {
            ApiError::bad_request("Compilation failed")
                .with_details(truncate_for_display(&diagnostics, limit))
                .into_response()
        }
        ExecutionResult::RuntimeFailure { stderr, exit_code } => {
            ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, "Runtime error")
                .with_details(truncate_for_display(&stderr, limit))
                .with_exit_code(exit_code)
                .into_response()
        }
        ExecutionResult::TimeExceeded => {
            ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, "TLE: Time Limit Exceeded")
                .into_response()
        }
    }
}

/// POST /validate - run a submission against a question's fixtures
pub async fn validate(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ValidateRequest>,
) -> Result<Json<SuiteVerdict>, ApiError> {
    let code = payload.code.filter(|c| !c.trim().is_empty());
    let question_id = question_id_text(payload.question_id);
    let (Some(code), Some(question_id)) = (code, question_id) else {
        return Err(ApiError::bad_request("Code and Question ID are required"));
    };

    let policy = match payload.policy.as_deref() {
        Some(raw) => raw.parse::<RunPolicy>().map_err(ApiError::bad_request)?,
        None => state.config.suite_policy,
    };
    let time_limit = effective_time_limit(&state, payload.time_limit_ms);

    let fixtures = match state.fixtures.load(&question_id).await {
        Ok(fixtures) => fixtures,
        // Malformed ids can never name a fixture directory
        Err(EngineError::InvalidInput(_)) | Err(EngineError::FixtureMissing(_)) => {
            return Err(ApiError::not_found("Test cases not found for the question"));
        }
        Err(e) => return Err(e.into()),
    };

    let started = Instant::now();
    let outcome = run_suite(&state.judge, &code, &fixtures, policy, time_limit).await;
    let verdict = match &outcome {
        Ok(suite) if suite.all_passed => "passed",
        Ok(_) => "failed",
        Err(_) => "error",
    };
    metrics::record_submission("validate", verdict, started.elapsed());

    let suite = outcome?;
    info!(
        question_id = %question_id,
        policy = %policy,
        all_passed = suite.all_passed,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Validate finished"
    );
    Ok(Json(truncate_suite(suite, state.config.validate_output_limit)))
}

fn truncate_suite(mut suite: SuiteVerdict, limit: usize) -> SuiteVerdict {
    for case in &mut suite.case_verdicts {
        for field in [&mut case.expected_output, &mut case.actual_output, &mut case.details] {
            if let Some(text) = field.as_mut() {
                *text = truncate_for_display(text, limit);
            }
        }
    }
    suite
}

/// GET /questions - summaries of every stored question
pub async fn list_questions(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let summaries = state.questions.list().await?;
    Ok(Json(json!(summaries)))
}

/// GET /questions/:id - the full stored record
pub async fn get_question(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let record = state.questions.get(&id).await?;
    Ok(Json(record))
}

/// POST /log-cheater - append a misuse report
pub async fn log_cheater(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<MisuseReport>,
) -> Result<Json<Value>, ApiError> {
    let name = match payload.name {
        Some(name) if !name.trim().is_empty() => name,
        _ => return Err(ApiError::bad_request("Name is required")),
    };

    state.misuse_log.record(&name).await.map_err(|e| {
        error!(error = %e, path = %state.misuse_log.path().display(), "Failed to append misuse log");
        ApiError::internal("Failed to log cheater", e.to_string())
    })?;

    Ok(Json(json!({ "message": "Cheater logged successfully" })))
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "inFlight": state.judge.in_flight(),
    }))
}

/// GET /metrics - Prometheus text exposition
pub async fn export_metrics(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let stats = state.judge.supervisor_stats();
    metrics::PROCESSES_SPAWNED.set(stats.spawned() as i64);
    metrics::PROCESSES_KILLED.set(stats.killed() as i64);
    metrics::SUBMISSIONS_IN_FLIGHT.set(state.judge.in_flight() as i64);

    let body = metrics::render()
        .map_err(|e| ApiError::internal("Failed to encode metrics", e.to_string()))?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response())
}
