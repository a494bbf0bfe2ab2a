// CLI commands driving the engine against files on disk
use anyhow::{Context, Result};
use gauntlet_common::types::{ExecutionRequest, ExecutionResult, QuestionSummary};
use gauntlet_common::Config;
use gauntlet_engine::{run_suite, FixtureStore, Judge, QuestionStore};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info};

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Compile and run `source` once. Returns whether the program succeeded.
pub async fn run_program(config: &Config, source: &Path, input: Option<&Path>) -> Result<bool> {
    let code = read_file(source)?;
    let input = match input {
        Some(path) => read_file(path)?,
        None => String::new(),
    };

    let judge = Judge::from_config(config)?;
    let request = ExecutionRequest::new(code, input, config.time_limit_ms);
    let result = judge.execute(&request).await?;
    info!(source = %source.display(), verdict = result.label(), "Run finished");

    let (ok, text) = render_result(&result);
    if ok {
        print!("{}", text);
    } else {
        eprintln!("{}", text);
    }
    Ok(ok)
}

/// Judge `source` against question `question`, printing the suite verdict as JSON
pub async fn validate_question(config: &Config, source: &Path, question: &str) -> Result<bool> {
    let code = read_file(source)?;
    let fixtures = FixtureStore::new(&config.fixtures_dir)
        .load(question)
        .await
        .with_context(|| format!("failed to load fixtures for question {}", question))?;
    debug!(question, count = fixtures.len(), "Fixtures loaded");

    let judge = Judge::from_config(config)?;
    let suite = run_suite(
        &judge,
        &code,
        &fixtures,
        config.suite_policy,
        config.time_limit(),
    )
    .await?;
    info!(
        question,
        policy = %config.suite_policy,
        all_passed = suite.all_passed,
        reported = suite.case_verdicts.len(),
        "Validation finished"
    );

    println!("{}", serde_json::to_string_pretty(&suite)?);
    Ok(suite.all_passed)
}

pub async fn list_questions(config: &Config) -> Result<()> {
    let summaries = QuestionStore::new(&config.questions_dir).list().await?;
    if summaries.is_empty() {
        println!("No questions found in {}", config.questions_dir.display());
        return Ok(());
    }
    for summary in &summaries {
        println!("{}", render_summary(summary));
    }
    Ok(())
}

fn render_result(result: &ExecutionResult) -> (bool, String) {
    match result {
        ExecutionResult::Success { stdout } => (true, stdout.clone()),
        ExecutionResult::CompileFailure { diagnostics } => {
            (false, format!("Compilation failed:\n{}", diagnostics))
        }
        ExecutionResult::RuntimeFailure { stderr, exit_code } => (
            false,
            format!("Runtime error (exit code {}):\n{}", exit_code, stderr),
        ),
        ExecutionResult::TimeExceeded => (false, "TLE: Time Limit Exceeded".to_string()),
    }
}

fn render_summary(summary: &QuestionSummary) -> String {
    fn text(v: &Value) -> String {
        match v {
            Value::String(s) => s.clone(),
            Value::Null => "-".to_string(),
            other => other.to_string(),
        }
    }
    format!(
        "{:<6} {:<10} {}",
        text(&summary.id),
        text(&summary.difficulty),
        text(&summary.title)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_result() {
        let (ok, text) = render_result(&ExecutionResult::Success { stdout: "6\n".into() });
        assert!(ok);
        assert_eq!(text, "6\n");

        let (ok, text) = render_result(&ExecutionResult::RuntimeFailure {
            stderr: "boom".into(),
            exit_code: 139,
        });
        assert!(!ok);
        assert!(text.starts_with("Runtime error (exit code 139)"));

        let (ok, text) = render_result(&ExecutionResult::TimeExceeded);
        assert!(!ok);
        assert_eq!(text, "TLE: Time Limit Exceeded");
    }

    #[test]
    fn test_render_summary() {
        let summary = QuestionSummary {
            id: json!(3),
            title: json!("Sum of array"),
            difficulty: Value::Null,
        };
        assert_eq!(render_summary(&summary), "3      -          Sum of array");
    }

    #[tokio::test]
    async fn test_validate_missing_question_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("main.cpp");
        std::fs::write(&source, "int main() {}").unwrap();
        let config = Config {
            fixtures_dir: dir.path().join("test_cases"),
            workspace_dir: dir.path().join("work"),
            ..Config::default()
        };

        let err = validate_question(&config, &source, "42").await.unwrap_err();
        assert!(err.to_string().contains("question 42"));
    }
}
