// HTTP error envelope: { error, details?, exitCode? }

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use gauntlet_engine::{EngineError, QuestionError};
use serde::Serialize;
use tracing::error;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    exit_code: Option<i32>,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<String>,
    pub exit_code: Option<i32>,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            details: None,
            exit_code: None,
        }
    }

    pub fn bad_request(error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    pub fn not_found(error: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, error)
    }

    pub fn internal(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error).with_details(details)
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_exit_code(mut self, exit_code: i32) -> Self {
        self.exit_code = Some(exit_code);
        self
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InvalidInput(message) => ApiError::bad_request(message),
            EngineError::FixtureMissing(_) => {
                ApiError::not_found("Test cases not found for the question")
            }
            other => {
                error!(error = %other, retryable = other.is_retryable(), "Infrastructure failure");
                ApiError::internal("Unexpected error occurred", other.to_string())
            }
        }
    }
}

impl From<QuestionError> for ApiError {
    fn from(err: QuestionError) -> Self {
        match err {
            QuestionError::InvalidId(_) | QuestionError::NotFound(_) => {
                ApiError::not_found("Question not found")
            }
            QuestionError::Io { .. } => {
                ApiError::internal("Failed to read questions directory", err.to_string())
            }
            QuestionError::Malformed { .. } => {
                ApiError::internal("Failed to parse question", err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.error,
            details: self.details,
            exit_code: self.exit_code,
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::path::PathBuf;

    #[test]
    fn test_engine_error_mapping() {
        let invalid = ApiError::from(EngineError::InvalidInput("Code is required".into()));
        assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
        assert_eq!(invalid.error, "Code is required");

        let missing = ApiError::from(EngineError::FixtureMissing("9".into()));
        assert_eq!(missing.status, StatusCode::NOT_FOUND);

        let infra = ApiError::from(EngineError::Workspace {
            path: PathBuf::from("/tmp/work"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        });
        assert_eq!(infra.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(infra.details.unwrap().contains("/tmp/work"));
    }

    #[test]
    fn test_body_omits_empty_fields() {
        let body = ErrorBody {
            error: "TLE: Time Limit Exceeded".into(),
            details: None,
            exit_code: None,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({ "error": "TLE: Time Limit Exceeded" })
        );
    }
}
