use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures that prevent the engine from producing an `ExecutionResult`.
///
/// Anything the submitted program causes (bad syntax, crashes, timeouts) is a
/// result value instead. These errors are about the request or the host.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("test cases not found for question {0}")]
    FixtureMissing(String),

    #[error("failed to read fixture {path}: {source}")]
    Fixture {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("workspace error at {path}: {source}")]
    Workspace {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to wait for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("judge is not accepting submissions")]
    Closed,
}

impl EngineError {
    /// Infrastructure failures may succeed on retry; request errors never will.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EngineError::Fixture { .. }
                | EngineError::Workspace { .. }
                | EngineError::Spawn { .. }
                | EngineError::Wait { .. }
                | EngineError::Closed
        )
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(!EngineError::InvalidInput("Code is required".into()).is_retryable());
        assert!(!EngineError::FixtureMissing("7".into()).is_retryable());
        assert!(EngineError::Spawn {
            program: "g++".into(),
            source: io::Error::from(io::ErrorKind::WouldBlock),
        }
        .is_retryable());
        assert!(EngineError::Workspace {
            path: PathBuf::from("/tmp/x"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        }
        .is_retryable());
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            EngineError::FixtureMissing("12".into()).to_string(),
            "test cases not found for question 12"
        );
    }
}
