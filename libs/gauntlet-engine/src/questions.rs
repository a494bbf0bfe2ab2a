// Question metadata: one `<id>.json` record per question

use crate::fixtures::validate_question_id;
use gauntlet_common::types::QuestionSummary;
use serde_json::Value;
use std::cmp::Ordering;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum QuestionError {
    #[error("invalid question id '{0}'")]
    InvalidId(String),

    #[error("question {0} not found")]
    NotFound(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed question record {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone)]
pub struct QuestionStore {
    root: PathBuf,
}

impl QuestionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Summaries of every readable record, ordered by id.
    /// Records that fail to parse are skipped.
    pub async fn list(&self) -> Result<Vec<QuestionSummary>, QuestionError> {
        let io_err = |source| QuestionError::Io {
            path: self.root.clone(),
            source,
        };
        let mut entries = tokio::fs::read_dir(&self.root).await.map_err(io_err)?;

        let mut summaries = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match read_record(&path).await {
                Ok(record) => summaries.push(QuestionSummary::from_record(&record)),
                Err(e) => warn!(error = %e, "Skipping question record"),
            }
        }

        summaries.sort_by(|a, b| compare_ids(&a.id, &b.id));
        Ok(summaries)
    }

    /// The full stored record for `id`
    pub async fn get(&self, id: &str) -> Result<Value, QuestionError> {
        let id = id.trim();
        if validate_question_id(id).is_err() {
            return Err(QuestionError::InvalidId(id.to_string()));
        }
        let path = self.root.join(format!("{}.json", id));
        match read_record(&path).await {
            Err(QuestionError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                Err(QuestionError::NotFound(id.to_string()))
            }
            other => other,
        }
    }
}

async fn read_record(path: &Path) -> Result<Value, QuestionError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| QuestionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    serde_json::from_str(&raw).map_err(|source| QuestionError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

/// Numeric ids sort numerically and before anything else; the rest by text
fn compare_ids(a: &Value, b: &Value) -> Ordering {
    fn key(v: &Value) -> (Option<f64>, String) {
        let numeric = match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        };
        let text = match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        (numeric, text)
    }

    match (key(a), key(b)) {
        ((Some(x), _), (Some(y), _)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        ((Some(_), _), (None, _)) => Ordering::Less,
        ((None, _), (Some(_), _)) => Ordering::Greater,
        ((None, x), (None, y)) => x.cmp(&y),
    }
}
