// Fixture discovery: <root>/Ques<id>/<case>.in paired with <case>.out

use crate::error::{EngineError, Result};
use gauntlet_common::types::Fixture;
use std::path::{Path, PathBuf};
use tracing::debug;

const INPUT_EXTENSION: &str = "in";
const OUTPUT_EXTENSION: &str = "out";

#[derive(Debug, Clone)]
pub struct FixtureStore {
    root: PathBuf,
}

impl FixtureStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn question_dir(&self, question_id: &str) -> PathBuf {
        self.root.join(format!("Ques{}", question_id))
    }

    /// Load every fixture for `question_id`, fresh from disk.
    ///
    /// Cases are ordered by file name. A `.in` file without a matching `.out`
    /// is reported as unreadable fixture data.
    pub async fn load(&self, question_id: &str) -> Result<Vec<Fixture>> {
        let question_id = question_id.trim();
        validate_question_id(question_id)?;

        let dir = self.question_dir(question_id);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(EngineError::FixtureMissing(question_id.to_string()));
            }
            Err(source) => return Err(EngineError::Fixture { path: dir, source }),
        };

        let mut inputs = Vec::new();
        loop {
            let entry = entries.next_entry().await.map_err(|source| EngineError::Fixture {
                path: dir.clone(),
                source,
            })?;
            let Some(entry) = entry else { break };
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some(INPUT_EXTENSION) {
                inputs.push(path);
            }
        }
        inputs.sort();

        let mut fixtures = Vec::with_capacity(inputs.len());
        for input_path in inputs {
            let name = input_path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let output_path = input_path.with_extension(OUTPUT_EXTENSION);

            let input = read(&input_path).await?;
            let expected = read(&output_path).await?;
            fixtures.push(Fixture::new(name, input, &expected));
        }

        debug!(question_id, count = fixtures.len(), "Fixtures loaded");
        Ok(fixtures)
    }
}

/// Question ids become directory names, so they must stay a single path
/// component.
pub fn validate_question_id(question_id: &str) -> Result<()> {
    let trimmed = question_id.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidInput("Question ID is required".to_string()));
    }
    if trimmed.contains(['/', '\\', '\0']) || trimmed.contains("..") {
        return Err(EngineError::InvalidInput(format!("Invalid question ID '{}'", question_id)));
    }
    Ok(())
}

async fn read(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| EngineError::Fixture {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_case(dir: &Path, name: &str, input: &str, output: &str) {
        std::fs::write(dir.join(format!("{}.in", name)), input).unwrap();
        std::fs::write(dir.join(format!("{}.out", name)), output).unwrap();
    }

    #[tokio::test]
    async fn test_load_sorted_pairs() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("Ques7");
        std::fs::create_dir(&dir).unwrap();
        write_case(&dir, "case2", "2\n", "4\n");
        write_case(&dir, "case1", "3\n1 2 3\n", "6\n");
        write_case(&dir, "case3", "", "  \n");
        std::fs::write(dir.join("README.md"), "notes").unwrap();

        let fixtures = FixtureStore::new(root.path()).load("7").await.unwrap();

        let names: Vec<_> = fixtures.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["case1", "case2", "case3"]);
        assert_eq!(fixtures[0].input, "3\n1 2 3\n");
        assert_eq!(fixtures[0].expected_output, "6");
        assert_eq!(fixtures[2].expected_output, "");
    }

    #[tokio::test]
    async fn test_surrounding_whitespace_in_id_is_ignored() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("Ques7");
        std::fs::create_dir(&dir).unwrap();
        write_case(&dir, "case1", "1\n", "1\n");

        let fixtures = FixtureStore::new(root.path()).load(" 7 \n").await.unwrap();
        assert_eq!(fixtures.len(), 1);

        let err = FixtureStore::new(root.path()).load("8 ").await.unwrap_err();
        assert!(matches!(err, EngineError::FixtureMissing(ref id) if id == "8"));
    }

    #[tokio::test]
    async fn test_missing_directory() {
        let root = tempfile::tempdir().unwrap();
        let err = FixtureStore::new(root.path()).load("404").await.unwrap_err();
        assert!(matches!(err, EngineError::FixtureMissing(ref id) if id == "404"));
    }

    #[tokio::test]
    async fn test_missing_output_file() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("Ques1");
        std::fs::create_dir(&dir).unwrap();
        std::fs::write(dir.join("orphan.in"), "1").unwrap();

        let err = FixtureStore::new(root.path()).load("1").await.unwrap_err();
        assert!(matches!(err, EngineError::Fixture { .. }));
    }

    #[tokio::test]
    async fn test_empty_directory_has_no_fixtures() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("Ques2")).unwrap();
        let fixtures = FixtureStore::new(root.path()).load("2").await.unwrap();
        assert!(fixtures.is_empty());
    }

    #[test]
    fn test_question_id_validation() {
        assert!(validate_question_id("12").is_ok());
        assert!(validate_question_id("two-sum").is_ok());
        assert!(validate_question_id("").is_err());
        assert!(validate_question_id("   ").is_err());
        assert!(validate_question_id("../etc").is_err());
        assert!(validate_question_id("1/2").is_err());
    }
}
