/// Compiler Invoker
///
/// Runs the native toolchain as `<compiler> <flags..> <source> -o <artifact>`,
/// waits for it, and classifies the result. Diagnostics are passed through
/// untouched; truncation is left to whoever renders them.
use crate::error::{EngineError, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileOutcome {
    Compiled(PathBuf),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct Compiler {
    program: String,
    flags: Vec<String>,
    timeout: Duration,
}

impl Compiler {
    pub fn new(program: impl Into<String>, flags: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            flags,
            timeout,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Compile `source` into `artifact`.
    ///
    /// Only failures to launch or reap the compiler itself are errors; a
    /// compiler that runs and rejects the code yields `CompileOutcome::Failed`.
    pub async fn compile(&self, source: &Path, artifact: &Path) -> Result<CompileOutcome> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.flags)
            .arg(source)
            .arg("-o")
            .arg(artifact)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let start = Instant::now();
        let child = command.spawn().map_err(|source| EngineError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        // Dropping the output future on timeout kills the compiler
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => output.map_err(|source| EngineError::Wait {
                program: self.program.clone(),
                source,
            })?,
            Err(_) => {
                warn!(
                    compiler = %self.program,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Compilation timed out"
                );
                return Ok(CompileOutcome::Failed(format!(
                    "Compilation exceeded {}ms and was aborted",
                    self.timeout.as_millis()
                )));
            }
        };
        let compile_ms = start.elapsed().as_millis() as u64;

        if output.status.success() {
            info!(compiler = %self.program, compile_ms, "Compilation succeeded");
            return Ok(CompileOutcome::Compiled(artifact.to_path_buf()));
        }

        let mut diagnostics = String::from_utf8_lossy(&output.stderr).into_owned();
        if diagnostics.trim().is_empty() {
            diagnostics = String::from_utf8_lossy(&output.stdout).into_owned();
        }
        if diagnostics.trim().is_empty() {
            diagnostics = format!("{} exited with {}", self.program, output.status);
        }

        debug!(compiler = %self.program, status = %output.status, "Compiler diagnostics captured");
        info!(compiler = %self.program, compile_ms, "Compilation failed");
        Ok(CompileOutcome::Failed(diagnostics))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{gxx_available, install_fake_compiler, install_script};

    fn fake_compiler(dir: &Path) -> Compiler {
        let program = install_fake_compiler(dir);
        Compiler::new(
            program.to_string_lossy(),
            vec!["-O2".to_string()],
            Duration::from_secs(10),
        )
    }

    #[tokio::test]
    async fn test_compile_success_produces_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let compiler = fake_compiler(dir.path());
        let source = dir.path().join("main.cpp");
        let artifact = dir.path().join("main.bin");
        std::fs::write(&source, "#!/bin/sh\necho hi\n").unwrap();

        let outcome = compiler.compile(&source, &artifact).await.unwrap();

        assert_eq!(outcome, CompileOutcome::Compiled(artifact.clone()));
        assert!(artifact.exists());
    }

    #[tokio::test]
    async fn test_compile_failure_returns_diagnostics() {
        let dir = tempfile::tempdir().unwrap();
        let compiler = fake_compiler(dir.path());
        let source = dir.path().join("main.cpp");
        let artifact = dir.path().join("main.bin");
        std::fs::write(&source, "SYNTAX_ERROR").unwrap();

        let outcome = compiler.compile(&source, &artifact).await.unwrap();

        match outcome {
            CompileOutcome::Failed(diagnostics) => {
                assert!(diagnostics.contains("error: expected ';'"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert!(!artifact.exists());
    }

    #[tokio::test]
    async fn test_silent_failure_still_has_diagnostics() {
        let dir = tempfile::tempdir().unwrap();
        let program = install_script(dir.path(), "mutecc", "#!/bin/sh\nexit 3\n");
        let compiler = Compiler::new(program.to_string_lossy(), vec![], Duration::from_secs(10));

        let outcome = compiler
            .compile(&dir.path().join("a.cpp"), &dir.path().join("a.bin"))
            .await
            .unwrap();

        match outcome {
            CompileOutcome::Failed(diagnostics) => assert!(!diagnostics.trim().is_empty()),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_compile_timeout_is_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        let program = install_script(dir.path(), "hangcc", "#!/bin/sh\nsleep 10\n");
        let compiler = Compiler::new(program.to_string_lossy(), vec![], Duration::from_millis(200));

        let start = Instant::now();
        let outcome = compiler
            .compile(&dir.path().join("a.cpp"), &dir.path().join("a.bin"))
            .await
            .unwrap();

        assert!(matches!(outcome, CompileOutcome::Failed(ref d) if d.contains("aborted")));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_missing_compiler_is_infrastructure_error() {
        let dir = tempfile::tempdir().unwrap();
        let compiler = Compiler::new(
            dir.path().join("no-such-compiler").to_string_lossy(),
            vec![],
            Duration::from_secs(1),
        );

        let err = compiler
            .compile(&dir.path().join("a.cpp"), &dir.path().join("a.bin"))
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_real_gxx_rejects_syntax_error() {
        if !gxx_available() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let compiler = Compiler::new("g++", vec!["-O2".to_string()], Duration::from_secs(60));
        let source = dir.path().join("broken.cpp");
        std::fs::write(&source, "int main() { return 0 }").unwrap();

        let outcome = compiler.compile(&source, &dir.path().join("broken.bin")).await.unwrap();

        match outcome {
            CompileOutcome::Failed(diagnostics) => assert!(diagnostics.contains("error")),
            other => panic!("expected failure, got {:?}", other),
        }
    }
}
