// Shared fixtures for engine tests

use crate::compiler::Compiler;
use crate::executor::Judge;
use crate::supervisor::Supervisor;
use crate::workspace::WorkspaceManager;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

/// Stand-in toolchain: "compiles" a shell script by copying it to the
/// artifact path and marking it executable. Sources containing SYNTAX_ERROR
/// are rejected with a g++-style diagnostic; sources containing SLOW_BUILD
/// take a while to compile.
pub const FAKE_COMPILER: &str = r#"#!/bin/sh
out=""
src=""
while [ $# -gt 0 ]; do
  case "$1" in
    -o) out="$2"; shift 2 ;;
    -*) shift ;;
    *) src="$1"; shift ;;
  esac
done
if grep -q SYNTAX_ERROR "$src"; then
  echo "$src:1:1: error: expected ';' before '}' token" >&2
  exit 1
fi
if grep -q SLOW_BUILD "$src"; then
  sleep 0.3
fi
cp "$src" "$out" && chmod +x "$out"
"#;

pub fn install_fake_compiler(dir: &Path) -> PathBuf {
    install_script(dir, "fakecc", FAKE_COMPILER)
}

/// Install an executable script.
///
/// The body is written to a side file and copied into place by `cp`, so this
/// process never holds a writable descriptor on the executable. Exec'ing a
/// file that a concurrently forked test thread still has open for writing
/// fails with ETXTBSY.
pub fn install_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let staged = dir.join(format!(".{}.staged", name));
    let path = dir.join(name);
    std::fs::write(&staged, body).unwrap();
    let status = Command::new("sh")
        .arg("-c")
        .arg("cp \"$1\" \"$2\" && chmod 755 \"$2\"")
        .arg("install")
        .arg(&staged)
        .arg(&path)
        .status()
        .unwrap();
    assert!(status.success(), "failed to install {}", path.display());
    std::fs::remove_file(&staged).unwrap();
    path
}

pub fn gxx_available() -> bool {
    Command::new("g++")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// True while a process with this pid exists and is not a zombie
pub fn process_alive(pid: i32) -> bool {
    match std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
        Ok(stat) => stat
            .rsplit_once(')')
            .map(|(_, rest)| !rest.trim_start().starts_with('Z'))
            .unwrap_or(false),
        Err(_) => false,
    }
}

/// Judge wired to the stand-in compiler, with workspaces under `dir/work`
pub fn fake_judge(dir: &Path) -> Judge {
    let compiler = install_fake_compiler(dir);
    Judge::new(
        WorkspaceManager::new(dir.join("work")).unwrap(),
        Compiler::new(compiler.to_string_lossy(), vec!["-O2".to_string()], Duration::from_secs(10)),
        Supervisor::new(),
        false,
        4,
    )
}
