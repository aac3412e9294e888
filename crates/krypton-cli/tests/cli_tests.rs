//! Tests that drive the `kcc` binary.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

fn kcc() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_kcc"));
    cmd.env_remove("KRYPTON_IMPORT_ROOT")
        .env_remove("KRYPTON_MAX_FRAMES")
        .env_remove("KRYPTON_MAX_STACK_DEPTH")
        .env_remove("KRYPTON_LOG_LEVEL")
        .env("NO_COLOR", "1");
    cmd
}

fn write(dir: &Path, relative: &str, source: &str) -> std::path::PathBuf {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, source).unwrap();
    path
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_runs_file() {
    let dir = TempDir::new().unwrap();
    let main = write(
        dir.path(),
        "main.k",
        "fn add(a: int, b: int) -> int { return a + b; }\nprocess main { kp(add(2, 3)); }",
    );

    let output = kcc().arg(&main).output().unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "5\n");
}

#[test]
fn test_imports_resolve_next_to_entry_file() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "lib/util.k", "fn two() -> int { return 2; }");
    let main = write(
        dir.path(),
        "main.k",
        "import lib.util;\nprocess main { kp(two() * 21); }",
    );

    let output = kcc().arg(&main).output().unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "42\n");
}

#[test]
fn test_import_root_flag() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "shared/util.k", "fn two() -> int { return 2; }");
    let main = write(dir.path(), "app/main.k", "import util;\nprocess main { kp(two()); }");

    let output = kcc()
        .arg(&main)
        .arg("--import-root")
        .arg(dir.path().join("shared"))
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "2\n");
}

#[test]
fn test_cyclic_import_reports_error() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "b.k", "import a;\nfn b() -> int { return 1; }");
    let main = write(dir.path(), "a.k", "import b;\nprocess main { kp(1); }");

    let output = kcc().arg(&main).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).is_empty());
    assert!(stderr(&output).contains("Error:"));
    assert!(stderr(&output).contains("cyclic import detected"));
}

#[test]
fn test_missing_file() {
    let output = kcc().arg("does-not-exist.k").output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("File not found"));
}

#[test]
fn test_max_frames_flag() {
    let dir = TempDir::new().unwrap();
    let main = write(
        dir.path(),
        "main.k",
        "fn f(n: int) -> int { return f(n + 1); }\nprocess main { kp(f(0)); }",
    );

    let output = kcc().arg(&main).args(["--max-frames", "8"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("stack overflow: call depth exceeded 8 frames"));
}

#[test]
fn test_config_file() {
    let dir = TempDir::new().unwrap();
    let config = write(dir.path(), "krypton.yaml", "limits:\n  max_frames: 4\n");
    let main = write(
        dir.path(),
        "main.k",
        "fn f(n: int) -> int { return f(n + 1); }\nprocess main { kp(f(0)); }",
    );

    let output = kcc().arg(&main).arg("--config").arg(&config).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("exceeded 4 frames"));
}

#[test]
fn test_emit_ir_text() {
    let dir = TempDir::new().unwrap();
    let main = write(dir.path(), "main.k", "process main { let x = 2; kp(x); }");

    let output = kcc().arg(&main).args(["--emit-ir", "text"]).output().unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let text = stdout(&output);
    assert!(text.contains("process main:"));
    assert!(text.contains("LOAD_CONST 2"));
    assert!(text.contains("STORE_VAR x"));
    // Emitting does not run the program.
    assert!(!text.lines().any(|line| line == "2"));
}

#[test]
fn test_emit_ir_json() {
    let dir = TempDir::new().unwrap();
    let main = write(dir.path(), "main.k", "process main { kp(1); }");

    let output = kcc().arg(&main).args(["--emit-ir", "json"]).output().unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).trim_start().starts_with('{'));
    assert!(stdout(&output).contains("\"processes\""));
}

#[test]
fn test_repl_session() {
    let mut child = kcc()
        .arg("--repl")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"kp(40 + 2);\nkp(z);\n:quit\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.starts_with("Krypton REPL"));
    assert!(text.contains(">>> 42\n"));
    assert!(text.contains("Error: use of undeclared variable: z"));
}

#[test]
fn test_no_arguments_is_usage_error() {
    let output = kcc().output().unwrap();
    assert!(!output.status.success());
}
