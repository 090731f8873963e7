//! Batch isolation and security-level gating

use std::fs;
use std::path::Path;

use stegtriage::engine::phases::QuitOnInterrupt;
use stegtriage::engine::workspace::list_files;
use stegtriage::utils::error::ValidationError;
use stegtriage::{Config, ContentCategory, Engine, ExitCode, SecurityLevel, StegError};
use stegtriage_engine::test_support::{FixedFileTypes, ScriptedRunner, StaticProbe, TestRig};
use tempfile::TempDir;

fn engine_at(dir: &Path, level: SecurityLevel, file_types: FixedFileTypes) -> Engine {
    let mut config = Config::default();
    config.defaults.output_dir = dir.join("outputs");
    config.defaults.security_level = level;
    Engine::new(
        config,
        Box::new(StaticProbe::none()),
        Box::new(file_types),
        Box::new(ScriptedRunner::new()),
    )
    .with_console(false)
}

#[test]
fn test_batch_continues_past_invalid_file() {
    let rig = TestRig::new(ContentCategory::Generic, &["file", "strings"]);
    let a = rig.input().to_path_buf();
    let b = rig.sibling_input("b_empty.bin", b"");
    let c = rig.sibling_input("c.bin", b"more evidence");

    let report = rig
        .engine
        .run_batch(&[a, b.clone(), c], &mut QuitOnInterrupt)
        .unwrap();

    assert_eq!(report.attempted, 3);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].input, b);
    assert!(report.failures[0].error.contains("empty"));
    assert_eq!(report.exit_code(), ExitCode::SUCCESS);

    // Each successful file got its own workspace with its own transcripts
    for workspace in &report.workspaces {
        assert!(workspace.join("Basic Analysis/file_output.txt").is_file());
    }
    let names: Vec<String> = fs::read_dir(rig.output_root())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names.len(), 2);
    assert!(names.iter().all(|n| !n.starts_with("b_empty")));
}

#[test]
fn test_batch_with_no_success_fails() {
    let rig = TestRig::new(ContentCategory::Generic, &[]);
    let missing = rig.output_root().join("gone.bin");
    let empty = rig.sibling_input("empty.bin", b"");

    let report = rig
        .engine
        .run_batch(&[missing, empty], &mut QuitOnInterrupt)
        .unwrap();

    assert_eq!(report.succeeded, 0);
    assert_eq!(report.exit_code(), ExitCode::FAILURE);
}

#[test]
fn test_paranoid_rejects_script_before_workspace() {
    let dir = TempDir::new().unwrap();
    let script = dir.path().join("run.sh");
    fs::write(&script, "#!/bin/sh\necho hi\n").unwrap();
    let script_types = FixedFileTypes::new(
        "text/x-shellscript",
        "POSIX shell script, ASCII text executable",
    );

    let paranoid = engine_at(dir.path(), SecurityLevel::Paranoid, script_types.clone());
    let err = paranoid.start_run(&script).unwrap_err();
    assert!(matches!(
        err,
        StegError::Validation(ValidationError::PolicyRejected { .. })
    ));
    assert!(list_files(&dir.path().join("outputs")).is_empty());

    let normal = engine_at(dir.path(), SecurityLevel::Normal, script_types);
    assert!(normal.start_run(&script).is_ok());
}

#[test]
fn test_paranoid_rejects_disguised_executable() {
    let dir = TempDir::new().unwrap();
    let disguised = dir.path().join("holiday.png");
    fs::write(&disguised, b"\x7fELF\x02\x01\x01").unwrap();

    let elf = FixedFileTypes::new(
        "application/x-executable",
        "ELF 64-bit LSB executable, x86-64",
    );
    let engine = engine_at(dir.path(), SecurityLevel::Paranoid, elf);
    assert!(engine.start_run(&disguised).is_err());

    let png = FixedFileTypes::new("image/png", "PNG image data, 1 x 1");
    let engine = engine_at(dir.path(), SecurityLevel::Paranoid, png);
    assert!(engine.start_run(&disguised).is_ok());
}

#[test]
fn test_minimal_accepts_empty_file() {
    let dir = TempDir::new().unwrap();
    let empty = dir.path().join("empty.dat");
    fs::write(&empty, b"").unwrap();

    let minimal = engine_at(dir.path(), SecurityLevel::Minimal, FixedFileTypes::unknown());
    assert!(minimal.start_run(&empty).is_ok());

    let normal = engine_at(dir.path(), SecurityLevel::Normal, FixedFileTypes::unknown());
    assert!(matches!(
        normal.start_run(&empty),
        Err(StegError::Validation(ValidationError::Empty { .. }))
    ));
}
