//! Integration tests for the wick CLI binary: runs real `.wk` source files
//! through the compiled `wick` executable and checks stdout/exit status.

use std::io::Write;
use std::process::Command;

use tempfile::NamedTempFile;

fn wick_bin() -> &'static str {
    env!("CARGO_BIN_EXE_wick")
}

fn write_source(source: &str) -> NamedTempFile {
    let mut file = NamedTempFile::with_suffix(".wk").expect("create temp source file");
    file.write_all(source.as_bytes()).expect("write source");
    file
}

#[test]
fn runs_a_source_file_and_prints_its_output() {
    let file = write_source("int a = 3\nfloat b = 2.0\nprint a + b\n");
    let output = Command::new(wick_bin()).arg(file.path()).output().expect("run wick");
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "5\n");
}

#[test]
fn exits_nonzero_on_a_fatal_error() {
    let file = write_source("print missing\n");
    let output = Command::new(wick_bin()).arg(file.path()).output().expect("run wick");
    assert!(!output.status.success());
}

#[test]
fn missing_file_is_a_nonzero_exit() {
    let output = Command::new(wick_bin()).arg("/nonexistent/path/does_not_exist.wk").output().expect("run wick");
    assert!(!output.status.success());
}

#[test]
fn debug_flag_writes_the_live_object_registry_dump() {
    let file = write_source("str s = \"hi\"\nlist xs = [1, 2]\nprint s\n");
    let workdir = tempfile::tempdir().expect("tempdir");
    let output = Command::new(wick_bin())
        .arg(file.path())
        .arg("--debug")
        .current_dir(workdir.path())
        .output()
        .expect("run wick");
    assert!(output.status.success());

    let dump_path = workdir.path().join("object.dsv");
    let dump = std::fs::read_to_string(&dump_path).expect("object.dsv should have been written");
    assert_eq!(dump.lines().next(), Some("object;refcount;type;value"));
}
