use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn renders_file_to_stdout() {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("doc.smd");
    fs::write(&input_path, "# Title\n\n> * item\n").unwrap();

    let mut cmd = cargo_bin_cmd!("smd");
    cmd.arg(input_path.as_os_str());

    cmd.assert().success().stdout(
        "<h1>Title</h1>\n<blockquote>\n<ul>\n<li>\nitem\n</li>\n</ul>\n</blockquote>\n",
    );
}

#[test]
fn renders_stdin_with_explicit_subcommand() {
    let mut cmd = cargo_bin_cmd!("smd");
    cmd.arg("render").arg("-").write_stdin("some *text*\n");

    cmd.assert()
        .success()
        .stdout("<p>some <em>text</em>\n</p>\n");
}

#[test]
fn writes_output_file() {
    let dir = tempdir().unwrap();
    let output_path = dir.path().join("out.html");

    let mut cmd = cargo_bin_cmd!("smd");
    cmd.arg("-o")
        .arg(output_path.as_os_str())
        .write_stdin("text\n");

    cmd.assert().success().stdout(predicate::str::is_empty());
    assert_eq!(fs::read_to_string(&output_path).unwrap(), "<p>text\n</p>\n");
}

#[test]
fn missing_file_fails() {
    let mut cmd = cargo_bin_cmd!("smd");
    cmd.arg("does-not-exist.smd");

    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::starts_with("error: failed to read"));
}

#[test]
fn overlong_line_keeps_partial_output() {
    let mut cmd = cargo_bin_cmd!("smd");
    cmd.arg("--max-line-length")
        .arg("16")
        .write_stdin("# Title\n* item\nthis line is far too long\n");

    cmd.assert()
        .failure()
        .code(1)
        .stdout("<h1>Title</h1>\n<ul>\n<li>\n")
        .stderr(predicate::str::contains("error: line 3 too long"));
}

#[test]
fn limit_from_config_file() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("custom.toml");
    fs::write(&config_path, "max_line_len = 4\n").unwrap();

    let mut cmd = cargo_bin_cmd!("smd");
    cmd.arg("--config")
        .arg(config_path.as_os_str())
        .write_stdin("hello\n");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("too long"));
}

#[test]
fn local_config_is_picked_up_and_flag_wins() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("smd.toml"), "max_line_len = 4\n").unwrap();

    let mut cmd = cargo_bin_cmd!("smd");
    cmd.current_dir(dir.path()).write_stdin("hello\n");
    cmd.assert().failure();

    let mut cmd = cargo_bin_cmd!("smd");
    cmd.current_dir(dir.path())
        .arg("--max-line-length")
        .arg("10")
        .write_stdin("hello\n");
    cmd.assert().success().stdout("<p>hello\n</p>\n");
}

#[test]
fn missing_config_file_fails() {
    let mut cmd = cargo_bin_cmd!("smd");
    cmd.arg("--config").arg("missing.toml").write_stdin("x\n");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("failed to load configuration"));
}

#[test]
fn stats_as_text() {
    let mut cmd = cargo_bin_cmd!("smd");
    cmd.arg("stats").write_stdin("# t\n\n> * a\n> * b\n");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Blocks:         3"))
        .stdout(predicate::str::contains("Max depth:      2"));
}

#[test]
fn stats_as_json() {
    let mut cmd = cargo_bin_cmd!("smd");
    cmd.arg("stats").arg("--json").write_stdin("# t\n\n> * a\n> * b\n");

    let output = cmd.assert().success().get_output().stdout.clone();
    let stats: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(stats["lines"], 4);
    assert_eq!(stats["blocks"], 3);
    assert_eq!(stats["containers"], 2);
    assert_eq!(stats["max_depth"], 2);
}
