use assert_cmd::Command;

#[test]
fn cli_help_runs() {
    let mut cmd = Command::cargo_bin("quizgen").expect("binary exists");
    cmd.arg("--help").assert().success();
}

#[test]
fn keywords_command_prints_overlap() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = Command::cargo_bin("quizgen").expect("binary exists");
    let output = cmd
        .env("MODELS_DIR", dir.path())
        .args(["keywords", "--original", "the cat sat", "--summary", "a cat sits"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "cat");
}

#[test]
fn distract_rejects_out_of_range_diversity() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = Command::cargo_bin("quizgen").expect("binary exists");
    let output = cmd
        .env("MODELS_DIR", dir.path())
        .args(["distract", "seven", "--diversity", "1.5"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("outside [0, 1]"));
}
