use std::process::Command;

#[test]
fn cli_compiles_without_warnings() {
    let status = Command::new(env!("CARGO"))
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .args(["check", "--quiet", "--bin", "tactica"])
        .status()
        .expect("failed to invoke cargo check for tactica CLI binary");

    assert!(status.success(), "cargo check --bin tactica should succeed");
}

#[test]
fn cli_runs_the_built_in_skirmish() {
    let output = Command::new(env!("CARGO_BIN_EXE_tactica"))
        .args(["--ticks", "40", "--seed", "7"])
        .output()
        .expect("failed to run tactica");

    assert!(output.status.success(), "tactica exited with {:?}", output.status);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("Crossing:"), "unexpected report: {stdout}");
    assert!(stdout.contains("Player:"));
    assert!(stdout.contains("Enemy:"));
}
